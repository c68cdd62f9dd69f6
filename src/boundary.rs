//! Boundary distance search along a fixed direction.
//!
//! Given a unit direction `theta`, find the smallest scale `lambda` at which
//! the oracle's label at `x0 + lambda * theta` reaches the attack goal. Both
//! the targeted and untargeted goals, and both the from-scratch (global) and
//! warm-started (local) forms, run through [`BoundarySearcher::search`]; they
//! differ only in the stopping predicate and the expansion policy.
use crate::config::SearchConfig;
use crate::direction::Direction;
use crate::error::SearchError;
use crate::oracle::{CountingOracle, Oracle};
use crate::util::open_linspace;
use crate::OptFloat;
use log::{debug, trace};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// What counts as a successful label.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum AttackGoal<L> {
    /// Any label other than `original`.
    Untargeted { original: L },
    /// Exactly `target`.
    Targeted { target: L },
}

impl<L: PartialEq> AttackGoal<L> {
    pub fn is_reached(&self, label: &L) -> bool {
        match self {
            AttackGoal::Untargeted { original } => label != original,
            AttackGoal::Targeted { target } => label == target,
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self, AttackGoal::Targeted { .. })
    }
}

/// Outcome of one boundary search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Boundary {
    /// Scale at which the goal is first reached, within tolerance from above.
    Found(OptFloat),
    /// No goal label below the scale cap along this direction.
    Infeasible,
}

impl Boundary {
    pub const fn distance(self) -> Option<OptFloat> {
        match self {
            Boundary::Found(lambda) => Some(lambda),
            Boundary::Infeasible => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundarySearch {
    pub boundary: Boundary,
    /// Oracle queries spent by this search.
    pub queries: usize,
}

/// How the search grows its first bracket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Expansion {
    /// Multiply by `factor` until the goal holds, then coarse-scan `[0, scale]`.
    Exponential { factor: OptFloat },
    /// Grow or shrink by `step` (as a fraction) around the initial scale.
    Stepwise { step: OptFloat },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    Global,
    Local,
}

/// Boundary searches around one attacked input.
pub struct BoundarySearcher<'s, 'a, O: Oracle> {
    oracle: &'s CountingOracle<'a, O>,
    x0: ArrayView1<'s, OptFloat>,
    goal: &'s AttackGoal<O::Label>,
    config: &'s SearchConfig,
}

impl<'s, 'a, O: Oracle> BoundarySearcher<'s, 'a, O> {
    pub fn new(
        oracle: &'s CountingOracle<'a, O>,
        x0: ArrayView1<'s, OptFloat>,
        goal: &'s AttackGoal<O::Label>,
        config: &'s SearchConfig,
    ) -> Self {
        Self {
            oracle,
            x0,
            goal,
            config,
        }
    }

    pub fn oracle(&self) -> &'s CountingOracle<'a, O> {
        self.oracle
    }

    pub fn goal(&self) -> &'s AttackGoal<O::Label> {
        self.goal
    }

    pub fn dim(&self) -> usize {
        self.x0.len()
    }

    /// Search from scratch, starting the expansion at `initial`.
    ///
    /// # Errors
    /// Budget exhaustion or a degenerate coarse-scan bracket
    pub fn global(
        &self,
        theta: &Direction,
        initial: OptFloat,
    ) -> Result<BoundarySearch, SearchError> {
        self.search(theta, initial, SearchMode::Global)
    }

    /// Refine around a scale known to be close to the boundary.
    ///
    /// # Errors
    /// Budget exhaustion
    pub fn local(
        &self,
        theta: &Direction,
        initial: OptFloat,
    ) -> Result<BoundarySearch, SearchError> {
        self.search(theta, initial, SearchMode::Local)
    }

    /// # Errors
    /// Budget exhaustion, or a degenerate bracket in the global form
    pub fn search(
        &self,
        theta: &Direction,
        initial: OptFloat,
        mode: SearchMode,
    ) -> Result<BoundarySearch, SearchError> {
        debug_assert_eq!(theta.len(), self.x0.len());
        let start_queries = self.oracle.queries();
        let initial = if initial > 0. && initial.is_finite() {
            initial
        } else {
            debug!("invalid initial scale {}, starting from 1", initial);
            1.
        };
        let (expansion, tolerance) = self.policy(mode);
        let bracket = match expansion {
            Expansion::Exponential { factor } => {
                self.expand_exponential(theta, initial, factor)?
            }
            Expansion::Stepwise { step } => self.expand_stepwise(theta, initial, step)?,
        };
        let boundary = match bracket {
            Some((lo, hi)) => Boundary::Found(self.bisect(theta, lo, hi, tolerance)?),
            None => Boundary::Infeasible,
        };
        let queries = self.oracle.queries() - start_queries;
        trace!(
            "{:?} boundary search: {:?} in {} queries",
            mode,
            boundary,
            queries
        );
        Ok(BoundarySearch { boundary, queries })
    }

    pub fn policy(&self, mode: SearchMode) -> (Expansion, OptFloat) {
        match mode {
            SearchMode::Global => {
                let factor = if self.goal.is_targeted() {
                    self.config.targeted_expansion
                } else {
                    self.config.untargeted_expansion
                };
                (Expansion::Exponential { factor }, self.config.global_tolerance)
            }
            SearchMode::Local => (
                Expansion::Stepwise {
                    step: self.config.local_step,
                },
                self.config.local_tolerance,
            ),
        }
    }

    fn max_scale(&self) -> OptFloat {
        if self.goal.is_targeted() {
            self.config.targeted_max_scale
        } else {
            self.config.untargeted_max_scale
        }
    }

    fn reached(&self, theta: &Direction, lambda: OptFloat) -> Result<bool, SearchError> {
        let label = self.oracle.query(theta.point(self.x0, lambda).view())?;
        Ok(self.goal.is_reached(&label))
    }

    /// Returns a bracket `(lo, hi)` with the goal failing at `lo` and holding at `hi`.
    fn expand_exponential(
        &self,
        theta: &Direction,
        initial: OptFloat,
        factor: OptFloat,
    ) -> Result<Option<(OptFloat, OptFloat)>, SearchError> {
        let cap = self.max_scale();
        let mut lambda = initial;
        while !self.reached(theta, lambda)? {
            lambda *= factor;
            if lambda > cap {
                debug!("no boundary below scale {}", cap);
                return Ok(None);
            }
        }

        // The coarse scan looks for the closest crossing below the expanded scale.
        let grid = open_linspace(lambda, self.config.coarse_points);
        let mut first_hit = None;
        for (idx, &point) in grid.iter().enumerate() {
            if self.reached(theta, point)? {
                first_hit = Some(idx);
                break;
            }
        }
        let idx = first_hit.ok_or(SearchError::DegenerateBracket { upper: lambda })?;
        let lo = if idx == 0 { 0. } else { grid[idx - 1] };
        Ok(Some((lo, grid[idx])))
    }

    fn expand_stepwise(
        &self,
        theta: &Direction,
        initial: OptFloat,
        step: OptFloat,
    ) -> Result<Option<(OptFloat, OptFloat)>, SearchError> {
        if self.reached(theta, initial)? {
            let mut hi = initial;
            let mut lo = initial * (1. - step);
            loop {
                // x0 itself never reaches the goal
                if lo <= self.config.local_tolerance {
                    return Ok(Some((0., hi)));
                }
                if !self.reached(theta, lo)? {
                    return Ok(Some((lo, hi)));
                }
                hi = lo;
                lo *= 1. - step;
            }
        }

        let cap = self.max_scale();
        let mut lo = initial;
        let mut hi = initial * (1. + step);
        loop {
            if hi > cap {
                debug!("local search passed scale cap {}", cap);
                return Ok(None);
            }
            if self.reached(theta, hi)? {
                return Ok(Some((lo, hi)));
            }
            lo = hi;
            hi *= 1. + step;
        }
    }

    fn bisect(
        &self,
        theta: &Direction,
        mut lo: OptFloat,
        mut hi: OptFloat,
        tolerance: OptFloat,
    ) -> Result<OptFloat, SearchError> {
        while hi - lo > tolerance {
            let mid = (lo + hi) / 2.;
            if mid <= lo || mid >= hi {
                break;
            }
            if self.reached(theta, mid)? {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }
}
