//! Initial direction search over reference samples.
use crate::boundary::{AttackGoal, Boundary, BoundarySearcher};
use crate::config::SearchConfig;
use crate::direction::{Candidate, Direction};
use crate::error::{AttackError, SearchError};
use crate::oracle::{CountingOracle, Oracle};
use crate::OptFloat;
use itertools::Itertools;
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A finite, indexable collection of labelled inputs.
pub trait ReferenceSet {
    type Label;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    /// If `index` is out of range
    fn get(&self, index: usize) -> (ArrayView1<OptFloat>, &Self::Label);
}

impl<L> ReferenceSet for [(Array1<OptFloat>, L)] {
    type Label = L;

    fn len(&self) -> usize {
        <[_]>::len(self)
    }

    fn get(&self, index: usize) -> (ArrayView1<OptFloat>, &L) {
        let (input, label) = &self[index];
        (input.view(), label)
    }
}

impl<L> ReferenceSet for Vec<(Array1<OptFloat>, L)> {
    type Label = L;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> (ArrayView1<OptFloat>, &L) {
        ReferenceSet::get(self.as_slice(), index)
    }
}

/// Row-major samples, one input per row.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LabelledSamples<L> {
    inputs: Array2<OptFloat>,
    labels: Vec<L>,
}

impl<L> LabelledSamples<L> {
    /// # Panics
    /// If the number of rows and labels differ
    pub fn new(inputs: Array2<OptFloat>, labels: Vec<L>) -> Self {
        assert_eq!(inputs.nrows(), labels.len());
        Self { inputs, labels }
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }
}

impl<L> ReferenceSet for LabelledSamples<L> {
    type Label = L;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> (ArrayView1<OptFloat>, &L) {
        (self.inputs.index_axis(Axis(0), index), &self.labels[index])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InitialSearch {
    pub candidate: Candidate,
    /// Queries spent, including the label check of every sampled reference.
    pub queries: usize,
    /// Sampled references whose label reached the goal.
    pub reaching: usize,
}

/// Picks the reference-derived direction with the smallest boundary distance.
///
/// A uniform subset of `num_samples` references is visited in index order.
/// Each reference whose oracle label reaches the goal yields the direction
/// `reference - x0`, measured by a global boundary search that starts from
/// the reference's own distance to `x0`.
///
/// # Errors
/// `InitializationFailed` when no sampled reference reaches the goal,
/// `BudgetExhausted` when the budget runs out before any boundary is found,
/// and `DimensionMismatch` for references of the wrong size
#[allow(clippy::too_many_arguments)]
pub fn initial_direction<O, D, R>(
    oracle: &CountingOracle<O>,
    x0: ArrayView1<OptFloat>,
    goal: &AttackGoal<O::Label>,
    references: &D,
    num_samples: usize,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<InitialSearch, AttackError>
where
    O: Oracle,
    D: ReferenceSet + ?Sized,
    R: Rng + ?Sized,
{
    let start_queries = oracle.queries();
    let start_time = Instant::now();
    let amount = num_samples.min(references.len());
    info!("Searching for the initial direction on {} samples", amount);
    if amount == 0 {
        return Err(AttackError::InitializationFailed {
            sampled: 0,
            queries: 0,
        });
    }

    let searcher = BoundarySearcher::new(oracle, x0.reborrow(), goal, config);
    let mut best: Option<Candidate> = None;
    let mut reaching = 0;
    let mut exhausted = false;
    for idx in rand::seq::index::sample(rng, references.len(), amount)
        .into_iter()
        .sorted()
    {
        let (reference, _) = references.get(idx);
        if reference.len() != x0.len() {
            return Err(AttackError::DimensionMismatch {
                expected: x0.len(),
                found: reference.len(),
            });
        }
        let label = match oracle.query(reference) {
            Ok(label) => label,
            Err(err) => {
                info!("Initial search stopped early: {}", err);
                exhausted = true;
                break;
            }
        };
        if !goal.is_reached(&label) {
            continue;
        }
        reaching += 1;
        let (theta, norm) = match Direction::between(x0, reference) {
            Some(pair) => pair,
            None => {
                debug!("reference {} coincides with the input", idx);
                continue;
            }
        };
        let search = match searcher.global(&theta, norm) {
            Ok(search) => search,
            Err(SearchError::DegenerateBracket { upper }) => {
                warn!(
                    "Skipping reference {}: degenerate bracket below {}",
                    idx, upper
                );
                continue;
            }
            Err(err @ SearchError::BudgetExhausted { .. }) => {
                info!("Initial search stopped early: {}", err);
                exhausted = true;
                break;
            }
        };
        if let Boundary::Found(lambda) = search.boundary {
            if best.as_ref().map_or(true, |b| lambda < b.distance) {
                info!("--------> Found distortion {:.4}", lambda);
                best = Some(Candidate::new(theta, lambda));
            }
        }
    }

    let queries = oracle.queries() - start_queries;
    match best {
        Some(candidate) => {
            info!(
                "==========> Found best distortion {:.4} in {:.4} seconds using {} queries",
                candidate.distance,
                start_time.elapsed().as_secs_f64(),
                queries
            );
            Ok(InitialSearch {
                candidate,
                queries,
                reaching,
            })
        }
        None if exhausted => Err(AttackError::BudgetExhausted {
            queries: oracle.queries(),
        }),
        None => Err(AttackError::InitializationFailed {
            sampled: amount,
            queries,
        }),
    }
}
