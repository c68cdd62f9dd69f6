//! Targeted and untargeted attack entry points.
use crate::boundary::{AttackGoal, BoundarySearcher};
use crate::config::AttackConfig;
use crate::direction::Direction;
use crate::error::AttackError;
use crate::initial::{initial_direction, ReferenceSet};
use crate::optimizer::{AdaptiveOptimizer, Termination};
use crate::oracle::{CountingOracle, Oracle};
use crate::OptFloat;
use log::info;
use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// A successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct AdversarialExample<L> {
    /// `x0 + distortion * direction`
    pub input: Array1<OptFloat>,
    pub direction: Direction,
    pub distortion: OptFloat,
    /// Oracle label at `input`, `None` if the budget ran out before the check.
    pub label: Option<L>,
    /// Queries up to the end of the initial direction search, including the
    /// label check of `x0`.
    pub initial_queries: usize,
    /// Optimizer queries plus the final label check.
    pub optimization_queries: usize,
    pub termination: Termination,
    /// Committed distortions, initial one first.
    pub history: Vec<OptFloat>,
}

impl<L> AdversarialExample<L> {
    pub const fn total_queries(&self) -> usize {
        self.initial_queries + self.optimization_queries
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttackOutcome<L> {
    /// The oracle already disagrees with the claimed label; the input is
    /// returned unchanged.
    AlreadyMisclassified { input: Array1<OptFloat>, label: L },
    Adversarial(AdversarialExample<L>),
}

impl<L> AttackOutcome<L> {
    /// The adversarial input, or the original one when there was nothing to attack.
    pub fn input(&self) -> ArrayView1<OptFloat> {
        match self {
            AttackOutcome::AlreadyMisclassified { input, .. } => input.view(),
            AttackOutcome::Adversarial(example) => example.input.view(),
        }
    }

    pub fn into_input(self) -> Array1<OptFloat> {
        match self {
            AttackOutcome::AlreadyMisclassified { input, .. } => input,
            AttackOutcome::Adversarial(example) => example.input,
        }
    }

    pub const fn adversarial(&self) -> Option<&AdversarialExample<L>> {
        match self {
            AttackOutcome::Adversarial(example) => Some(example),
            AttackOutcome::AlreadyMisclassified { .. } => None,
        }
    }
}

/// Finds a small perturbation of `x0` that the oracle labels `target`.
///
/// # Errors
/// Invalid configuration, no reference sample labelled `target`, a budget
/// spent before any boundary was found, or a reference of the wrong dimension
pub fn attack_targeted<O, D, R>(
    oracle: &O,
    references: &D,
    x0: ArrayView1<OptFloat>,
    y0: &O::Label,
    target: O::Label,
    config: &AttackConfig,
    rng: &mut R,
) -> Result<AttackOutcome<O::Label>, AttackError>
where
    O: Oracle,
    D: ReferenceSet + ?Sized,
    R: Rng + ?Sized,
{
    run(
        oracle,
        references,
        x0,
        y0,
        AttackGoal::Targeted { target },
        config,
        rng,
    )
}

/// Finds a small perturbation of `x0` that the oracle labels anything but `y0`.
///
/// # Errors
/// Invalid configuration, no reference sample labelled differently from
/// `y0`, a budget spent before any boundary was found, or a reference of the
/// wrong dimension
pub fn attack_untargeted<O, D, R>(
    oracle: &O,
    references: &D,
    x0: ArrayView1<OptFloat>,
    y0: &O::Label,
    config: &AttackConfig,
    rng: &mut R,
) -> Result<AttackOutcome<O::Label>, AttackError>
where
    O: Oracle,
    D: ReferenceSet + ?Sized,
    R: Rng + ?Sized,
{
    run(
        oracle,
        references,
        x0,
        y0,
        AttackGoal::Untargeted {
            original: y0.clone(),
        },
        config,
        rng,
    )
}

fn run<O, D, R>(
    oracle: &O,
    references: &D,
    x0: ArrayView1<OptFloat>,
    y0: &O::Label,
    goal: AttackGoal<O::Label>,
    config: &AttackConfig,
    rng: &mut R,
) -> Result<AttackOutcome<O::Label>, AttackError>
where
    O: Oracle,
    D: ReferenceSet + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let counting = CountingOracle::new(oracle).with_budget(&config.budget);
    let label = counting
        .query(x0)
        .map_err(|_| AttackError::BudgetExhausted {
            queries: counting.queries(),
        })?;
    if label != *y0 {
        info!("Fail to classify the image. No need to attack.");
        return Ok(AttackOutcome::AlreadyMisclassified {
            input: x0.to_owned(),
            label,
        });
    }

    // STEP I: find initial direction (theta, g_theta)
    let initial = initial_direction(
        &counting,
        x0,
        &goal,
        references,
        config.num_samples,
        &config.search,
        rng,
    )?;

    // STEP II: search for optimal
    let initial_queries = counting.queries();
    let searcher = BoundarySearcher::new(&counting, x0.reborrow(), &goal, &config.search);
    let outcome =
        AdaptiveOptimizer::new(searcher, &config.optimizer).run(initial.candidate, rng)?;

    let input = outcome.best.adversarial_point(x0);
    let label = counting.query(input.view()).ok();
    let optimization_queries = counting.queries() - initial_queries;
    info!(
        "Adversarial example found: distortion {:.4} label {:?} queries {} ({:?})",
        outcome.best.distance,
        label,
        counting.queries(),
        outcome.termination
    );
    Ok(AttackOutcome::Adversarial(AdversarialExample {
        input,
        direction: outcome.best.direction,
        distortion: outcome.best.distance,
        label,
        initial_queries,
        optimization_queries,
        termination: outcome.termination,
        history: outcome.history,
    }))
}
