#![allow(clippy::must_use_candidate)]
//! Hard-label black-box adversarial search.
//!
//! Given only a label oracle, find a small perturbation of an input that
//! changes the oracle's decision (untargeted) or drives it to a chosen label
//! (targeted). The search works on rays `x0 + lambda * theta`: a direction is
//! chosen from reference samples, the boundary distance along it is located by
//! bisection, and the direction is refined with a zeroth-order descent.
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;

pub mod attack;
pub mod boundary;
pub mod classifier;
pub mod config;
pub mod direction;
pub mod error;
pub mod initial;
pub mod optimizer;
pub mod oracle;
#[cfg(test)]
mod test_util;
pub mod util;

pub type OptFloat = f64;

pub use attack::{attack_targeted, attack_untargeted, AdversarialExample, AttackOutcome};
pub use boundary::{AttackGoal, Boundary, BoundarySearch};
pub use config::{AttackConfig, OptimizerConfig, QueryBudget, SearchConfig};
pub use direction::{Candidate, Direction};
pub use error::{AttackError, ConfigError, SearchError};
pub use initial::ReferenceSet;
pub use optimizer::{OptimizationOutcome, Termination};
pub use oracle::{CountingOracle, FnOracle, Oracle};
