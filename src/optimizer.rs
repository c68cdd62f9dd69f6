//! Adaptive zeroth-order refinement of a boundary direction.
//!
//! Each iteration probes a random neighbour `normalize(theta + beta * u)` of
//! the current direction, turns the change in boundary distance into a
//! one-sample gradient estimate along `u`, and takes a descent step of size
//! `alpha`. An infeasible probe shrinks `beta`, an infeasible step shrinks
//! `alpha`; once either reaches the floor the run stops.
use crate::boundary::{Boundary, BoundarySearcher};
use crate::config::OptimizerConfig;
use crate::direction::{Candidate, Direction};
use crate::error::{AttackError, SearchError};
use crate::oracle::Oracle;
use crate::OptFloat;
use log::{debug, info};
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Why the optimizer returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Termination {
    IterationsCompleted,
    /// `beta` reached the floor without a feasible probe.
    ProbeStepUnderflow,
    /// `alpha` reached the floor without a feasible descent step.
    DescentStepUnderflow,
    BudgetExhausted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationOutcome {
    pub best: Candidate,
    pub queries: usize,
    /// Iterations that ended with a committed step.
    pub iterations: usize,
    pub termination: Termination,
    pub alpha: OptFloat,
    pub beta: OptFloat,
    /// Distance of every committed best, starting with the initial one.
    pub history: Vec<OptFloat>,
}

struct Probe {
    u: Direction,
    direction: Direction,
    distance: OptFloat,
}

pub struct AdaptiveOptimizer<'s, 'a, O: Oracle> {
    searcher: BoundarySearcher<'s, 'a, O>,
    config: &'s OptimizerConfig,
    iterations: usize,
    log_every: usize,
}

impl<'s, 'a, O: Oracle> AdaptiveOptimizer<'s, 'a, O> {
    pub fn new(searcher: BoundarySearcher<'s, 'a, O>, config: &'s OptimizerConfig) -> Self {
        let (iterations, log_every) = if searcher.goal().is_targeted() {
            (config.targeted_iterations, config.targeted_log_every)
        } else {
            (config.untargeted_iterations, config.untargeted_log_every)
        };
        Self {
            searcher,
            config,
            iterations,
            log_every,
        }
    }

    /// Refines `start` until the iteration budget, a step-size floor, or the
    /// query budget is reached, returning the best candidate seen.
    ///
    /// # Errors
    /// `AttackError::DegenerateBracket` if a descent measurement sees an
    /// inconsistent oracle
    pub fn run<R: Rng + ?Sized>(
        &self,
        start: Candidate,
        rng: &mut R,
    ) -> Result<OptimizationOutcome, AttackError> {
        let oracle = self.searcher.oracle();
        let start_queries = oracle.queries();
        let start_time = Instant::now();
        let mut alpha = self.config.alpha;
        let mut beta = self.config.beta;
        let mut current = start.clone();
        let mut best = start;
        let mut history = vec![best.distance];
        let mut iterations = 0;
        let mut termination = Termination::IterationsCompleted;

        for i in 0..self.iterations {
            let probe = match self.probe(&current, &mut beta, rng) {
                Ok(Some(probe)) => probe,
                Ok(None) => {
                    termination = Termination::ProbeStepUnderflow;
                    break;
                }
                Err(err) => {
                    termination = stop_reason(err)?;
                    break;
                }
            };

            if self.log_every > 0 && (i + 1) % self.log_every == 0 {
                info!(
                    "Iteration {:3}: g(theta + beta*u) = {:.4} g(theta) = {:.4} distortion {:.4} num_queries {} alpha {:.5} beta {:.5}",
                    i + 1,
                    probe.distance,
                    current.distance,
                    best.distance,
                    oracle.queries() - start_queries,
                    alpha,
                    beta
                );
            }

            let spread = probe.direction.distance(&current.direction);
            if spread == 0. {
                debug!("probe collapsed onto the current direction");
                continue;
            }
            let gradient: Array1<OptFloat> =
                probe.u.as_ref() * ((probe.distance - current.distance) / spread);

            let next = match self.descend(&current, &gradient, &mut alpha) {
                Ok(Some(next)) => next,
                Ok(None) => {
                    termination = Termination::DescentStepUnderflow;
                    break;
                }
                Err(err) => {
                    termination = stop_reason(err)?;
                    break;
                }
            };

            iterations += 1;
            current = next;
            if current.distance <= best.distance {
                best = current.clone();
                history.push(best.distance);
            }
        }

        let queries = oracle.queries() - start_queries;
        info!(
            "Optimization finished ({:?}): distortion {:.4} after {} iterations, {} queries, alpha {:.5} beta {:.5}, {:.4} seconds",
            termination,
            best.distance,
            iterations,
            queries,
            alpha,
            beta,
            start_time.elapsed().as_secs_f64()
        );
        Ok(OptimizationOutcome {
            best,
            queries,
            iterations,
            termination,
            alpha,
            beta,
            history,
        })
    }

    /// Finds a feasible random neighbour, shrinking `beta` after each failure.
    fn probe<R: Rng + ?Sized>(
        &self,
        current: &Candidate,
        beta: &mut OptFloat,
        rng: &mut R,
    ) -> Result<Option<Probe>, SearchError> {
        while *beta > self.config.step_floor {
            let u = Direction::random(self.searcher.dim(), rng);
            let direction = current.direction.perturbed(&u, *beta);
            let search = self.searcher.local(&direction, current.distance)?;
            if let Boundary::Found(distance) = search.boundary {
                return Ok(Some(Probe {
                    u,
                    direction,
                    distance,
                }));
            }
            *beta *= self.config.shrink;
        }
        Ok(None)
    }

    /// Takes the largest feasible descent step, shrinking `alpha` after each failure.
    fn descend(
        &self,
        current: &Candidate,
        gradient: &Array1<OptFloat>,
        alpha: &mut OptFloat,
    ) -> Result<Option<Candidate>, SearchError> {
        while *alpha > self.config.step_floor {
            let direction = current.direction.stepped(gradient, *alpha);
            let search = self.searcher.global(&direction, current.distance)?;
            if let Boundary::Found(distance) = search.boundary {
                return Ok(Some(Candidate::new(direction, distance)));
            }
            *alpha *= self.config.shrink;
        }
        Ok(None)
    }
}

fn stop_reason(err: SearchError) -> Result<Termination, AttackError> {
    match err {
        SearchError::BudgetExhausted { queries } => {
            info!("Query budget exhausted after {} queries", queries);
            Ok(Termination::BudgetExhausted)
        }
        SearchError::DegenerateBracket { upper } => Err(AttackError::DegenerateBracket { upper }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::AttackGoal;
    use crate::config::{QueryBudget, SearchConfig};
    use crate::oracle::{CountingOracle, FnOracle};
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_le, assert_lt};
    use ndarray::{array, ArrayView1};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn sign_oracle() -> FnOracle<impl Fn(ArrayView1<OptFloat>) -> bool> {
        FnOracle::new(|x: ArrayView1<OptFloat>| x[0] >= 0.)
    }

    fn diagonal_start() -> Candidate {
        let (theta, _) = Direction::from_vector(array![-1., 1.]).unwrap();
        Candidate::new(theta, 2f64.sqrt())
    }

    fn straight_start() -> Candidate {
        let (theta, _) = Direction::from_vector(array![-1., 0.]).unwrap();
        Candidate::new(theta, 1.)
    }

    #[test]
    fn test_converges_to_closest_boundary() {
        let oracle = sign_oracle();
        let counting = CountingOracle::new(&oracle);
        let x0 = array![1., 0.];
        let goal = AttackGoal::Untargeted { original: true };
        let search_config = SearchConfig::default();
        let config = OptimizerConfig::default();
        let searcher = BoundarySearcher::new(&counting, x0.view(), &goal, &search_config);
        let mut rng = Pcg64::seed_from_u64(11);

        let outcome = AdaptiveOptimizer::new(searcher, &config)
            .run(diagonal_start(), &mut rng)
            .unwrap();

        assert_eq!(outcome.termination, Termination::IterationsCompleted);
        assert_lt!(outcome.best.distance, 1.05);
        assert_ge!(outcome.best.distance, 1.);
        assert_abs_diff_eq!(outcome.best.direction.norm(), 1., epsilon = 1e-6);
        assert_eq!(outcome.queries, counting.queries());
        for pair in outcome.history.windows(2) {
            assert_le!(pair[1], pair[0]);
        }
        assert_eq!(outcome.history[0], 2f64.sqrt());
    }

    #[test]
    fn test_budget_returns_best_so_far() {
        let oracle = sign_oracle();
        let budget = QueryBudget {
            max_queries: Some(500),
            time_limit: None,
        };
        let counting = CountingOracle::new(&oracle).with_budget(&budget);
        let x0 = array![1., 0.];
        let goal = AttackGoal::Targeted { target: false };
        let search_config = SearchConfig::default();
        let config = OptimizerConfig::default();
        let searcher = BoundarySearcher::new(&counting, x0.view(), &goal, &search_config);
        let mut rng = Pcg64::seed_from_u64(12);

        let outcome = AdaptiveOptimizer::new(searcher, &config)
            .run(diagonal_start(), &mut rng)
            .unwrap();

        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.queries, 500);
        assert_le!(outcome.best.distance, 2f64.sqrt());
        assert_lt!(outcome.iterations, config.targeted_iterations);
    }

    #[test]
    fn test_probe_underflow_stops_run() {
        let oracle = sign_oracle();
        let counting = CountingOracle::new(&oracle);
        let x0 = array![1., 0.];
        let goal = AttackGoal::Targeted { target: false };
        // every 1% expansion from the current distance overshoots the cap
        let search_config = SearchConfig {
            targeted_max_scale: 1.005,
            ..SearchConfig::default()
        };
        let config = OptimizerConfig::default();
        let searcher = BoundarySearcher::new(&counting, x0.view(), &goal, &search_config);
        let mut rng = Pcg64::seed_from_u64(13);

        let outcome = AdaptiveOptimizer::new(searcher, &config)
            .run(straight_start(), &mut rng)
            .unwrap();

        assert_eq!(outcome.termination, Termination::ProbeStepUnderflow);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best, straight_start());
        assert_le!(outcome.beta, config.step_floor);
        assert_eq!(outcome.alpha, config.alpha);
    }

    #[test]
    fn test_descent_underflow_stops_run() {
        let oracle = sign_oracle();
        let counting = CountingOracle::new(&oracle);
        let x0 = array![1., 0.];
        let goal = AttackGoal::Targeted { target: false };
        // probes fit under the cap, the first 5% expansion of a descent step does not
        let search_config = SearchConfig {
            targeted_max_scale: 1.02,
            ..SearchConfig::default()
        };
        let config = OptimizerConfig::default();
        let searcher = BoundarySearcher::new(&counting, x0.view(), &goal, &search_config);
        let mut rng = Pcg64::seed_from_u64(14);

        let outcome = AdaptiveOptimizer::new(searcher, &config)
            .run(straight_start(), &mut rng)
            .unwrap();

        assert_eq!(outcome.termination, Termination::DescentStepUnderflow);
        assert_eq!(outcome.iterations, 0);
        assert_le!(outcome.alpha, config.step_floor);
        assert_eq!(outcome.history, vec![1.]);
    }
}
