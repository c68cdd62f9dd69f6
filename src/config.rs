//! Attack hyperparameters.
//!
//! Defaults: initial search over 1000 reference samples, `alpha = 0.2`,
//! `beta = 0.001`, multiplicative backoff of 0.8 down to a floor of `1e-6`,
//! and 1000 (targeted) or 500 (untargeted) optimizer iterations.
use crate::error::ConfigError;
use crate::OptFloat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Constants of the boundary distance search.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Bisection stops once the bracket is narrower than this (global form).
    pub global_tolerance: OptFloat,
    /// Bisection tolerance of the local form.
    pub local_tolerance: OptFloat,
    /// Number of points of the coarse scan, counting the dropped zero point.
    pub coarse_points: usize,
    pub targeted_expansion: OptFloat,
    pub untargeted_expansion: OptFloat,
    /// Scale above which a targeted search gives up on a direction.
    pub targeted_max_scale: OptFloat,
    /// Scale above which an untargeted search gives up on a direction.
    pub untargeted_max_scale: OptFloat,
    /// Per-step growth of the local form, e.g. 0.01 for 1% steps.
    pub local_step: OptFloat,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            global_tolerance: 1e-7,
            local_tolerance: 1e-8,
            coarse_points: 100,
            targeted_expansion: 1.05,
            untargeted_expansion: 2.,
            targeted_max_scale: 100.,
            untargeted_max_scale: 1e6,
            local_step: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Initial descent step.
    pub alpha: OptFloat,
    /// Initial probe radius.
    pub beta: OptFloat,
    pub shrink: OptFloat,
    pub step_floor: OptFloat,
    pub targeted_iterations: usize,
    pub untargeted_iterations: usize,
    pub targeted_log_every: usize,
    pub untargeted_log_every: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.001,
            shrink: 0.8,
            step_floor: 1e-6,
            targeted_iterations: 1000,
            untargeted_iterations: 500,
            targeted_log_every: 10,
            untargeted_log_every: 50,
        }
    }
}

/// Hard limits on one attack run. `None` means unlimited.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryBudget {
    pub max_queries: Option<usize>,
    pub time_limit: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Reference samples drawn by the initial direction search.
    pub num_samples: usize,
    pub search: SearchConfig,
    pub optimizer: OptimizerConfig,
    pub budget: QueryBudget,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            num_samples: 1000,
            search: SearchConfig::default(),
            optimizer: OptimizerConfig::default(),
            budget: QueryBudget::default(),
        }
    }
}

impl AttackConfig {
    /// # Errors
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_steps(mut self, alpha: OptFloat, beta: OptFloat) -> Self {
        self.optimizer.alpha = alpha;
        self.optimizer.beta = beta;
        self
    }

    #[must_use]
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, targeted: usize, untargeted: usize) -> Self {
        self.optimizer.targeted_iterations = targeted;
        self.optimizer.untargeted_iterations = untargeted;
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: QueryBudget) -> Self {
        self.budget = budget;
        self
    }

    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: OptFloat| {
            if value > 0. && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )))
            }
        };
        let s = &self.search;
        positive("search.global_tolerance", s.global_tolerance)?;
        positive("search.local_tolerance", s.local_tolerance)?;
        positive("search.targeted_max_scale", s.targeted_max_scale)?;
        positive("search.untargeted_max_scale", s.untargeted_max_scale)?;
        positive("search.local_step", s.local_step)?;
        if s.local_step >= 1. {
            return Err(ConfigError::Invalid(format!(
                "search.local_step must be below 1, got {}",
                s.local_step
            )));
        }
        for (name, factor) in [
            ("search.targeted_expansion", s.targeted_expansion),
            ("search.untargeted_expansion", s.untargeted_expansion),
        ] {
            if factor <= 1. || !factor.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{} must exceed 1, got {}",
                    name, factor
                )));
            }
        }
        if s.coarse_points < 2 {
            return Err(ConfigError::Invalid(
                "search.coarse_points must be at least 2".to_string(),
            ));
        }
        let o = &self.optimizer;
        positive("optimizer.alpha", o.alpha)?;
        positive("optimizer.beta", o.beta)?;
        positive("optimizer.step_floor", o.step_floor)?;
        if o.shrink <= 0. || o.shrink >= 1. {
            return Err(ConfigError::Invalid(format!(
                "optimizer.shrink must lie in (0, 1), got {}",
                o.shrink
            )));
        }
        if self.num_samples == 0 {
            return Err(ConfigError::Invalid(
                "num_samples must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
