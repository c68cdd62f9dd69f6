use crate::OptFloat;
use std::fmt;

/// Failures of a single boundary distance search.
///
/// An infeasible direction is not an error; it is reported through
/// [`crate::Boundary::Infeasible`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The run's query or time budget ran out before the search finished.
    BudgetExhausted { queries: usize },
    /// The coarse scan over `[0, upper]` found no label flip, although the
    /// expansion phase saw one at `upper`. Only a non-deterministic oracle
    /// can cause this.
    DegenerateBracket { upper: OptFloat },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::BudgetExhausted { queries } => {
                write!(f, "query budget exhausted after {} queries", queries)
            }
            SearchError::DegenerateBracket { upper } => write!(
                f,
                "coarse scan found no label flip in [0, {}]; is the oracle deterministic?",
                upper
            ),
        }
    }
}

impl std::error::Error for SearchError {}

#[derive(Debug)]
pub enum AttackError {
    /// No sampled reference input satisfied the attack goal.
    InitializationFailed { sampled: usize, queries: usize },
    /// A reference input does not have the dimension of the attacked input.
    DimensionMismatch { expected: usize, found: usize },
    DegenerateBracket { upper: OptFloat },
    /// The budget ran out before any candidate direction was measured.
    BudgetExhausted { queries: usize },
    Config(ConfigError),
}

impl fmt::Display for AttackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttackError::InitializationFailed { sampled, queries } => write!(
                f,
                "initialization failed: none of {} sampled references reach the goal ({} queries)",
                sampled, queries
            ),
            AttackError::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {}, found {}",
                expected, found
            ),
            AttackError::DegenerateBracket { upper } => {
                write!(f, "degenerate boundary bracket below {}", upper)
            }
            AttackError::BudgetExhausted { queries } => write!(
                f,
                "query budget exhausted after {} queries before any boundary was found",
                queries
            ),
            AttackError::Config(err) => write!(f, "invalid configuration: {}", err),
        }
    }
}

impl std::error::Error for AttackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttackError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for AttackError {
    fn from(err: ConfigError) -> Self {
        AttackError::Config(err)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "{}", err),
            ConfigError::Parse(err) => write!(f, "{}", err),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
