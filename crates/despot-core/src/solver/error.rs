use std::fmt;

use crate::solver::config::SearchConfigError;

/// Error type for solver construction and belief maintenance.
#[derive(Debug)]
pub enum SolverError {
    /// The initial belief was empty, or sampling from it produced no
    /// scenario.
    EmptyBelief,
    /// The search configuration failed validation.
    Config(SearchConfigError),
    /// The committed observation could not be reproduced from any prior
    /// particle; the previous root is left in place.
    ParticleDepletion { action: usize, obs: u64 },
    /// An operation that needs a root was called before `init`.
    NotInitialized,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::EmptyBelief => {
                write!(f, "initial belief yielded no scenario particles")
            }
            SolverError::Config(err) => write!(f, "invalid search configuration: {err}"),
            SolverError::ParticleDepletion { action, obs } => write!(
                f,
                "belief update for action {action} depleted all particles on observation {obs}"
            ),
            SolverError::NotInitialized => {
                write!(f, "solver has no root belief; call init first")
            }
        }
    }
}

impl std::error::Error for SolverError {}

impl From<SearchConfigError> for SolverError {
    fn from(err: SearchConfigError) -> Self {
        SolverError::Config(err)
    }
}
