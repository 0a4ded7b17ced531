use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for POMDP loading, validation, compilation, and builder
/// operations.
///
/// Outcome-level problems name the transition by its `(state, action,
/// observation)` coordinates, since an observation is part of every declared
/// transition in this schema.
pub enum PomdpError {
    #[error("could not read POMDP file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed POMDP YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("the initial belief is empty")]
    MissingStartBelief,

    #[error("initial belief puts weight on undeclared state '{state}'")]
    UnknownStartState { state: String },

    #[error("initial belief weight on state '{state}' must be positive and finite, got {value}")]
    InvalidStartWeight { state: String, value: f64 },

    #[error("state id '{id}' is declared twice")]
    DuplicateStateId { id: String },

    #[error("action id '{action}' appears twice on state '{state}'")]
    DuplicateActionId { state: String, action: String },

    #[error("terminal state '{state}' must not declare actions")]
    TerminalStateHasActions { state: String },

    #[error("no non-terminal state declares any action")]
    NoActionableState,

    #[error("state '{state}' declares {found} actions but the model uses {expected}")]
    ActionCountMismatch {
        state: String,
        expected: usize,
        found: usize,
    },

    #[error("action '{action}' on state '{state}' has no outcomes to sample")]
    EmptyOutcomes { state: String, action: String },

    #[error("outcome of '{state}' under '{action}' (obs {obs}) targets undeclared state '{next}'")]
    UnknownNextState {
        state: String,
        action: String,
        next: String,
        obs: u64,
    },

    #[error("outcome of '{state}' under '{action}' (obs {obs}) carries invalid probability {value}")]
    InvalidProbability {
        state: String,
        action: String,
        obs: u64,
        value: f64,
    },

    #[error("outcome of '{state}' under '{action}' (obs {obs}) carries non-finite reward {value}")]
    InvalidReward {
        state: String,
        action: String,
        obs: u64,
        value: f64,
    },

    #[error("outcome probabilities of '{state}' under '{action}' sum to {sum}, not 1 within {tolerance}")]
    ProbabilitySum {
        state: String,
        action: String,
        sum: f64,
        tolerance: f64,
    },

    #[error(
        "outcome of '{state}' under '{action}' reaches '{next}' with observation {obs}; \
         the terminal observation must be emitted exactly when the next state is terminal"
    )]
    TerminalObsMismatch {
        state: String,
        action: String,
        next: String,
        obs: u64,
    },

    #[error("builder knows no state '{state}'")]
    BuilderUnknownState { state: String },

    #[error("builder knows no action '{action}' on state '{state}'")]
    BuilderUnknownAction { state: String, action: String },
}
