use std::collections::{HashMap, HashSet};
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{compiled::PROB_TOLERANCE, CompiledPomdp, PomdpError};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serializable tabular POMDP schema used for YAML IO and validation.
pub struct PomdpSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// The distinguished observation emitted by transitions into terminal
    /// states, and by no other transition.
    pub terminal_obs: u64,
    /// Weighted initial belief over state ids.
    pub start: Vec<StartSpec>,
    /// All state declarations in the model.
    pub states: Vec<StateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One weighted entry of the initial belief.
pub struct StartSpec {
    pub state: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single state declaration in the POMDP schema.
pub struct StateSpec {
    /// Unique state id.
    pub id: String,
    /// Whether this state is terminal (defaults to `false` if omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<bool>,
    /// Available actions from this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionSpec>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A named action and its stochastic outcomes.
pub struct ActionSpec {
    pub id: String,
    pub outcomes: Vec<OutcomeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One probabilistic transition for an action, with its emitted observation.
pub struct OutcomeSpec {
    pub next: String,
    pub prob: f64,
    pub reward: f64,
    pub obs: u64,
}

impl PomdpSpec {
    /// Parse a spec from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PomdpError> {
        let spec: PomdpSpec = serde_yaml::from_str(yaml)?;
        Ok(spec)
    }

    /// Read and parse a spec from a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, PomdpError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Render the spec as YAML text.
    pub fn to_yaml_string(&self) -> Result<String, PomdpError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the spec as YAML to `path`.
    pub fn save_yaml_path(&self, path: impl AsRef<Path>) -> Result<(), PomdpError> {
        fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    /// Validate schema invariants using the crate default tolerance.
    pub fn validate(&self) -> Result<(), PomdpError> {
        self.validate_with_tolerance(PROB_TOLERANCE)
    }

    /// Validate ids, the start belief, transitions, probability constraints,
    /// and the terminal-observation contract.
    pub fn validate_with_tolerance(&self, tolerance: f64) -> Result<(), PomdpError> {
        // State ids must be unique.
        let mut ids = HashSet::with_capacity(self.states.len());
        for state in &self.states {
            if !ids.insert(state.id.clone()) {
                return Err(PomdpError::DuplicateStateId {
                    id: state.id.clone(),
                });
            }
        }

        // The start belief must be non-empty with positive weights on known
        // states.
        if self.start.is_empty() {
            return Err(PomdpError::MissingStartBelief);
        }
        for entry in &self.start {
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                return Err(PomdpError::InvalidStartWeight {
                    state: entry.state.clone(),
                    value: entry.weight,
                });
            }
            if !ids.contains(&entry.state) {
                return Err(PomdpError::UnknownStartState {
                    state: entry.state.clone(),
                });
            }
        }

        // Fast membership map from id to terminal flag for outcome checks.
        let terminal_by_id: HashMap<&str, bool> = self
            .states
            .iter()
            .map(|s| (s.id.as_str(), s.terminal.unwrap_or(false)))
            .collect();

        // Every non-terminal state must declare the same non-zero number of
        // actions; the planner treats the action count as global.
        let mut expected_actions: Option<usize> = None;

        for state in &self.states {
            let terminal = state.terminal.unwrap_or(false);
            let actions = state.actions.as_deref().unwrap_or(&[]);

            if terminal {
                if !actions.is_empty() {
                    return Err(PomdpError::TerminalStateHasActions {
                        state: state.id.clone(),
                    });
                }
                continue;
            }

            match expected_actions {
                None => expected_actions = Some(actions.len()),
                Some(expected) if expected != actions.len() => {
                    return Err(PomdpError::ActionCountMismatch {
                        state: state.id.clone(),
                        expected,
                        found: actions.len(),
                    });
                }
                Some(_) => {}
            }

            let mut action_ids = HashSet::with_capacity(actions.len());
            for action in actions {
                if !action_ids.insert(action.id.clone()) {
                    return Err(PomdpError::DuplicateActionId {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }

                if action.outcomes.is_empty() {
                    return Err(PomdpError::EmptyOutcomes {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }

                let mut sum = 0.0_f64;
                for outcome in &action.outcomes {
                    if outcome.prob.is_nan() || !outcome.prob.is_finite() || outcome.prob < 0.0 {
                        return Err(PomdpError::InvalidProbability {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            obs: outcome.obs,
                            value: outcome.prob,
                        });
                    }

                    if !outcome.reward.is_finite() {
                        return Err(PomdpError::InvalidReward {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            obs: outcome.obs,
                            value: outcome.reward,
                        });
                    }

                    let next_terminal = match terminal_by_id.get(outcome.next.as_str()) {
                        Some(flag) => *flag,
                        None => {
                            return Err(PomdpError::UnknownNextState {
                                state: state.id.clone(),
                                action: action.id.clone(),
                                next: outcome.next.clone(),
                                obs: outcome.obs,
                            });
                        }
                    };

                    // The planner routes terminal belief formation on this
                    // contract, so it is enforced at the schema level.
                    if (outcome.obs == self.terminal_obs) != next_terminal {
                        return Err(PomdpError::TerminalObsMismatch {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            next: outcome.next.clone(),
                            obs: outcome.obs,
                        });
                    }

                    sum += outcome.prob;
                }

                // Outcome probabilities for an action must sum to 1 within
                // tolerance.
                if (sum - 1.0).abs() > tolerance {
                    return Err(PomdpError::ProbabilitySum {
                        state: state.id.clone(),
                        action: action.id.clone(),
                        sum,
                        tolerance,
                    });
                }
            }
        }

        match expected_actions {
            None | Some(0) => Err(PomdpError::NoActionableState),
            Some(_) => Ok(()),
        }
    }

    /// Compile this spec into the runtime representation.
    pub fn compile(&self) -> Result<CompiledPomdp, PomdpError> {
        CompiledPomdp::from_spec(self)
    }
}
