use std::collections::HashMap;
use std::path::Path;

use despot_core::PomdpModel;

use crate::{PomdpError, PomdpSpec};

/// Floating point tolerance used when validating probability sums.
pub(crate) const PROB_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Dense index for states in a compiled POMDP. Doubles as the particle state
/// type for the planner.
pub struct StateKey(usize);

impl StateKey {
    /// Return the underlying state index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for StateKey {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone)]
/// Runtime form of a POMDP with resolved state references, precomputed CDFs,
/// and the reward hints the planner's bound heuristics consume.
pub struct CompiledPomdp {
    terminal_obs: u64,
    start: Vec<(StateKey, f64)>,
    states: Vec<StateRec>,
    state_ids: Vec<String>,
    state_id_to_key: HashMap<String, StateKey>,
    num_actions: usize,
    max_reward: f64,
    preferred: Vec<usize>,
}

#[derive(Debug, Clone)]
struct StateRec {
    terminal: bool,
    actions: Vec<ActionRec>,
}

#[derive(Debug, Clone)]
struct ActionRec {
    outcomes: Vec<OutcomeRec>,
    cdf: Vec<f64>,
}

#[derive(Debug, Clone)]
struct OutcomeRec {
    next: StateKey,
    reward: f64,
    obs: u64,
}

impl CompiledPomdp {
    /// Compile and validate a spec into a fast runtime representation.
    pub(crate) fn from_spec(spec: &PomdpSpec) -> Result<Self, PomdpError> {
        spec.validate_with_tolerance(PROB_TOLERANCE)?;

        let mut state_id_to_key = HashMap::with_capacity(spec.states.len());
        let mut state_ids = Vec::with_capacity(spec.states.len());

        for (idx, state) in spec.states.iter().enumerate() {
            let key = StateKey::from(idx);
            state_id_to_key.insert(state.id.clone(), key);
            state_ids.push(state.id.clone());
        }

        let mut start = Vec::with_capacity(spec.start.len());
        for entry in &spec.start {
            let key = state_id_to_key.get(&entry.state).copied().ok_or_else(|| {
                PomdpError::UnknownStartState {
                    state: entry.state.clone(),
                }
            })?;
            start.push((key, entry.weight));
        }

        let mut states = Vec::with_capacity(spec.states.len());
        let mut num_actions = 0;
        let mut max_reward = f64::NEG_INFINITY;
        let mut preferred = Vec::with_capacity(spec.states.len());

        for state in &spec.states {
            let terminal = state.terminal.unwrap_or(false);
            let mut actions = Vec::new();

            // Myopic hint: the action with the best expected immediate
            // reward.
            let mut best_action = 0;
            let mut best_value = f64::NEG_INFINITY;

            for (idx, action) in state.actions.as_deref().unwrap_or(&[]).iter().enumerate() {
                let mut outcomes = Vec::with_capacity(action.outcomes.len());
                let mut cdf = Vec::with_capacity(action.outcomes.len());
                let mut cumulative = 0.0_f64;
                let mut expected_reward = 0.0_f64;

                for outcome in &action.outcomes {
                    cumulative += outcome.prob;
                    cdf.push(cumulative);
                    expected_reward += outcome.prob * outcome.reward;
                    let next = state_id_to_key.get(&outcome.next).copied().ok_or_else(|| {
                        PomdpError::UnknownNextState {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            next: outcome.next.clone(),
                            obs: outcome.obs,
                        }
                    })?;

                    if outcome.reward > max_reward {
                        max_reward = outcome.reward;
                    }

                    outcomes.push(OutcomeRec {
                        next,
                        reward: outcome.reward,
                        obs: outcome.obs,
                    });
                }

                if expected_reward > best_value {
                    best_value = expected_reward;
                    best_action = idx;
                }

                actions.push(ActionRec { outcomes, cdf });
            }

            if !terminal {
                num_actions = actions.len();
            }
            preferred.push(best_action);

            states.push(StateRec { terminal, actions });
        }

        if max_reward == f64::NEG_INFINITY {
            max_reward = 0.0;
        }

        Ok(Self {
            terminal_obs: spec.terminal_obs,
            start,
            states,
            state_ids,
            state_id_to_key,
            num_actions,
            max_reward,
            preferred,
        })
    }

    /// Load, validate, and compile a POMDP from a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, PomdpError> {
        PomdpSpec::from_yaml_path(path)?.compile()
    }

    /// Return the weighted initial belief over compiled state keys, ready to
    /// hand to the planner.
    pub fn start_belief(&self) -> Vec<(StateKey, f64)> {
        self.start.clone()
    }

    /// Return the number of compiled states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Convert a state key back to its original string id.
    pub fn state_id(&self, key: StateKey) -> Option<&str> {
        self.state_ids.get(key.index()).map(String::as_str)
    }

    /// Convert a string id into a compiled state key.
    pub fn state_key(&self, id: &str) -> Option<StateKey> {
        self.state_id_to_key.get(id).copied()
    }
}

impl PomdpModel for CompiledPomdp {
    type State = StateKey;

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn is_terminal(&self, state: &StateKey) -> bool {
        self.states
            .get(state.index())
            .map(|rec| rec.terminal)
            .unwrap_or(true)
    }

    fn terminal_obs(&self) -> u64 {
        self.terminal_obs
    }

    fn step(&self, state: &mut StateKey, sample: f64, action: usize) -> (f64, u64) {
        let Some(rec) = self.states.get(state.index()) else {
            return (0.0, self.terminal_obs);
        };
        if rec.terminal {
            return (0.0, self.terminal_obs);
        }
        let Some(act) = rec.actions.get(action) else {
            return (0.0, self.terminal_obs);
        };

        let mut chosen = act.cdf.partition_point(|p| *p < sample);
        if chosen >= act.outcomes.len() {
            chosen = act.outcomes.len() - 1;
        }

        let outcome = &act.outcomes[chosen];
        *state = outcome.next;
        (outcome.reward, outcome.obs)
    }

    fn max_reward(&self) -> f64 {
        self.max_reward
    }

    fn preferred_action(&self, state: &StateKey) -> usize {
        self.preferred.get(state.index()).copied().unwrap_or(0)
    }
}
