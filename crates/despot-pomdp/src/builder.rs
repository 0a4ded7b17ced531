use crate::{ActionSpec, CompiledPomdp, OutcomeSpec, PomdpError, PomdpSpec, StartSpec, StateSpec};

#[derive(Debug, Clone)]
/// Fluent construction of POMDP specs.
pub struct PomdpBuilder {
    terminal_obs: u64,
    start: Vec<StartSpec>,
    states: Vec<StateSpec>,
}

impl PomdpBuilder {
    /// Create a builder; `terminal_obs` is the observation reserved for
    /// transitions into terminal states.
    pub fn new(terminal_obs: u64) -> Self {
        PomdpBuilder {
            terminal_obs,
            start: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Add a weighted entry to the initial belief.
    pub fn add_start(&mut self, state: impl Into<String>, weight: f64) -> &mut Self {
        self.start.push(StartSpec {
            state: state.into(),
            weight,
        });
        self
    }

    /// Add a new state.
    pub fn add_state(&mut self, id: impl Into<String>, terminal: bool) -> &mut Self {
        self.states.push(StateSpec {
            id: id.into(),
            terminal: Some(terminal),
            actions: Some(Vec::new()),
        });
        self
    }

    /// Add an action to a state.
    pub fn add_action(
        &mut self,
        state_id: impl AsRef<str>,
        action_id: impl Into<String>,
    ) -> Result<&mut Self, PomdpError> {
        let state_id = state_id.as_ref();
        let action_id = action_id.into();

        let state = self
            .states
            .iter_mut()
            .find(|s| s.id == state_id)
            .ok_or_else(|| PomdpError::BuilderUnknownState {
                state: state_id.to_string(),
            })?;

        let actions = state.actions.get_or_insert_with(Vec::new);
        actions.push(ActionSpec {
            id: action_id,
            outcomes: Vec::new(),
        });

        Ok(self)
    }

    /// Add one stochastic outcome to an action.
    pub fn add_outcome(
        &mut self,
        state_id: impl AsRef<str>,
        action_id: impl AsRef<str>,
        next: impl Into<String>,
        prob: f64,
        reward: f64,
        obs: u64,
    ) -> Result<&mut Self, PomdpError> {
        let state_id = state_id.as_ref();
        let action_id = action_id.as_ref();

        let state = self
            .states
            .iter_mut()
            .find(|s| s.id == state_id)
            .ok_or_else(|| PomdpError::BuilderUnknownState {
                state: state_id.to_string(),
            })?;

        let actions = state.actions.get_or_insert_with(Vec::new);
        let action = actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| PomdpError::BuilderUnknownAction {
                state: state_id.to_string(),
                action: action_id.to_string(),
            })?;

        action.outcomes.push(OutcomeSpec {
            next: next.into(),
            prob,
            reward,
            obs,
        });

        Ok(self)
    }

    pub fn build_spec(self) -> Result<PomdpSpec, PomdpError> {
        let spec = PomdpSpec {
            version: Some(1),
            terminal_obs: self.terminal_obs,
            start: self.start,
            states: self.states,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn compile(self) -> Result<CompiledPomdp, PomdpError> {
        let spec = self.build_spec()?;
        spec.compile()
    }
}
