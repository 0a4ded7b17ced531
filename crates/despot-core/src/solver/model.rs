use std::hash::Hash;

/// Problem-specific simulation hook consumed immutably during search.
///
/// `step` must emit `terminal_obs()` iff the resulting state is terminal;
/// the expansion step treats that contract as a routing rule for terminal
/// belief formation and asserts it.
pub trait PomdpModel {
    type State: Clone + Eq + Hash;

    /// Return the number of actions, shared by every state.
    fn num_actions(&self) -> usize;

    /// Return whether a state is terminal.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Return the distinguished observation emitted by transitions into
    /// terminal states, and by no other transition.
    fn terminal_obs(&self) -> u64;

    /// Advance `state` in place using a uniform `sample` in `[0, 1)` and
    /// return the immediate reward and emitted observation.
    fn step(&self, state: &mut Self::State, sample: f64, action: usize) -> (f64, u64);

    /// Upper-bound hint: the largest immediate reward any transition yields.
    fn max_reward(&self) -> f64;

    /// Lower-bound hint: a reasonable action to take in `state`.
    fn preferred_action(&self, state: &Self::State) -> usize;
}
