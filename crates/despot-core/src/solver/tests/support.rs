//! Toy models and solver builders shared by the solver test modules.

use crate::{
    ParticleFilter, PomdpModel, RandomPolicy, RandomStreams, SearchConfig, Solver,
    StochasticUpperBound,
};

/// Single non-terminal state paying +1 per step under its only action.
pub(crate) struct LoopModel;

impl PomdpModel for LoopModel {
    type State = ();

    fn num_actions(&self) -> usize {
        1
    }

    fn is_terminal(&self, _state: &()) -> bool {
        false
    }

    fn terminal_obs(&self) -> u64 {
        1
    }

    fn step(&self, _state: &mut (), _sample: f64, _action: usize) -> (f64, u64) {
        (1.0, 0)
    }

    fn max_reward(&self) -> f64 {
        1.0
    }

    fn preferred_action(&self, _state: &()) -> usize {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ChainState {
    Start,
    Done,
}

/// Deterministic two-state chain: action 0 (`go`) moves to the terminal
/// state for +10, action 1 (`stay`) loops for 0. The preferred-action hint
/// is the conservative `stay`, so search has to discover `go` in the tree.
#[derive(Debug)]
pub(crate) struct ChainModel;

pub(crate) const CHAIN_TERMINAL_OBS: u64 = 9;

impl PomdpModel for ChainModel {
    type State = ChainState;

    fn num_actions(&self) -> usize {
        2
    }

    fn is_terminal(&self, state: &ChainState) -> bool {
        matches!(state, ChainState::Done)
    }

    fn terminal_obs(&self) -> u64 {
        CHAIN_TERMINAL_OBS
    }

    fn step(&self, state: &mut ChainState, _sample: f64, action: usize) -> (f64, u64) {
        match (state.clone(), action) {
            (ChainState::Start, 0) => {
                *state = ChainState::Done;
                (10.0, CHAIN_TERMINAL_OBS)
            }
            (ChainState::Start, _) => (0.0, 0),
            (ChainState::Done, _) => (0.0, CHAIN_TERMINAL_OBS),
        }
    }

    fn max_reward(&self) -> f64 {
        10.0
    }

    fn preferred_action(&self, _state: &ChainState) -> usize {
        1
    }
}

/// The classic tiger problem: the goal hides behind door 0 or door 1.
/// Action 0 listens (reward -1, observation correct with probability 0.85),
/// actions 1 and 2 open a door (terminal, +10 right / -100 wrong).
pub(crate) struct TigerModel;

pub(crate) const TIGER_TERMINAL_OBS: u64 = 2;

impl PomdpModel for TigerModel {
    type State = u8;

    fn num_actions(&self) -> usize {
        3
    }

    fn is_terminal(&self, state: &u8) -> bool {
        *state >= 2
    }

    fn terminal_obs(&self) -> u64 {
        TIGER_TERMINAL_OBS
    }

    fn step(&self, state: &mut u8, sample: f64, action: usize) -> (f64, u64) {
        if *state >= 2 {
            return (0.0, TIGER_TERMINAL_OBS);
        }
        match action {
            0 => {
                let heard = if sample < 0.85 {
                    *state
                } else {
                    1 - *state
                };
                (-1.0, heard as u64)
            }
            _ => {
                let opened = (action - 1) as u8;
                let reward = if opened == *state { 10.0 } else { -100.0 };
                *state = 2;
                (reward, TIGER_TERMINAL_OBS)
            }
        }
    }

    fn max_reward(&self) -> f64 {
        10.0
    }

    fn preferred_action(&self, state: &u8) -> usize {
        if *state >= 2 {
            0
        } else {
            *state as usize + 1
        }
    }
}

pub(crate) fn tiger_config(max_trials: usize) -> SearchConfig {
    SearchConfig {
        n_particles: 16,
        search_depth: 5,
        discount: 0.95,
        pruning_constant: 0.0,
        xi: 0.4,
        max_trials,
    }
}

pub(crate) type TigerSolver =
    Solver<TigerModel, RandomPolicy, StochasticUpperBound<TigerModel>, ParticleFilter>;

pub(crate) fn tiger_solver(seed: u64, config: SearchConfig) -> TigerSolver {
    let streams = RandomStreams::new(config.n_particles, config.search_depth, seed);
    let filter = ParticleFilter::new(&streams);
    Solver::new(
        TigerModel,
        vec![(0u8, 0.5), (1u8, 0.5)],
        RandomPolicy::new(config.discount),
        StochasticUpperBound::new(config.discount),
        filter,
        streams,
        config,
    )
    .expect("solver should build")
}
