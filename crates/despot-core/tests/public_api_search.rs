use despot_core::{
    ModePolicy, ParticleFilter, PomdpModel, RandomStreams, SearchConfig, Solver,
    StochasticUpperBound, TINY,
};

const DOOR_OBS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Room {
    Inside,
    Outside,
}

/// Walk out (+10, terminal) or wait (0). The preferred-action hint waits, so
/// the tree search has to justify leaving.
struct ExitModel;

impl PomdpModel for ExitModel {
    type State = Room;

    fn num_actions(&self) -> usize {
        2
    }

    fn is_terminal(&self, state: &Room) -> bool {
        matches!(state, Room::Outside)
    }

    fn terminal_obs(&self) -> u64 {
        DOOR_OBS
    }

    fn step(&self, state: &mut Room, _sample: f64, action: usize) -> (f64, u64) {
        match (state.clone(), action) {
            (Room::Inside, 0) => {
                *state = Room::Outside;
                (10.0, DOOR_OBS)
            }
            (Room::Inside, _) => (0.0, 0),
            (Room::Outside, _) => (0.0, DOOR_OBS),
        }
    }

    fn max_reward(&self) -> f64 {
        10.0
    }

    fn preferred_action(&self, _state: &Room) -> usize {
        1
    }
}

fn exit_solver(
    seed: u64,
) -> Solver<ExitModel, ModePolicy, StochasticUpperBound<ExitModel>, ParticleFilter> {
    let config = SearchConfig {
        n_particles: 4,
        search_depth: 6,
        discount: 0.95,
        pruning_constant: 0.0,
        xi: 0.4,
        max_trials: 0,
    };
    let streams = RandomStreams::new(config.n_particles, config.search_depth, seed);
    let filter = ParticleFilter::new(&streams);
    Solver::new(
        ExitModel,
        vec![(Room::Inside, 1.0)],
        ModePolicy::new(config.discount),
        StochasticUpperBound::new(config.discount),
        filter,
        streams,
        config,
    )
    .expect("solver should build")
}

#[test]
fn public_search_finds_the_rewarding_exit() {
    let mut solver = exit_solver(101);

    assert_eq!(solver.root().expect("root exists").default_action(), 1);

    let metrics = solver.search(1.0).expect("search should succeed");
    assert_eq!(metrics.action, 0);
    assert!(metrics.trials >= 1);
    assert!(metrics.tree_nodes >= 1);
    assert!((metrics.root_lower - 10.0).abs() < TINY);
}

#[test]
fn public_commit_finishes_the_episode() {
    let mut solver = exit_solver(102);
    let metrics = solver.search(1.0).expect("search should succeed");
    assert_eq!(metrics.action, 0);

    solver
        .update_belief(metrics.action, DOOR_OBS)
        .expect("leaving always emits the door observation");
    assert!(solver.finished());
    assert_eq!(solver.history().entries(), &[(0, DOOR_OBS)]);

    // A finished root is never expanded.
    let after = solver.search(1.0).expect("search should succeed");
    assert_eq!(after.trials, 0);
    assert!(solver.root().expect("root exists").children().is_empty());
}

#[test]
fn public_search_is_reproducible() {
    let mut first = exit_solver(103);
    let mut second = exit_solver(103);

    let a = first.search(1.0).expect("search should succeed");
    let b = second.search(1.0).expect("search should succeed");
    assert_eq!(a, b);
}
