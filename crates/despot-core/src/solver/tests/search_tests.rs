use crate::solver::tests::support::{
    tiger_config, tiger_solver, ChainModel, ChainState, LoopModel,
};
use crate::{
    ModePolicy, ParticleFilter, RandomPolicy, RandomStreams, SearchConfig, Solver,
    StochasticUpperBound, TINY,
};

#[test]
fn single_state_loop_accumulates_the_discounted_sum() {
    let config = SearchConfig {
        n_particles: 1,
        search_depth: 10,
        discount: 0.9,
        pruning_constant: 0.0,
        xi: 0.4,
        max_trials: 0,
    };
    let streams = RandomStreams::new(1, 10, 42);
    let filter = ParticleFilter::new(&streams);
    let mut solver = Solver::new(
        LoopModel,
        vec![((), 1.0)],
        RandomPolicy::new(0.9),
        StochasticUpperBound::new(0.9),
        filter,
        streams,
        config,
    )
    .expect("solver should build");

    let metrics = solver.search(1.0).expect("search should succeed");

    assert_eq!(metrics.action, 0);
    let expected = (1.0 - 0.9_f64.powi(10)) / (1.0 - 0.9);
    assert!((metrics.root_lower - expected).abs() < 1e-9);
    assert!(metrics.root_upper - metrics.root_lower <= TINY);
}

#[test]
fn deterministic_chain_prefers_go() {
    let config = SearchConfig {
        n_particles: 2,
        search_depth: 5,
        discount: 1.0,
        pruning_constant: 0.0,
        xi: 0.4,
        max_trials: 0,
    };
    let streams = RandomStreams::new(2, 5, 21);
    let filter = ParticleFilter::new(&streams);
    let mut solver = Solver::new(
        ChainModel,
        vec![(ChainState::Start, 1.0)],
        ModePolicy::new(1.0),
        StochasticUpperBound::new(1.0),
        filter,
        streams,
        config,
    )
    .expect("solver should build");

    // The conservative default is `stay`; the tree has to discover `go`.
    assert_eq!(solver.root().expect("root exists").default_action(), 1);

    let metrics = solver.search(1.0).expect("search should succeed");
    assert_eq!(metrics.action, 0);
    assert!((metrics.root_lower - 10.0).abs() < TINY);
}

#[test]
fn search_is_deterministic_for_a_fixed_seed() {
    let mut first = tiger_solver(7, tiger_config(8));
    let mut second = tiger_solver(7, tiger_config(8));

    let metrics_a = first.search(f64::INFINITY).expect("search should succeed");
    let metrics_b = second.search(f64::INFINITY).expect("search should succeed");

    assert_eq!(metrics_a, metrics_b);

    let json_a = first
        .snapshot()
        .expect("tree exists")
        .to_json_pretty()
        .expect("snapshot serializes");
    let json_b = second
        .snapshot()
        .expect("tree exists")
        .to_json_pretty()
        .expect("snapshot serializes");
    assert_eq!(json_a, json_b);
}

#[test]
fn reset_then_search_matches_a_fresh_solver() {
    let mut reused = tiger_solver(19, tiger_config(6));
    let _ = reused.search(f64::INFINITY).expect("first search succeeds");
    reused.reset().expect("reset should succeed");
    let after_reset = reused.search(f64::INFINITY).expect("second search succeeds");

    let mut fresh = tiger_solver(19, tiger_config(6));
    let fresh_metrics = fresh.search(f64::INFINITY).expect("search should succeed");

    assert_eq!(after_reset, fresh_metrics);

    let json_reused = reused
        .snapshot()
        .expect("tree exists")
        .to_json_pretty()
        .expect("snapshot serializes");
    let json_fresh = fresh
        .snapshot()
        .expect("tree exists")
        .to_json_pretty()
        .expect("snapshot serializes");
    assert_eq!(json_reused, json_fresh);
}

#[test]
fn bound_gap_shrinks_with_more_trials() {
    let mut short = tiger_solver(31, tiger_config(1));
    let mut long = tiger_solver(31, tiger_config(4));

    let short_metrics = short.search(f64::INFINITY).expect("search should succeed");
    let long_metrics = long.search(f64::INFINITY).expect("search should succeed");

    let short_gap = short_metrics.root_upper - short_metrics.root_lower;
    let long_gap = long_metrics.root_upper - long_metrics.root_lower;
    assert!(long_gap <= short_gap + 1e-9);
}

#[test]
fn root_lower_bound_is_monotone_across_trials() {
    let mut solver = tiger_solver(5, tiger_config(10));

    let mut lowers = Vec::new();
    solver
        .search_with_hook(f64::INFINITY, |metrics| lowers.push(metrics.root_lower))
        .expect("search should succeed");

    assert!(!lowers.is_empty());
    for pair in lowers.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
}

#[test]
fn trial_cap_limits_the_search() {
    let mut solver = tiger_solver(3, tiger_config(3));
    let metrics = solver.search(f64::INFINITY).expect("search should succeed");
    assert!(metrics.trials <= 3);
}

#[test]
fn committed_steps_are_recorded_in_history() {
    let mut solver = tiger_solver(13, tiger_config(2));
    let _ = solver.search(f64::INFINITY).expect("search should succeed");

    solver.update_belief(0, 0).expect("listening posterior exists");
    assert_eq!(solver.history().len(), 1);
    assert_eq!(solver.history().last(), Some((0, 0)));
    assert!(!solver.finished());

    // Planning continues from the committed posterior.
    let metrics = solver.search(f64::INFINITY).expect("search should succeed");
    assert!(metrics.root_lower <= metrics.root_upper + TINY);
}
