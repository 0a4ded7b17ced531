use std::path::PathBuf;

use despot_core::{
    ModePolicy, ParticleFilter, PomdpModel, RandomStreams, SearchConfig, Solver,
    StochasticUpperBound,
};
use despot_pomdp::{CompiledPomdp, StateKey};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn unit_uniform(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0)
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/despot-pomdp/examples/sample.pomdp.yaml"));

    let model = CompiledPomdp::from_yaml_path(&path).expect("failed to compile POMDP YAML");
    let start = model.start_belief();

    let config = SearchConfig {
        n_particles: 64,
        search_depth: 20,
        discount: 0.95,
        pruning_constant: 0.0,
        xi: 0.4,
        max_trials: 0,
    };
    let streams = RandomStreams::new(config.n_particles, config.search_depth, 12345);
    let mut world_rng = ChaCha8Rng::seed_from_u64(streams.world_seed());
    let filter = ParticleFilter::new(&streams);

    let mut solver = Solver::new(
        model,
        start.clone(),
        ModePolicy::new(config.discount),
        StochasticUpperBound::new(config.discount),
        filter,
        streams,
        config,
    )
    .expect("failed to build solver");

    // Draw the hidden true state the world will actually follow.
    let total: f64 = start.iter().map(|(_, weight)| weight).sum();
    let mut draw = unit_uniform(&mut world_rng) * total;
    let mut true_state: StateKey = start[0].0;
    for (state, weight) in &start {
        true_state = *state;
        draw -= weight;
        if draw <= 0.0 {
            break;
        }
    }

    let mut discounted_return = 0.0;
    let mut scale = 1.0;

    for step in 0..20 {
        if solver.finished() {
            break;
        }

        let metrics = solver.search(0.2).expect("search failed");
        let sample = unit_uniform(&mut world_rng);
        let (reward, obs) = solver.model().step(&mut true_state, sample, metrics.action);
        discounted_return += scale * reward;
        scale *= 0.95;

        println!(
            "step={step} action={} reward={reward:.2} obs={obs} trials={} bounds=[{:.3}, {:.3}]",
            metrics.action, metrics.trials, metrics.root_lower, metrics.root_upper
        );

        if let Err(err) = solver.update_belief(metrics.action, obs) {
            println!("belief update failed: {err}");
            break;
        }
    }

    println!("discounted_return={discounted_return:.3}");
}
