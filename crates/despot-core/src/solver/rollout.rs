use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::solver::{
    bounds::{LowerBound, ValuedAction},
    history::History,
    model::PomdpModel,
    particle::{total_weight, Particle},
    streams::{unit_uniform, RandomStreams},
};

/// Map a uniform draw in `[0, 1)` onto an index in `[0, n)`.
pub(crate) fn index_from_unit(sample: f64, n: usize) -> usize {
    ((sample * n as f64) as usize).min(n - 1)
}

/// Roll one particle forward to the streams' horizon under `policy`,
/// stepping with the particle's own pre-sampled draws, and return the
/// discounted return.
fn rollout_particle<M, F>(
    model: &M,
    streams: &RandomStreams,
    particle: &Particle<M::State>,
    depth: usize,
    discount: f64,
    mut policy: F,
) -> f64
where
    M: PomdpModel,
    F: FnMut(&M::State) -> usize,
{
    let mut state = particle.state.clone();
    let mut value = 0.0;
    let mut scale = 1.0;

    for pos in depth..streams.length() {
        if model.is_terminal(&state) {
            break;
        }
        let action = policy(&state);
        let (reward, _obs) = model.step(&mut state, streams.entry(particle.id, pos), action);
        value += scale * reward;
        scale *= discount;
    }

    value
}

#[derive(Debug, Clone)]
/// Lower bound from rolling out a uniformly random action policy.
///
/// Each particle's rollout draws actions from a generator seeded with the
/// model seed and the particle's scenario id, so repeated queries on the same
/// inputs return identical values.
pub struct RandomPolicy {
    discount: f64,
}

impl RandomPolicy {
    /// Create the policy; `discount` should match the search configuration.
    pub fn new(discount: f64) -> Self {
        RandomPolicy { discount }
    }
}

impl<M: PomdpModel> LowerBound<M> for RandomPolicy {
    fn lower_bound(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        _history: &History,
        particles: &[Particle<M::State>],
        depth: usize,
    ) -> ValuedAction {
        let num_actions = model.num_actions();
        let mut total = 0.0;

        for particle in particles {
            let mut rng = ChaCha8Rng::seed_from_u64(streams.model_seed() ^ particle.id as u64);
            total += particle.weight
                * rollout_particle(model, streams, particle, depth, self.discount, |_state| {
                    index_from_unit(unit_uniform(&mut rng), num_actions)
                });
        }

        let weight = total_weight(particles);
        let value = if weight > 0.0 { total / weight } else { 0.0 };

        let mut pick = ChaCha8Rng::seed_from_u64(streams.model_seed() ^ depth as u64);
        let action = index_from_unit(unit_uniform(&mut pick), num_actions);

        ValuedAction { value, action }
    }
}

#[derive(Debug, Clone)]
/// Lower bound from the model's preferred-action hint.
///
/// The default action is the hint for the modal (highest total weight) state
/// of the set; the rollout follows the hint of each particle's current state.
pub struct ModePolicy {
    discount: f64,
}

impl ModePolicy {
    /// Create the policy; `discount` should match the search configuration.
    pub fn new(discount: f64) -> Self {
        ModePolicy { discount }
    }
}

impl<M: PomdpModel> LowerBound<M> for ModePolicy {
    fn lower_bound(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        _history: &History,
        particles: &[Particle<M::State>],
        depth: usize,
    ) -> ValuedAction {
        let mut mass: HashMap<&M::State, f64> = HashMap::with_capacity(particles.len());
        for particle in particles {
            *mass.entry(&particle.state).or_insert(0.0) += particle.weight;
        }

        // Scan particles in order so ties break on first appearance.
        let mut modal = None;
        let mut modal_mass = f64::NEG_INFINITY;
        for particle in particles {
            let m = mass[&particle.state];
            if m > modal_mass {
                modal_mass = m;
                modal = Some(&particle.state);
            }
        }

        let action = match modal {
            Some(state) => model.preferred_action(state),
            None => 0,
        };

        let mut total = 0.0;
        for particle in particles {
            total += particle.weight
                * rollout_particle(model, streams, particle, depth, self.discount, |state| {
                    model.preferred_action(state)
                });
        }

        let weight = total_weight(particles);
        let value = if weight > 0.0 { total / weight } else { 0.0 };

        ValuedAction { value, action }
    }
}
