use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::solver::{
    model::PomdpModel,
    particle::{total_weight, Particle},
    streams::{unit_uniform, RandomStreams},
};

/// How many step attempts `update` makes per requested posterior particle
/// before giving up on the observation.
const UPDATE_ATTEMPT_FACTOR: usize = 100;

/// Posterior sampling after a committed `(action, observation)`.
pub trait BeliefUpdate<M: PomdpModel> {
    /// Importance-resample `count` scenario particles from `pool`, assigning
    /// stream ids without replacement so each scenario is represented at most
    /// once.
    fn sample(
        &mut self,
        model: &M,
        pool: &[Particle<M::State>],
        count: usize,
    ) -> Vec<Particle<M::State>>;

    /// Produce the posterior particle set after committing `action` and
    /// observing `obs`. An empty result means the observation could not be
    /// reproduced from the prior.
    fn update(
        &mut self,
        model: &M,
        particles: &[Particle<M::State>],
        count: usize,
        action: usize,
        obs: u64,
    ) -> Vec<Particle<M::State>>;

    /// Restore the updater to its initial state.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
/// Weighted-resampling belief updater with rejection on the observation.
pub struct ParticleFilter {
    rng: ChaCha8Rng,
    seed: u64,
    num_streams: usize,
}

impl ParticleFilter {
    /// Create a filter seeded from the streams' belief-update seed.
    pub fn new(streams: &RandomStreams) -> Self {
        let seed = streams.belief_update_seed();
        ParticleFilter {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            num_streams: streams.num_streams(),
        }
    }

    /// Draw `count` distinct stream ids from a freshly shuffled pool.
    fn draw_ids(&mut self, count: usize) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.num_streams).collect();
        ids.shuffle(&mut self.rng);
        ids.truncate(count);
        ids
    }

    /// Pick a particle index proportional to weight.
    fn weighted_index<S>(&mut self, particles: &[Particle<S>], total: f64) -> usize {
        let mut target = unit_uniform(&mut self.rng) * total;
        let mut index = 0;
        for (i, particle) in particles.iter().enumerate() {
            index = i;
            target -= particle.weight;
            if target <= 0.0 {
                break;
            }
        }
        index
    }
}

impl<M: PomdpModel> BeliefUpdate<M> for ParticleFilter {
    fn sample(
        &mut self,
        _model: &M,
        pool: &[Particle<M::State>],
        count: usize,
    ) -> Vec<Particle<M::State>> {
        if pool.is_empty() || count == 0 {
            return Vec::new();
        }

        let count = count.min(self.num_streams);
        let total = total_weight(pool);
        let ids = self.draw_ids(count);
        let weight = 1.0 / count as f64;

        ids.into_iter()
            .map(|id| {
                let source = &pool[self.weighted_index(pool, total)];
                Particle::new(source.state.clone(), id, weight)
            })
            .collect()
    }

    fn update(
        &mut self,
        model: &M,
        particles: &[Particle<M::State>],
        count: usize,
        action: usize,
        obs: u64,
    ) -> Vec<Particle<M::State>> {
        if particles.is_empty() || count == 0 {
            return Vec::new();
        }

        let count = count.min(self.num_streams);
        let total = total_weight(particles);
        let max_attempts = count.saturating_mul(UPDATE_ATTEMPT_FACTOR);
        let mut kept: Vec<M::State> = Vec::with_capacity(count);

        let mut attempts = 0;
        while kept.len() < count && attempts < max_attempts {
            attempts += 1;
            let source = &particles[self.weighted_index(particles, total)];
            let mut state = source.state.clone();
            let (_reward, emitted) = model.step(&mut state, unit_uniform(&mut self.rng), action);
            if emitted == obs {
                kept.push(state);
            }
        }

        if kept.is_empty() {
            return Vec::new();
        }

        let weight = 1.0 / kept.len() as f64;
        let ids = self.draw_ids(kept.len());
        kept.into_iter()
            .zip(ids)
            .map(|(state, id)| Particle::new(state, id, weight))
            .collect()
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}
