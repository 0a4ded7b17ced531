use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draw a uniform sample in `[0, 1)` from a seeded generator.
pub(crate) fn unit_uniform(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0)
}

#[derive(Debug, Clone)]
/// Pre-sampled scenario streams: one fixed sequence of uniform draws per
/// particle id, so every hypothetical action sequence is simulated against
/// the same stochastic realization.
///
/// Also derives the fixed seeds for the world, the belief updater, and the
/// model from the construction seed. Immutable for the lifetime of a search.
pub struct RandomStreams {
    streams: Vec<Vec<f64>>,
    seed: u64,
}

impl RandomStreams {
    /// Fill a `num_streams x length` table, seeding stream `s` with `seed ^ s`.
    pub fn new(num_streams: usize, length: usize, seed: u64) -> Self {
        let mut streams = Vec::with_capacity(num_streams);
        for stream_id in 0..num_streams {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ stream_id as u64);
            let mut stream = Vec::with_capacity(length);
            for _ in 0..length {
                stream.push(unit_uniform(&mut rng));
            }
            streams.push(stream);
        }
        RandomStreams { streams, seed }
    }

    /// Return how many scenario streams were reserved.
    pub fn num_streams(&self) -> usize {
        self.streams.len()
    }

    /// Return the length of each stream (the simulation horizon).
    pub fn length(&self) -> usize {
        self.streams.first().map(Vec::len).unwrap_or(0)
    }

    /// Return the pre-sampled draw for `(stream, pos)`.
    pub fn entry(&self, stream: usize, pos: usize) -> f64 {
        self.streams[stream][pos]
    }

    /// Seed for the world that executes committed actions.
    pub fn world_seed(&self) -> u64 {
        self.seed ^ self.streams.len() as u64
    }

    /// Seed for the belief updater.
    pub fn belief_update_seed(&self) -> u64 {
        self.seed ^ (self.streams.len() as u64 + 1)
    }

    /// Seed for model-side heuristics such as rollout policies.
    pub fn model_seed(&self) -> u64 {
        self.seed ^ (self.streams.len() as u64 + 2)
    }
}
