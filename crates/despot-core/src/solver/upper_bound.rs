use std::collections::HashMap;

use crate::solver::{
    bounds::UpperBound,
    history::History,
    model::PomdpModel,
    particle::{total_weight, Particle},
    streams::RandomStreams,
};

/// Discounted value of `steps` unit rewards: `1 + g + ... + g^(steps-1)`.
fn discounted_horizon(discount: f64, steps: usize) -> f64 {
    if (discount - 1.0).abs() < f64::EPSILON {
        steps as f64
    } else {
        (1.0 - discount.powi(steps as i32)) / (1.0 - discount)
    }
}

#[derive(Debug, Clone)]
/// Horizon-capped bound from the model's max-reward hint, independent of the
/// particles' states. Coarse but cheap; useful as a baseline and for models
/// whose state space is too large to memoize.
pub struct TrivialUpperBound {
    discount: f64,
}

impl TrivialUpperBound {
    /// Create the bound; `discount` should match the search configuration.
    pub fn new(discount: f64) -> Self {
        TrivialUpperBound { discount }
    }
}

impl<M: PomdpModel> UpperBound<M> for TrivialUpperBound {
    fn upper_bound(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        _history: &History,
        _particles: &[Particle<M::State>],
        depth: usize,
    ) -> f64 {
        let remaining = streams.length().saturating_sub(depth);
        let max_reward = model.max_reward();
        // With only non-positive rewards an episode may end early, so the
        // safe cap is zero rather than a negative per-step reward scaled by
        // the full horizon.
        if max_reward <= 0.0 {
            0.0
        } else {
            max_reward * discounted_horizon(self.discount, remaining)
        }
    }
}

/// General-case bound: for each particle, the optimal value of its
/// determinized scenario, maximizing over actions at every step while
/// consuming the particle's own stream of draws.
///
/// Values are memoized per `(state, scenario id, depth)`; the weighted
/// average over the set is returned. Intended for compact state spaces where
/// states recur across depths.
pub struct StochasticUpperBound<M: PomdpModel> {
    discount: f64,
    memo: HashMap<(M::State, usize, usize), f64>,
}

impl<M: PomdpModel> std::fmt::Debug for StochasticUpperBound<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StochasticUpperBound")
            .field("discount", &self.discount)
            .field("memo_len", &self.memo.len())
            .finish()
    }
}

impl<M: PomdpModel> StochasticUpperBound<M> {
    /// Create the bound; `discount` should match the search configuration.
    pub fn new(discount: f64) -> Self {
        StochasticUpperBound {
            discount,
            memo: HashMap::new(),
        }
    }

    fn scenario_value(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        state: &M::State,
        id: usize,
        depth: usize,
    ) -> f64 {
        if depth >= streams.length() || model.is_terminal(state) {
            return 0.0;
        }
        if let Some(value) = self.memo.get(&(state.clone(), id, depth)) {
            return *value;
        }

        let sample = streams.entry(id, depth);
        let mut best = f64::NEG_INFINITY;
        for action in 0..model.num_actions() {
            let mut next = state.clone();
            let (reward, _obs) = model.step(&mut next, sample, action);
            let value = reward + self.discount * self.scenario_value(model, streams, &next, id, depth + 1);
            if value > best {
                best = value;
            }
        }

        self.memo.insert((state.clone(), id, depth), best);
        best
    }
}

impl<M: PomdpModel> UpperBound<M> for StochasticUpperBound<M> {
    fn upper_bound(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        _history: &History,
        particles: &[Particle<M::State>],
        depth: usize,
    ) -> f64 {
        let mut total = 0.0;
        for particle in particles {
            total += particle.weight
                * self.scenario_value(model, streams, &particle.state, particle.id, depth);
        }

        let weight = total_weight(particles);
        if weight > 0.0 {
            total / weight
        } else {
            0.0
        }
    }
}

/// Variant for models with deterministic transitions: the sample is
/// irrelevant, so each `(state, depth)` has a single trajectory per action
/// and one shared memo entry.
pub struct NonStochasticUpperBound<M: PomdpModel> {
    discount: f64,
    memo: HashMap<(M::State, usize), f64>,
}

impl<M: PomdpModel> NonStochasticUpperBound<M> {
    /// Create the bound; `discount` should match the search configuration.
    pub fn new(discount: f64) -> Self {
        NonStochasticUpperBound {
            discount,
            memo: HashMap::new(),
        }
    }

    fn state_value(&mut self, model: &M, horizon: usize, state: &M::State, depth: usize) -> f64 {
        if depth >= horizon || model.is_terminal(state) {
            return 0.0;
        }
        if let Some(value) = self.memo.get(&(state.clone(), depth)) {
            return *value;
        }

        let mut best = f64::NEG_INFINITY;
        for action in 0..model.num_actions() {
            let mut next = state.clone();
            let (reward, _obs) = model.step(&mut next, 0.0, action);
            let value = reward + self.discount * self.state_value(model, horizon, &next, depth + 1);
            if value > best {
                best = value;
            }
        }

        self.memo.insert((state.clone(), depth), best);
        best
    }
}

impl<M: PomdpModel> UpperBound<M> for NonStochasticUpperBound<M> {
    fn upper_bound(
        &mut self,
        model: &M,
        streams: &RandomStreams,
        _history: &History,
        particles: &[Particle<M::State>],
        depth: usize,
    ) -> f64 {
        let horizon = streams.length();
        let mut total = 0.0;
        for particle in particles {
            total += particle.weight * self.state_value(model, horizon, &particle.state, depth);
        }

        let weight = total_weight(particles);
        if weight > 0.0 {
            total / weight
        } else {
            0.0
        }
    }
}
