use std::time::Instant;

use crate::solver::{
    belief::BeliefUpdate,
    bounds::{LowerBound, UpperBound, ValuedAction},
    config::{SearchConfig, INF, TINY},
    error::SolverError,
    history::History,
    model::PomdpModel,
    node::VNode,
    particle::Particle,
    qnode::{ObservationBranch, QNode},
    streams::RandomStreams,
};

/// Per-trial metrics emitted through the search hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialMetrics {
    pub trial: usize,
    pub nodes_added: usize,
    pub tree_nodes: usize,
    pub root_lower: f64,
    pub root_upper: f64,
}

/// Aggregate metrics for one completed search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchMetrics {
    pub action: usize,
    pub trials: usize,
    pub tree_nodes: usize,
    pub root_lower: f64,
    pub root_upper: f64,
}

/// Discount-normalized bound gap minus the root-referenced baseline. A node
/// is worth refining only while this stays positive.
fn excess_uncertainty(
    lower: f64,
    upper: f64,
    root_lower: f64,
    root_upper: f64,
    depth: usize,
    discount: f64,
    xi: f64,
) -> f64 {
    (upper - lower) * discount.powi(-(depth as i32)) - xi * (root_upper - root_lower)
}

/// Anytime belief-tree planner.
///
/// Owns the tree through the root [`VNode`]; each trial descends to a fringe
/// node, expands it one step against the pre-sampled scenario streams, and
/// backs lower/upper bounds up the visited path until the time budget or the
/// root excess-uncertainty gate stops the loop.
#[derive(Debug)]
pub struct Solver<M, L, U, B>
where
    M: PomdpModel,
    L: LowerBound<M>,
    U: UpperBound<M>,
    B: BeliefUpdate<M>,
{
    model: M,
    initial_belief: Vec<(M::State, f64)>,
    lower: L,
    upper: U,
    belief: B,
    streams: RandomStreams,
    config: SearchConfig,
    history: History,
    root: Option<VNode<M::State>>,
}

impl<M, L, U, B> Solver<M, L, U, B>
where
    M: PomdpModel,
    L: LowerBound<M>,
    U: UpperBound<M>,
    B: BeliefUpdate<M>,
{
    /// Validate the configuration, install the initial belief, and seed the
    /// root from `n_particles` sampled scenarios.
    pub fn new(
        model: M,
        initial_belief: Vec<(M::State, f64)>,
        lower: L,
        upper: U,
        belief: B,
        streams: RandomStreams,
        config: SearchConfig,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        if initial_belief.is_empty() {
            return Err(SolverError::EmptyBelief);
        }

        let mut solver = Solver {
            model,
            initial_belief,
            lower,
            upper,
            belief,
            streams,
            config,
            history: History::new(),
            root: None,
        };
        solver.init()?;
        Ok(solver)
    }

    /// Resample `n_particles` scenarios from the initial belief pool and
    /// install them as a fresh root.
    pub fn init(&mut self) -> Result<(), SolverError> {
        let pool: Vec<Particle<M::State>> = self
            .initial_belief
            .iter()
            .map(|(state, weight)| Particle::new(state.clone(), 0, *weight))
            .collect();
        let particles = self.belief.sample(&self.model, &pool, self.config.n_particles);
        if particles.is_empty() {
            return Err(SolverError::EmptyBelief);
        }

        let root = self.context().make_vnode(particles, 0);
        self.root = Some(root);
        Ok(())
    }

    /// Restore the updater and history, then reinstall the initial root.
    pub fn reset(&mut self) -> Result<(), SolverError> {
        self.belief.reset();
        self.history.truncate(0);
        self.init()
    }

    /// Run trials until the wall-clock budget, the trial cap, or the root
    /// excess-uncertainty gate stops the loop, then return the action to
    /// execute.
    pub fn search(&mut self, max_time: f64) -> Result<SearchMetrics, SolverError> {
        self.search_with_hook(max_time, |_metrics| {})
    }

    /// Like [`search`](Self::search), invoking `on_trial` after each
    /// completed trial.
    pub fn search_with_hook<F>(
        &mut self,
        max_time: f64,
        mut on_trial: F,
    ) -> Result<SearchMetrics, SolverError>
    where
        F: FnMut(&TrialMetrics),
    {
        let start = Instant::now();
        let mut trials = 0usize;

        let root = match self.root.as_mut() {
            Some(root) => root,
            None => return Err(SolverError::NotInitialized),
        };
        let mut ctx = TrialContext {
            model: &self.model,
            streams: &self.streams,
            config: &self.config,
            lower: &mut self.lower,
            upper: &mut self.upper,
            history: &mut self.history,
        };

        while start.elapsed().as_secs_f64() < max_time {
            if ctx.config.max_trials > 0 && trials >= ctx.config.max_trials {
                break;
            }
            let gate = excess_uncertainty(
                root.lower(),
                root.upper(),
                root.lower(),
                root.upper(),
                0,
                ctx.config.discount,
                ctx.config.xi,
            );
            if gate <= TINY {
                break;
            }

            let (root_lower, root_upper) = (root.lower(), root.upper());
            let nodes_added = ctx.trial(root, root_lower, root_upper);
            trials += 1;
            on_trial(&TrialMetrics {
                trial: trials,
                nodes_added,
                tree_nodes: root.n_tree_nodes(),
                root_lower: root.lower(),
                root_upper: root.upper(),
            });
        }

        let discount = ctx.config.discount;
        let pruning_constant = ctx.config.pruning_constant;

        let action = if pruning_constant > 0.0 {
            let pruned = root.prune(pruning_constant, discount);
            pruned.action.unwrap_or(root.default_action())
        } else if !root.in_tree() {
            root.default_action()
        } else {
            let mut best_action = root.default_action();
            let mut best_value = -INF;
            for qnode in root.children() {
                let value = qnode.first_step_reward() + discount * qnode.lower();
                if value > best_value {
                    best_value = value;
                    best_action = qnode.action();
                }
            }
            best_action
        };

        Ok(SearchMetrics {
            action,
            trials,
            tree_nodes: root.n_tree_nodes(),
            root_lower: root.lower(),
            root_upper: root.upper(),
        })
    }

    /// Commit a real `(action, observation)`: the posterior becomes the new
    /// root and the old tree is dropped. On particle depletion the previous
    /// root is left untouched.
    pub fn update_belief(&mut self, action: usize, obs: u64) -> Result<(), SolverError> {
        let particles = match self.root.as_ref() {
            Some(root) => self.belief.update(
                &self.model,
                root.particles(),
                self.config.n_particles,
                action,
                obs,
            ),
            None => return Err(SolverError::NotInitialized),
        };
        if particles.is_empty() {
            return Err(SolverError::ParticleDepletion { action, obs });
        }

        self.root = None;
        self.history.push(action, obs);
        let root = self.context().make_vnode(particles, 0);
        self.root = Some(root);
        Ok(())
    }

    /// True iff every root particle is terminal.
    pub fn finished(&self) -> bool {
        match &self.root {
            Some(root) => root
                .particles()
                .iter()
                .all(|particle| self.model.is_terminal(&particle.state)),
            None => true,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn root(&self) -> Option<&VNode<M::State>> {
        self.root.as_ref()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn streams(&self) -> &RandomStreams {
        &self.streams
    }

    fn context(&mut self) -> TrialContext<'_, M, L, U> {
        TrialContext {
            model: &self.model,
            streams: &self.streams,
            config: &self.config,
            lower: &mut self.lower,
            upper: &mut self.upper,
            history: &mut self.history,
        }
    }
}

/// Borrowed pieces of the solver needed by one trial, split out so the tree
/// can be walked mutably while the bound heuristics update their caches.
struct TrialContext<'a, M, L, U>
where
    M: PomdpModel,
{
    model: &'a M,
    streams: &'a RandomStreams,
    config: &'a SearchConfig,
    lower: &'a mut L,
    upper: &'a mut U,
    history: &'a mut History,
}

impl<'a, M, L, U> TrialContext<'a, M, L, U>
where
    M: PomdpModel,
    L: LowerBound<M>,
    U: UpperBound<M>,
{
    /// Seed a fringe node with both bound heuristics.
    fn make_vnode(&mut self, particles: Vec<Particle<M::State>>, depth: usize) -> VNode<M::State> {
        let ValuedAction {
            value: lower,
            action,
        } = self
            .lower
            .lower_bound(self.model, self.streams, self.history, &particles, depth);
        let upper = self
            .upper
            .upper_bound(self.model, self.streams, self.history, &particles, depth);
        assert!(
            lower <= upper + TINY,
            "lower bound {lower} exceeds upper bound {upper} at depth {depth}"
        );
        VNode::new(particles, depth, lower, upper, action)
    }

    /// One root-to-fringe descent with backup. Returns how many nodes became
    /// part of the tree.
    fn trial(&mut self, node: &mut VNode<M::State>, root_lower: f64, root_upper: f64) -> usize {
        if node.depth() >= self.config.search_depth {
            return 0;
        }
        // Terminal particles route together, so checking the first suffices.
        let terminal = node
            .particles()
            .first()
            .map(|particle| self.model.is_terminal(&particle.state))
            .unwrap_or(true);
        if terminal {
            return 0;
        }

        if node.is_fringe() {
            self.expand_one_step(node);
        }

        let astar = node.best_ub_action();
        let discount = self.config.discount;
        let xi = self.config.xi;
        let weight = node.weight();
        let mut nodes_added = 0;

        // Pick the observation branch with the highest weighted excess
        // uncertainty relative to the root; none positive means no branch is
        // worth refining further.
        let chosen_obs = {
            let qnode = &node.children()[astar];
            let mut best_obs = None;
            let mut best_score = 0.0;
            for branch in qnode.branches() {
                let child = branch.node();
                let score = (child.weight() / weight)
                    * excess_uncertainty(
                        child.lower(),
                        child.upper(),
                        root_lower,
                        root_upper,
                        child.depth(),
                        discount,
                        xi,
                    );
                if score > best_score {
                    best_score = score;
                    best_obs = Some(branch.obs());
                }
            }
            best_obs
        };

        if let Some(obs) = chosen_obs {
            let mark = self.history.len();
            self.history.push(astar, obs);
            if let Some(child) = node.children_mut()[astar].child_mut(obs) {
                nodes_added += self.trial(child, root_lower, root_upper);
            }
            self.history.truncate(mark);
            node.children_mut()[astar].refresh_bounds(weight);
        }

        // Lower bound backup: monotone non-decreasing.
        let qnode = &node.children()[astar];
        let candidate = qnode.first_step_reward() + discount * qnode.lower();
        if candidate > node.lower() {
            node.set_lower(candidate);
        }

        // Upper bound backup: recompute across all actions. Each particle's
        // best first action may differ, so inheriting astar's value would be
        // incorrect.
        let mut best_upper = -INF;
        let mut best_action = astar;
        for qnode in node.children() {
            let value = qnode.first_step_reward() + discount * qnode.upper();
            if value > best_upper + TINY {
                best_upper = value;
                best_action = qnode.action();
            }
        }
        node.set_upper(best_upper);
        node.set_best_ub_action(best_action);

        assert!(
            node.lower() <= node.upper() + TINY,
            "lower bound {} exceeds upper bound {} after backup",
            node.lower(),
            node.upper()
        );

        if !node.in_tree() {
            node.mark_in_tree();
            nodes_added += 1;
        }
        node.add_tree_nodes(nodes_added);

        nodes_added
    }

    /// Create one QNode per action by stepping a copy of every particle with
    /// its scenario draw and partitioning the copies by emitted observation.
    fn expand_one_step(&mut self, node: &mut VNode<M::State>) {
        let num_actions = self.model.num_actions();
        assert!(num_actions > 0, "model must expose at least one action");

        let depth = node.depth();
        let weight = node.weight();
        let terminal_obs = self.model.terminal_obs();

        let mut qnodes = Vec::with_capacity(num_actions);
        let mut qstar = -INF;
        let mut best_action = 0;

        for action in 0..num_actions {
            let mut partitions: Vec<(u64, Vec<Particle<M::State>>)> = Vec::new();
            let mut reward_sum = 0.0;

            for particle in node.particles() {
                let mut copy = particle.clone();
                let sample = self.streams.entry(copy.id, depth);
                let (reward, obs) = self.model.step(&mut copy.state, sample, action);
                reward_sum += copy.weight * reward;

                if self.model.is_terminal(&copy.state) {
                    assert!(
                        obs == terminal_obs,
                        "terminal state must emit the terminal observation"
                    );
                } else {
                    assert!(
                        obs != terminal_obs,
                        "non-terminal state emitted the terminal observation"
                    );
                }

                match partitions.iter_mut().find(|(seen, _)| *seen == obs) {
                    Some((_, bucket)) => bucket.push(copy),
                    None => partitions.push((obs, vec![copy])),
                }
            }

            let first_step_reward = if weight > 0.0 { reward_sum / weight } else { 0.0 };

            let children: Vec<ObservationBranch<M::State>> = partitions
                .into_iter()
                .map(|(obs, particles)| {
                    ObservationBranch::new(obs, self.make_vnode(particles, depth + 1))
                })
                .collect();

            let qnode = QNode::new(action, depth, first_step_reward, children, weight);
            let score = first_step_reward + self.config.discount * qnode.upper();
            if score > qstar + TINY {
                qstar = score;
                best_action = action;
            }
            qnodes.push(qnode);
        }

        node.set_children(qnodes);
        node.set_best_ub_action(best_action);
    }
}
