use serde::Serialize;

use crate::solver::{
    belief::BeliefUpdate,
    bounds::{LowerBound, UpperBound},
    model::PomdpModel,
    node::VNode,
    qnode::QNode,
    search::Solver,
};

#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    pub schema_version: u32,
    pub tree_nodes: usize,
    pub root: VNodeSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct VNodeSnapshot {
    pub depth: usize,
    pub weight: f64,
    pub lower: f64,
    pub upper: f64,
    pub in_tree: bool,
    pub default_action: usize,
    pub best_ub_action: usize,
    pub n_particles: usize,
    pub actions: Vec<QNodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QNodeSnapshot {
    pub action: usize,
    pub first_step_reward: f64,
    pub lower: f64,
    pub upper: f64,
    pub observations: Vec<ObservationSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationSnapshot {
    pub obs: u64,
    pub child: VNodeSnapshot,
}

impl TreeSnapshot {
    /// Capture the current belief tree rooted at `root`.
    pub fn capture<S>(root: &VNode<S>) -> Self {
        TreeSnapshot {
            schema_version: 1,
            tree_nodes: root.n_tree_nodes(),
            root: VNodeSnapshot::capture(root),
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl VNodeSnapshot {
    fn capture<S>(node: &VNode<S>) -> Self {
        VNodeSnapshot {
            depth: node.depth(),
            weight: node.weight(),
            lower: node.lower(),
            upper: node.upper(),
            in_tree: node.in_tree(),
            default_action: node.default_action(),
            best_ub_action: node.best_ub_action(),
            n_particles: node.particles().len(),
            actions: node.children().iter().map(QNodeSnapshot::capture).collect(),
        }
    }
}

impl QNodeSnapshot {
    fn capture<S>(qnode: &QNode<S>) -> Self {
        QNodeSnapshot {
            action: qnode.action(),
            first_step_reward: qnode.first_step_reward(),
            lower: qnode.lower(),
            upper: qnode.upper(),
            observations: qnode
                .branches()
                .iter()
                .map(|branch| ObservationSnapshot {
                    obs: branch.obs(),
                    child: VNodeSnapshot::capture(branch.node()),
                })
                .collect(),
        }
    }
}

impl<M, L, U, B> Solver<M, L, U, B>
where
    M: PomdpModel,
    L: LowerBound<M>,
    U: UpperBound<M>,
    B: BeliefUpdate<M>,
{
    /// Export the current tree, if a root is installed.
    pub fn snapshot(&self) -> Option<TreeSnapshot> {
        self.root().map(TreeSnapshot::capture)
    }
}
