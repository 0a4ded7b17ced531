mod solver;

pub use solver::belief::{BeliefUpdate, ParticleFilter};
pub use solver::bounds::{LowerBound, UpperBound, ValuedAction};
pub use solver::config::{SearchConfig, SearchConfigError, INF, TINY};
pub use solver::error::SolverError;
pub use solver::history::History;
pub use solver::log::SearchLogEvent;
pub use solver::model::PomdpModel;
pub use solver::node::{PrunedValue, VNode};
pub use solver::particle::{total_weight, Particle};
pub use solver::qnode::{ObservationBranch, QNode};
pub use solver::rollout::{ModePolicy, RandomPolicy};
pub use solver::search::{SearchMetrics, Solver, TrialMetrics};
pub use solver::snapshot::{ObservationSnapshot, QNodeSnapshot, TreeSnapshot, VNodeSnapshot};
pub use solver::streams::RandomStreams;
pub use solver::upper_bound::{NonStochasticUpperBound, StochasticUpperBound, TrivialUpperBound};
