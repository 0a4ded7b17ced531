use serde::Serialize;

use crate::solver::{
    config::SearchConfig,
    search::{SearchMetrics, TrialMetrics},
};

/// Structured run-log events, one JSON object per line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchLogEvent {
    SearchStarted {
        n_particles: usize,
        search_depth: usize,
        discount: f64,
        xi: f64,
    },
    TrialCompleted {
        trial: usize,
        tree_nodes: usize,
        root_lower: f64,
        root_upper: f64,
    },
    SearchFinished {
        action: usize,
        trials: usize,
    },
}

impl SearchLogEvent {
    pub fn search_started(config: &SearchConfig) -> Self {
        SearchLogEvent::SearchStarted {
            n_particles: config.n_particles,
            search_depth: config.search_depth,
            discount: config.discount,
            xi: config.xi,
        }
    }

    pub fn trial_completed(metrics: &TrialMetrics) -> Self {
        SearchLogEvent::TrialCompleted {
            trial: metrics.trial,
            tree_nodes: metrics.tree_nodes,
            root_lower: metrics.root_lower,
            root_upper: metrics.root_upper,
        }
    }

    pub fn search_finished(metrics: &SearchMetrics) -> Self {
        SearchLogEvent::SearchFinished {
            action: metrics.action,
            trials: metrics.trials,
        }
    }

    /// Serialize as a single JSONL line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
