//! Diff Reporter - Stage-By-Stage Stack Differences
//!
//! Each resolution pass narrows or widens the working set; the diff of
//! every consecutive pair is what makes a surprising final stack
//! explainable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::names::LayerIdentity;

/// Paths added and removed between two resolution stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackDiff {
    pub stage: String,
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl StackDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute the set-difference between two layer lists and log it one
/// `+`/`-` line per path.
pub fn diff_stage(stage: &str, before: &[LayerIdentity], after: &[LayerIdentity]) -> StackDiff {
    let added: Vec<PathBuf> = after
        .iter()
        .filter(|layer| !before.iter().any(|b| b.path == layer.path))
        .map(|layer| layer.path.clone())
        .collect();
    let removed: Vec<PathBuf> = before
        .iter()
        .filter(|layer| !after.iter().any(|a| a.path == layer.path))
        .map(|layer| layer.path.clone())
        .collect();

    for path in &added {
        debug!(stage, "+ {}", path.display());
    }
    for path in &removed {
        debug!(stage, "- {}", path.display());
    }

    StackDiff {
        stage: stage.to_string(),
        added,
        removed,
    }
}
