//! Compositor Boundary
//!
//! The actual pixel work lives in an external compositing engine. This
//! module fixes the hand-off contract: an ordered path stack (first =
//! background), a blend mode, and a destination that must not already
//! exist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Plain alpha-over stacking (resolved composites).
    Over,
    /// Multiply blending (exhaustive permutation composites).
    Multiply,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Over
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    /// Compositing zero layers is always a caller mistake, never a
    /// silent no-op.
    #[error("expected stack of layers to at least have one layer")]
    EmptyStack,

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("compositor failure: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated hand-off to the external compositor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeJob {
    /// Bottom-to-top layer stack; first path is the background.
    pub stack: Vec<PathBuf>,
    pub blend: BlendMode,
    pub dest: PathBuf,
}

impl CompositeJob {
    /// Build a job, enforcing the caller-side contract: a non-empty
    /// stack and a destination that does not exist yet. A compositor
    /// implementation may assume both hold.
    pub fn new(stack: Vec<PathBuf>, blend: BlendMode, dest: &Path) -> Result<Self, ComposeError> {
        if stack.is_empty() {
            return Err(ComposeError::EmptyStack);
        }
        if dest.exists() {
            return Err(ComposeError::DestinationExists(dest.to_path_buf()));
        }
        Ok(Self {
            stack,
            blend,
            dest: dest.to_path_buf(),
        })
    }

    pub fn background(&self) -> &Path {
        &self.stack[0]
    }

    /// Layers applied over the background, in order.
    pub fn overlays(&self) -> &[PathBuf] {
        &self.stack[1..]
    }
}

/// The external compositing engine seam.
pub trait Compositor {
    fn composite(&self, job: &CompositeJob) -> Result<(), ComposeError>;
}
