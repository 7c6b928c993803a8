//! LayerStack Core - Layer Stack Compiler
//!
//! # The Resolution Rules (Non-Negotiable)
//! 1. Filenames Are Truth
//! 2. Ambiguity Aborts, Never Guesses
//! 3. Ordering Is Deterministic
//! 4. Unparsable Entries Are Skipped, Not Fatal
//! 5. Empty Stacks Are Errors

pub mod compose;
pub mod diff;
pub mod document;
pub mod index;
pub mod manifest;
pub mod names;
pub mod permute;
pub mod resolve;

pub use compose::{BlendMode, ComposeError, CompositeJob, Compositor};
pub use diff::StackDiff;
pub use document::{DocumentNode, NodeKind};
pub use index::LayerIndex;
pub use manifest::StackManifest;
pub use names::{build_name, parse_path, LayerIdentity};
pub use permute::permute;
pub use resolve::{
    resolve, ConflictGroup, Resolution, ResolutionReport, ResolveError, ResolveRequest,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
