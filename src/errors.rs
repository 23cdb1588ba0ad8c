// Bridge error taxonomy
//
// Every failure surfaces synchronously to the caller of the failing
// operation; nothing is retried internally. A failed training call leaves
// the bridge reusable, a failed load leaves no instance at all.

use std::path::PathBuf;
use thiserror::Error;

/// The result type used across the bridge.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// All errors the bridge can surface.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The model artifact is missing, unreadable, or cannot be parsed.
    /// Only raised at construction.
    #[error("failed to load model artifact {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Writing a model artifact to disk failed.
    #[error("failed to write model artifact {path:?}: {reason}")]
    ArtifactWrite { path: PathBuf, reason: String },

    /// Declared shapes disagree with buffer sizes, parameter counts, or the
    /// rank the loaded plan expects. Detected before the runtime runs.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// An element type tag outside the supported set.
    #[error("unsupported element type tag {0}")]
    UnsupportedDtype(u32),

    /// A tensor handle that does not name a live entry in the bridge's
    /// tensor table.
    #[error("tensor handle {0} does not name a live tensor")]
    InvalidHandle(usize),

    /// The underlying forward/backward/update failed. Propagated, not
    /// retried.
    #[error("tensor runtime error: {0}")]
    Runtime(#[from] candle_core::Error),
}
