// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the timeline engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the timeline engine
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Reel stream does not start with the expected magic token
    #[error("Invalid reel file: bad magic {found:?}")]
    BadMagic {
        /// The four bytes actually read
        found: [u8; 4],
    },

    /// Reel stream uses a version this build cannot read
    #[error("Unsupported reel version {0}")]
    UnsupportedVersion(i32),

    /// Persisted data ended early or carried impossible values
    #[error("Malformed data: {0}")]
    Malformed(String),

    /// A referenced file (audio, reel) does not exist
    #[error("Missing resource: {}", .0.display())]
    MissingResource(PathBuf),

    /// Captured pixel data no longer matches the target's dimensions
    #[error("Dimension mismatch: expected {expected} bytes, got {actual}")]
    DimensionMismatch {
        /// Byte length the target expects
        expected: usize,
        /// Byte length of the captured buffer
        actual: usize,
    },

    /// Referenced layer is not part of the document
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// A background job was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Audio backend failure
    #[error("Audio error: {0}")]
    Audio(String),

    /// Programming error, e.g. interpolating an empty key set
    #[error("Invariant violated: {0}")]
    Invariant(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),

    /// Binary serialization error
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl TimelineError {
    /// Whether the error is a cooperative cancellation that callers swallow
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TimelineError::Cancelled)
    }
}

/// Result type for timeline operations
pub type TimelineResult<T> = std::result::Result<T, TimelineError>;
