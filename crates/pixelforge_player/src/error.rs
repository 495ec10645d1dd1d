// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player errors.

use pixelforge_timeline::TimelineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the `pixelforge` command line
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Engine failure
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Input file type not recognised
    #[error("unsupported input '{}': expected .pxpr reel or .ron animation", .0.display())]
    UnsupportedInput(PathBuf),

    /// Nothing to export
    #[error("'{0}' has no frames with pixel data")]
    NothingToExport(String),

    /// Frame range outside the input
    #[error("frame {frame} is out of range (0..{count})")]
    FrameOutOfRange {
        /// Requested frame
        frame: usize,
        /// Frames available
        count: usize,
    },

    /// PNG encoding failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON encoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for player commands
pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
