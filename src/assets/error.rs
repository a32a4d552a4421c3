use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while planning or materializing binary assets
#[derive(Debug, Error)]
pub enum AssetError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Every suffixed candidate name is already taken
    #[error("No free output name for {0}")]
    CollisionExhausted(PathBuf),

    /// External converter failed
    #[error("Job '{program}' failed: {message}")]
    JobFailed {
        /// Program that was run
        program: String,
        /// Exit status or spawn error
        message: String,
    },

    /// Source files share no directory to relocate
    #[error("Source files have no common root directory")]
    NoCommonRoot,
}
