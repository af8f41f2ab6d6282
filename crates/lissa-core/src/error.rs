//! Error types for lissa-core.

use thiserror::Error;

/// Result type for lissa-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lissa-core.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable executable found for a plugin.
    #[error("no executable found for {kind}: tried {tried}")]
    ExecutableNotFound { kind: String, tried: String },

    /// Failed to materialize the plugin script to a temp file.
    #[error("failed to write plugin script: {0}")]
    ScriptWrite(std::io::Error),

    /// Failed to spawn the plugin process.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
