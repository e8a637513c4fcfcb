//! Error taxonomy for a commait run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommaitError {
    #[error("no changes to commit: nothing is staged and the working tree is clean")]
    NoChanges,

    #[error("model backend at {host} is unavailable: {reason}")]
    ModelUnavailable { host: String, reason: String },

    #[error(
        "model `{model}` did not answer within {secs}s; shrink the prompt with --budget or raise request_timeout_secs"
    )]
    ModelTimeout { model: String, secs: u64 },

    #[error("unexpected answer from the model backend: {0}")]
    Protocol(String),

    #[error("the model returned no usable commit message; run again or pick another model with --model")]
    EmptyMessage,

    /// Not a failure: the user backed out of the commit editor.
    #[error("commit cancelled, the generated message is kept in {}", path.display())]
    UserCancelled { path: PathBuf },

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CommaitError {
    /// Whether this error ends the run normally (exit code 0).
    pub fn is_normal_exit(&self) -> bool {
        matches!(self, CommaitError::UserCancelled { .. })
    }
}
