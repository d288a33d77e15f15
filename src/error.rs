//! Error types shared across the sync pipeline.

use thiserror::Error;

/// Raised while turning a config file into [`crate::Settings`].
/// Always fatal: nothing runs when validation fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported playlist export format '{0}' (only m3u is supported)")]
    UnsupportedFormat(String),

    #[error("missing required path: {0}")]
    MissingPath(&'static str),

    #[error("{field} must be an absolute path, got '{value}'")]
    RelativePath { field: &'static str, value: String },

    #[error("no local media directories configured")]
    NoMediaDirs,

    #[error("base path '{0}' is empty once trailing separators are removed")]
    EmptyBasePath(String),

    #[error("remote host is required for the rsync backend")]
    MissingRemoteHost,
}

/// Failure reported by the player's control surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The call reached the bus and came back with a named error.
    #[error("{reason}: {message}")]
    Rpc { reason: String, message: String },

    /// The control tool could not be started or produced garbage.
    #[error("player control unavailable: {0}")]
    Unavailable(String),
}

impl PlayerError {
    pub fn rpc(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rpc {
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Symbolic reason, if the failure carried one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Rpc { reason, .. } => Some(reason),
            Self::Unavailable(_) => None,
        }
    }

    /// `NoReply` usually means the player has not finished starting up, or it
    /// hung on an empty or very large playlist. A restart fixes it.
    pub fn is_transient(&self) -> bool {
        self.reason().is_some_and(|r| r.contains("Error.NoReply"))
    }
}

/// Failure of a single mirror invocation.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("nothing to mirror for {0}")]
    NoSources(String),

    #[error("`{command}` exited with status {code:?}")]
    ExitStatus { command: String, code: Option<i32> },

    #[error("cannot start mirror command: {0}")]
    Spawn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
