use std::time::Duration;

use thiserror::Error;

use crate::models::{SourceKey, SourceKind, StatusAction};
use crate::protocol::Action;

/// Coarse classification of a [`NudgeError`].
///
/// Every category ends up in the single-slot error projection; the category
/// only decides how the failure is logged and whether it ever reached the
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The collaborator answered with `ok: false`.
    Remote,
    /// No answer arrived within the bounded wait.
    Timeout,
    /// Rejected locally, never dispatched.
    Validation,
    /// The message channel itself failed.
    Transport,
}

/// All errors produced by the nudge crates.
#[derive(Error, Debug)]
pub enum NudgeError {
    /// The collaborator reported failure; the message is shown verbatim.
    #[error("{0}")]
    Remote(String),

    /// A call received no response within the configured wait.
    #[error("{action} timed out after {after:?}")]
    Timeout { action: Action, after: Duration },

    /// A required identifier (database id, item id, url) was blank.
    #[error("{0} is empty")]
    EmptyIdentifier(&'static str),

    /// The key does not name a configured source.
    #[error("database not found: {0}")]
    UnknownSource(SourceKey),

    /// The source exists but is disabled.
    #[error("database is disabled: {0}")]
    SourceDisabled(SourceKey),

    /// The operation is not legal for the source's kind.
    #[error("database kind is not {expected}")]
    KindMismatch { expected: SourceKind },

    /// The status target for this action is not configured on the source.
    #[error("status is not configured for action {0}")]
    StatusNotConfigured(StatusAction),

    /// Two sources share the same key.
    #[error("duplicate database key: {0}")]
    DuplicateKey(SourceKey),

    /// The credential entered for saving is blank or still masked.
    #[error("token is empty")]
    EmptyToken,

    /// Any other locally detected configuration problem.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// The outbound or inbound side of the host channel is gone.
    #[error("host channel closed")]
    ChannelClosed,

    /// A payload or result could not be (de)serialized.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for raw I/O errors from the transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NudgeError {
    /// Which branch of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            NudgeError::Remote(_) => ErrorCategory::Remote,
            NudgeError::Timeout { .. } => ErrorCategory::Timeout,
            NudgeError::EmptyIdentifier(_)
            | NudgeError::UnknownSource(_)
            | NudgeError::SourceDisabled(_)
            | NudgeError::KindMismatch { .. }
            | NudgeError::StatusNotConfigured(_)
            | NudgeError::DuplicateKey(_)
            | NudgeError::EmptyToken
            | NudgeError::InvalidConfig(_) => ErrorCategory::Validation,
            NudgeError::ChannelClosed
            | NudgeError::JsonParse(_)
            | NudgeError::Io(_)
            | NudgeError::Other(_) => ErrorCategory::Transport,
        }
    }

    /// `true` when the error was detected before anything was dispatched.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

/// Convenience alias used throughout the nudge crates.
pub type Result<T> = std::result::Result<T, NudgeError>;
