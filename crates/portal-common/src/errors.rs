use std::path::PathBuf;

use crate::types::FrameId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Caller mistakes in a position calculation. These are raised
/// synchronously and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("{context} is relative to a reference element, but no reference element was given")]
    MissingReferenceElement { context: &'static str },

    #[error("reference element belongs to {owner}, but the position is calculated in {calculating}")]
    ForeignReferenceElement { owner: FrameId, calculating: FrameId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("no valid window registered for {0}")]
    NoValidWindow(FrameId),

    #[error("window {0} closed before its bridge was ready")]
    WindowClosed(FrameId),

    #[error("ping to {0} timed out")]
    PingTimeout(FrameId),

    #[error("malformed message: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
