//! Error taxonomy for ranges, search and the ex interpreter.

use thiserror::Error;

use crate::surface::SurfaceKind;

/// Contract violations raised by the range layer. Offsets never produce
/// errors (they are clamped); these cover operations that cannot be honored.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("{operation} is not supported by {kind} surfaces")]
    UnsupportedOperation {
        operation: &'static str,
        kind: SurfaceKind,
    },
    #[error("unknown bounds function: {0}")]
    UnknownBounds(String),
    #[error("bad arguments for bounds function {name}: {reason}")]
    BadBoundsArgs { name: &'static str, reason: String },
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Pattern compilation and flag errors. A search that simply finds nothing
/// is not an error.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("unknown search flag: {0}")]
    BadFlag(char),
}

/// The user dismissed a prompt.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cancelled")]
pub struct Cancelled;

/// Everything an ex command can fail with.
#[derive(Debug, Error)]
pub enum ExError {
    #[error("{0}")]
    Parse(String),
    #[error("not an editor command: {0}")]
    UnknownCommand(String),
    #[error("ambiguous address: {0}")]
    AmbiguousAddress(String),
    #[error("mark not set: {0}")]
    MarkNotSet(String),
    #[error("pattern not found: {0}")]
    PatternNotFound(String),
    #[error("no previous regular expression")]
    NoPreviousPattern,
    #[error("{0}")]
    BadOption(String),
    #[error("register {0} is empty")]
    EmptyRegister(char),
    #[error("{0}")]
    Refused(String),
    #[error("{message}")]
    Persistence {
        message: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl From<Cancelled> for ExError {
    fn from(_: Cancelled) -> Self {
        ExError::Cancelled
    }
}

impl ExError {
    pub fn parse(message: impl Into<String>) -> Self {
        ExError::Parse(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExError::Cancelled)
    }
}
