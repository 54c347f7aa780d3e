// SPDX-License-Identifier: MPL-2.0
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Viewer session is not initialized")]
    NotInitialized,

    #[error("Viewer session is closed")]
    SessionClosed,

    #[error("Media Error: {0}")]
    MediaLoad(#[from] MediaLoadError),

    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    #[error("No handler can render mime type {mime}")]
    NoHandler { mime: String },

    /// A `next()`/`prev()` arrived while pagination was still pending.
    #[error("Navigation already in progress")]
    NavigationInProgress,

    #[error("File info Error: {0}")]
    FileInfo(String),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Config Error: {0}")]
    Config(String),
}

/// Rule violated by a handler descriptor or a navigation argument.
///
/// Raised synchronously and never recovered inside the crate: these are
/// programming errors on the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("handler id must not be empty")]
    EmptyId,

    #[error("handler display name must not be empty")]
    EmptyDisplayName,

    #[error("handler tag name must not be empty")]
    EmptyTagName,

    #[error("invalid tag name '{tagname}': {reason}")]
    InvalidTagName { tagname: String, reason: &'static str },

    #[error("handler must provide an enabled predicate")]
    MissingEnabled,

    #[error("active file '{needle}' is not part of the file list")]
    ActiveFileNotInList { needle: String },

    #[error("cannot open a session without any file")]
    EmptySession,
}

/// A file could not produce a renderable source.
///
/// Reported per file so that browsing the rest of the list keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaLoadError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server answered with HTTP status {0}")]
    Status(u16),

    #[error("source {url} was rejected: {reason}")]
    Rejected { url: String, reason: String },

    #[error("direct load failed ({direct}) and manual fetch failed ({fallback})")]
    FallbackExhausted { direct: String, fallback: String },

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The request was abandoned because the file is no longer active.
    #[error("request cancelled")]
    Cancelled,
}

impl MediaLoadError {
    /// Short machine-readable key the UI layer can map to a message.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            MediaLoadError::Transport(_) => "error-load-media-network",
            MediaLoadError::Status(_) => "error-load-media-status",
            MediaLoadError::Rejected { .. } => "error-load-media-rejected",
            MediaLoadError::FallbackExhausted { .. } => "error-load-media-unplayable",
            MediaLoadError::TooLarge { .. } => "error-load-media-too-large",
            MediaLoadError::Cancelled => "error-load-media-cancelled",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
