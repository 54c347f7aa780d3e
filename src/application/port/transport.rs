// SPDX-License-Identifier: MPL-2.0
//! Byte transport and playback probe ports used by the media source resolver.

use crate::error::MediaLoadError;
use async_trait::async_trait;

/// Bytes returned by an authenticated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBytes {
    /// `Content-Type` reported by the server, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedBytes {
    #[must_use]
    pub fn new(content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type,
            bytes,
        }
    }
}

/// Performs authenticated GET requests on behalf of the resolver.
///
/// Implementations attach the session credentials; the resolver never sees them.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Fetches the whole body behind `url`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaLoadError::Transport`] on network failure and
    /// [`MediaLoadError::Status`] on a non-success HTTP status.
    async fn fetch(&self, url: &str) -> Result<FetchedBytes, MediaLoadError>;
}

/// Attempts to play a source, the way a media element would with its `src`.
///
/// Returns a human-readable reason when the source cannot be played.
#[async_trait]
pub trait SourceProbe: Send + Sync {
    async fn try_load(&self, url: &str) -> Result<(), String>;
}
