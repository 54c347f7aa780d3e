// SPDX-License-Identifier: MPL-2.0
//! Media source handling.
//!
//! - [`source`]: Resolves a file record to a loadable URL
//! - [`blob`]: Bounded store behind local `blob:` URLs
//! - [`extensions`]: Extension to mime type table

pub mod blob;
pub mod extensions;
pub mod source;

// Re-export commonly used types
pub use blob::{Blob, BlobStats, BlobStore};
pub use extensions::{mime_for_extension, mime_for_path};
pub use source::{CancellationToken, MediaSourceResolver, SourceConfig, Viewport};

/// Broad media category, derived from the mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaType {
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.split_once('/').map(|(kind, _)| kind.to_ascii_lowercase()) {
            Some(kind) if kind == "image" => MediaType::Image,
            Some(kind) if kind == "video" => MediaType::Video,
            Some(kind) if kind == "audio" => MediaType::Audio,
            _ => MediaType::Other,
        }
    }

    /// Played through a streamed reference rather than decoded whole.
    #[must_use]
    pub fn is_streamed(self) -> bool {
        matches!(self, MediaType::Video | MediaType::Audio)
    }
}
