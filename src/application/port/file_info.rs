// SPDX-License-Identifier: MPL-2.0
//! File-info collaborator port.
//!
//! A file-info source answers "what is at this path" (stat) and "what is in
//! this folder" (listing). Records must carry at least `fileid`, `filename`,
//! `basename`, `mime` and `size`; `etag` and `has_preview` drive the source
//! resolver's branching when present.

use crate::domain::file::FileRecord;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FileInfoSource: Send + Sync {
    /// Returns metadata for a single path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileInfo`](crate::error::Error::FileInfo) when the
    /// path does not exist or cannot be read.
    async fn stat(&self, path: &str) -> Result<FileRecord>;

    /// Returns the direct children of `folder`, directories included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileInfo`](crate::error::Error::FileInfo) when the
    /// folder cannot be listed.
    async fn list_folder(&self, folder: &str) -> Result<Vec<FileRecord>>;
}
