// SPDX-License-Identifier: MPL-2.0
//! Domain layer - plain data describing what the viewer shows and who renders it.
//!
//! Nothing in here performs I/O. Types are shared by the application layer
//! (registry, navigation, session) and by the infrastructure adapters.
//!
//! # Modules
//!
//! - [`file`]: Viewable items ([`FileRecord`](file::FileRecord),
//!   [`FileList`](file::FileList), [`ShareAttributes`](file::ShareAttributes))
//! - [`handler`]: Renderer descriptors ([`Handler`](handler::Handler),
//!   [`TagName`](handler::TagName))

pub mod file;
pub mod handler;

pub use file::{FileId, FileKind, FileList, FileRecord, FileRef, ShareAttribute, ShareAttributes};
pub use handler::{Handler, TagName, WILDCARD_MIME};
