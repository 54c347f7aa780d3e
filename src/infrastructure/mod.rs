// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`http`]: Authenticated fetches via `reqwest` (implements [`MediaTransport`])
//! - [`local`]: Folder listings over a local tree (implements [`FileInfoSource`])
//!
//! [`MediaTransport`]: crate::application::port::MediaTransport
//! [`FileInfoSource`]: crate::application::port::FileInfoSource

pub mod http;
pub mod local;

// Re-export main types for convenience
pub use http::{Credentials, HttpTransport};
pub use local::LocalFileInfoSource;
