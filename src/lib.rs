// SPDX-License-Identifier: MPL-2.0
//! `viewer_core` is the session and navigation engine behind a media viewer.
//!
//! Feature modules register renderers ([`Handler`]s) in a
//! [`HandlerRegistry`]; a [`ViewerSession`] opens a list of files, resolves
//! which handler renders the active one, pages through the list (loading
//! more on demand) and turns each record into a loadable source URL.
//! Network, filesystem and router access go through the traits in
//! [`application::port`].
//!
//! [`Handler`]: domain::handler::Handler
//! [`HandlerRegistry`]: application::HandlerRegistry
//! [`ViewerSession`]: application::ViewerSession

#![doc(html_root_url = "https://docs.rs/viewer_core/0.3.0")]

pub mod application;
pub mod builtin;
pub mod config;
pub mod domain;
pub mod error;
pub mod global;
pub mod infrastructure;
pub mod media;

pub use application::{HandlerRegistry, OpenOptions, SourceState, ViewerSession};
pub use domain::file::{FileId, FileList, FileRecord};
pub use domain::handler::Handler;
pub use error::{Error, Result};
