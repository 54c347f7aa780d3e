// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for the external collaborators.
//!
//! The viewer core never talks to the network, the filesystem or the host
//! router directly; it goes through these traits so that hosts and tests can
//! inject their own implementations.
//!
//! # Available Ports
//!
//! - [`file_info`]: Folder listings and single-file stats
//! - [`hooks`]: Host router callbacks and pagination
//! - [`transport`]: Authenticated byte fetches and playback probes

pub mod file_info;
pub mod hooks;
pub mod transport;

// Re-export main types for convenience
pub use file_info::FileInfoSource;
pub use hooks::{
    dispatch, CallbackHooks, CollaboratorError, HookResult, LoadMore, LoadMoreFn,
    NavigationEvent, NavigationHooks, NoMoreFiles, NoopHooks,
};
pub use transport::{FetchedBytes, MediaTransport, SourceProbe};
