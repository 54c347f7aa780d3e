// SPDX-License-Identifier: MPL-2.0
//! Application layer - Use cases and orchestration.
//!
//! - [`port`]: Trait definitions for the external collaborators
//! - [`registry`]: Process-wide handler registry
//! - [`mime`]: Mime-type to handler resolution
//! - [`navigation`]: Navigation state machine over an open list
//! - [`session`]: The viewer session façade
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - Hosts talk to [`session::ViewerSession`] (or the [`crate::global`] slots)

pub mod mime;
pub mod navigation;
pub mod port;
pub mod registry;
pub mod session;

pub use mime::{AliasTable, MimeResolver};
pub use navigation::{NavigationController, NavigationInfo, NavigationOptions, NavigationState};
pub use registry::{HandlerRegistry, Registration};
pub use session::{OpenOptions, SourceState, ViewerSession};
