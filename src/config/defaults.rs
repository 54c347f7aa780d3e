// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Server**: Base URL, user and HTTP identity
//! - **Preview**: Viewport used to size server previews
//! - **Blob Cache**: Memory bound of the local blob store

// ==========================================================================
// Server Defaults
// ==========================================================================

/// Server the viewer talks to when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// User segment of WebDAV paths when nothing is configured.
pub const DEFAULT_USER: &str = "admin";

/// `User-Agent` sent with authenticated fetches.
pub const DEFAULT_USER_AGENT: &str = concat!("ViewerCore/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed by a single fetch.
pub const MAX_REDIRECTS: usize = 10;

// ==========================================================================
// Preview Defaults
// ==========================================================================

/// Default screen width in logical pixels.
pub const DEFAULT_SCREEN_WIDTH: u32 = 1920;

/// Default screen height in logical pixels.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1080;

/// Default device pixel ratio.
pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 1.0;

/// Smallest accepted device pixel ratio.
pub const MIN_DEVICE_PIXEL_RATIO: f64 = 0.5;

/// Largest accepted device pixel ratio.
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 4.0;

// ==========================================================================
// Blob Cache Defaults
// ==========================================================================

/// Default blob store size in megabytes.
pub const DEFAULT_BLOB_CACHE_MB: u32 = 64;

/// Minimum blob store size in megabytes.
pub const MIN_BLOB_CACHE_MB: u32 = 8;

/// Maximum blob store size in megabytes.
pub const MAX_BLOB_CACHE_MB: u32 = 512;
