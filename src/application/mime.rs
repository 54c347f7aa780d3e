// SPDX-License-Identifier: MPL-2.0
//! Mime-type to handler resolution.
//!
//! Resolution tries the file's mime against every specific handler, then
//! retries exactly once with the canonical mime from the alias table. A
//! second hop is never attempted, so alias cycles cannot loop.

use crate::domain::handler::Handler;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Uncommon mime strings browsers or servers report, mapped to the canonical
/// type renderers advertise.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("video/x-matroska", "video/webm"),
    ("audio/x-wav", "audio/wav"),
    ("audio/x-flac", "audio/flac"),
    ("image/x-ms-bmp", "image/bmp"),
    ("image/jpg", "image/jpeg"),
];

/// Static map from alias mime to canonical mime. Keys are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the built-in aliases.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (from, to) in DEFAULT_ALIASES {
            table.insert(from, to);
        }
        table
    }

    /// Adds or replaces an alias.
    pub fn insert(&mut self, from: &str, to: &str) {
        self.entries
            .insert(from.to_ascii_lowercase(), to.to_ascii_lowercase());
    }

    /// Adds an alias unless one already exists for `from`.
    pub fn insert_if_absent(&mut self, from: &str, to: &str) {
        self.entries
            .entry(from.to_ascii_lowercase())
            .or_insert_with(|| to.to_ascii_lowercase());
    }

    /// Merges `other` over this table, replacing conflicting entries.
    pub fn extend<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (from, to) in other {
            self.insert(from, to);
        }
    }

    #[must_use]
    pub fn canonical(&self, mime: &str) -> Option<&str> {
        self.entries
            .get(&mime.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stateless resolver from a mime type to a handler id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeResolver;

impl MimeResolver {
    /// Returns the id of the first specific handler supporting `mime`, after
    /// at most one alias substitution.
    ///
    /// Generic fallback handlers are skipped here: `None` tells the caller
    /// to fall back to them (see [`MimeResolver::resolve_or_fallback`]).
    #[must_use]
    pub fn resolve(mime: &str, aliases: &AliasTable, handlers: &[Arc<Handler>]) -> Option<String> {
        let direct = Self::first_supporting(mime, handlers);
        if direct.is_some() {
            return direct;
        }

        let canonical = aliases.canonical(mime)?;
        if canonical.eq_ignore_ascii_case(mime) {
            return None;
        }
        tracing::debug!("No handler for {mime}, retrying as alias {canonical}");
        Self::first_supporting(canonical, handlers)
    }

    /// Like [`MimeResolver::resolve`] but falls back to the first generic
    /// handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHandler`] when neither a specific nor a generic
    /// handler is registered.
    pub fn resolve_or_fallback(
        mime: &str,
        aliases: &AliasTable,
        handlers: &[Arc<Handler>],
    ) -> Result<String> {
        if let Some(id) = Self::resolve(mime, aliases, handlers) {
            return Ok(id);
        }
        handlers
            .iter()
            .find(|handler| handler.is_wildcard())
            .map(|handler| handler.id.clone())
            .ok_or_else(|| Error::NoHandler {
                mime: mime.to_string(),
            })
    }

    fn first_supporting(mime: &str, handlers: &[Arc<Handler>]) -> Option<String> {
        handlers
            .iter()
            .filter(|handler| !handler.is_wildcard())
            .find(|handler| handler.supports_mime(mime))
            .map(|handler| handler.id.clone())
    }
}
