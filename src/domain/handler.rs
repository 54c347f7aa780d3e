// SPDX-License-Identifier: MPL-2.0
//! Renderer descriptors.
//!
//! A [`Handler`] is registered once by a feature module and tells the viewer
//! which files it can render and which render target (`tagname`) to mount.

use crate::domain::file::FileRecord;
use crate::error::ValidationError;
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Reserved mime pattern matching every file; marks the generic fallback handler.
pub const WILDCARD_MIME: &str = "*";

/// Names the HTML standard reserves even though they contain a hyphen.
const RESERVED_TAG_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Predicate deciding whether a handler can display a set of files.
pub type EnabledFn = Arc<dyn Fn(&[FileRecord]) -> bool + Send + Sync>;

/// Optional warm-up run before a file is displayed (e.g. decoding a poster).
pub type PreloadFn = Arc<dyn Fn(FileRecord) -> BoxFuture<'static, ()> + Send + Sync>;

// =============================================================================
// TagName
// =============================================================================

/// A syntactically valid custom-element style render target name.
///
/// Lowercase ASCII letters, digits and single hyphens; starts with a letter,
/// contains at least one hyphen, never starts/ends with one and never doubles it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagName(String);

impl TagName {
    /// Validates `raw` against the tag name rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a [`ValidationError`].
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &'static str| ValidationError::InvalidTagName {
            tagname: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(ValidationError::EmptyTagName);
        }
        if !raw.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(invalid("must start with a lowercase ASCII letter"));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(if bad.is_ascii_uppercase() {
                invalid("must be lowercase")
            } else {
                invalid("may only contain lowercase letters, digits and hyphens")
            });
        }
        if !raw.contains('-') {
            return Err(invalid("must contain a hyphen"));
        }
        if raw.ends_with('-') {
            return Err(invalid("must not end with a hyphen"));
        }
        if raw.contains("--") {
            return Err(invalid("must not contain consecutive hyphens"));
        }
        if RESERVED_TAG_NAMES.contains(&raw) {
            return Err(invalid("is a reserved element name"));
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Descriptor registered by a feature module.
#[derive(Clone)]
pub struct Handler {
    pub id: String,
    pub display_name: String,
    /// Render target; validated by the registry on registration.
    pub tagname: String,
    /// Classification used to disambiguate between several capable handlers.
    pub group: Option<String>,
    /// Exact mime types, `type/*` patterns, or [`WILDCARD_MIME`].
    pub mimes: Vec<String>,
    /// Uncommon mime strings mapped to a canonical one this handler supports.
    pub mime_aliases: BTreeMap<String, String>,
    pub enabled: Option<EnabledFn>,
    pub preload: Option<PreloadFn>,
}

impl Handler {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        tagname: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tagname: tagname.into(),
            group: None,
            mimes: Vec::new(),
            mime_aliases: BTreeMap::new(),
            enabled: None,
            preload: None,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_mimes<I, S>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mimes = mimes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mime_aliases.insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn with_enabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[FileRecord]) -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn with_preload<F>(mut self, preload: F) -> Self
    where
        F: Fn(FileRecord) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.preload = Some(Arc::new(preload));
        self
    }

    /// Whether this handler declares support for `mime`.
    #[must_use]
    pub fn supports_mime(&self, mime: &str) -> bool {
        self.mimes.iter().any(|pattern| mime_matches(pattern, mime))
    }

    /// Whether this is a generic fallback handler.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.mimes.iter().any(|pattern| pattern == WILDCARD_MIME)
    }

    /// Evaluates the `enabled` predicate, defaulting to mime support of every file.
    #[must_use]
    pub fn is_enabled(&self, files: &[FileRecord]) -> bool {
        match &self.enabled {
            Some(predicate) => predicate(files),
            None => !files.is_empty() && files.iter().all(|file| self.supports_mime(&file.mime)),
        }
    }

    /// Checks the descriptor shape without touching any registry.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<TagName, ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::EmptyDisplayName);
        }
        let tagname = TagName::parse(&self.tagname)?;
        if self.enabled.is_none() && self.mimes.is_empty() {
            return Err(ValidationError::MissingEnabled);
        }
        Ok(tagname)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("tagname", &self.tagname)
            .field("group", &self.group)
            .field("mimes", &self.mimes)
            .field("mime_aliases", &self.mime_aliases)
            .field("enabled", &self.enabled.is_some())
            .field("preload", &self.preload.is_some())
            .finish()
    }
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    if pattern == WILDCARD_MIME {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(major) => mime
            .split_once('/')
            .is_some_and(|(kind, _)| kind.eq_ignore_ascii_case(major)),
        None => pattern.eq_ignore_ascii_case(mime),
    }
}
