// SPDX-License-Identifier: MPL-2.0
//! Handler registry.
//!
//! Stores the renderers contributed by feature modules and answers "which
//! handler can render these files". Registration order is significant: it
//! is the tie-break whenever several handlers qualify.

use crate::application::mime::AliasTable;
use crate::domain::file::FileRecord;
use crate::domain::handler::Handler;
use crate::error::ValidationError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Outcome of a successful [`HandlerRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The id was already taken; the registry is unchanged.
    AlreadyRegistered,
}

/// Insertion-ordered set of handlers, unique by id.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: RwLock<Vec<Arc<Handler>>>,
}

impl HandlerRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Handler>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates and stores `handler`.
    ///
    /// Registering an id twice is tolerated: the second call logs a warning
    /// and leaves the registry untouched. Hosts may run init scripts more
    /// than once.
    ///
    /// # Errors
    ///
    /// Returns the violated rule when the descriptor is malformed. Nothing is
    /// stored in that case.
    pub fn register(&self, handler: Handler) -> Result<Registration, ValidationError> {
        let tagname = handler.validate()?;

        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if handlers.iter().any(|existing| existing.id == handler.id) {
            tracing::warn!(
                "Handler '{}' is already registered, ignoring duplicate registration",
                handler.id
            );
            return Ok(Registration::AlreadyRegistered);
        }

        tracing::debug!("Registered handler '{}' as <{}>", handler.id, tagname);
        handlers.push(Arc::new(handler));
        Ok(Registration::Added)
    }

    /// Returns the handler registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Handler>> {
        self.read().iter().find(|handler| handler.id == id).cloned()
    }

    /// First registered handler whose `enabled(files)` holds, optionally
    /// restricted to `group`.
    #[must_use]
    pub fn find_for(&self, files: &[FileRecord], group: Option<&str>) -> Option<Arc<Handler>> {
        self.read()
            .iter()
            .filter(|handler| group.is_none_or(|group| handler.group.as_deref() == Some(group)))
            .find(|handler| handler.is_enabled(files))
            .cloned()
    }

    /// First registered generic fallback handler.
    #[must_use]
    pub fn wildcard(&self) -> Option<Arc<Handler>> {
        self.read().iter().find(|handler| handler.is_wildcard()).cloned()
    }

    /// Snapshot of every handler, in registration order.
    #[must_use]
    pub fn handlers(&self) -> Vec<Arc<Handler>> {
        self.read().clone()
    }

    /// Handlers keyed by id.
    #[must_use]
    pub fn by_id(&self) -> HashMap<String, Arc<Handler>> {
        self.read()
            .iter()
            .map(|handler| (handler.id.clone(), Arc::clone(handler)))
            .collect()
    }

    /// Built-in aliases merged with the aliases every handler declares.
    ///
    /// Earlier registrations win on conflicting keys.
    #[must_use]
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::with_defaults();
        for handler in self.read().iter() {
            for (from, to) in &handler.mime_aliases {
                table.insert_if_absent(from, to);
            }
        }
        table
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Checks if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> Handler {
        Handler::new("images", "Images", "viewer-images")
            .with_group("media")
            .with_mimes(["image/png", "image/jpeg"])
    }

    fn videos() -> Handler {
        Handler::new("videos", "Videos", "viewer-videos")
            .with_group("media")
            .with_mimes(["video/*"])
            .with_alias("video/x-matroska", "video/webm")
    }

    #[test]
    fn register_adds_handler() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.register(images()), Ok(Registration::Added));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("images").map(|h| h.tagname.clone()),
            Some("viewer-images".to_string())
        );
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let registry = HandlerRegistry::new();
        registry.register(images()).expect("first registration");
        let second = Handler::new("images", "Other", "other-images").with_mimes(["*"]);
        assert_eq!(
            registry.register(second),
            Ok(Registration::AlreadyRegistered)
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("images").map(|h| h.display_name.clone()),
            Some("Images".to_string())
        );
    }

    #[test]
    fn invalid_tag_name_leaves_registry_untouched() {
        let registry = HandlerRegistry::new();
        let bad = Handler::new("bad", "Bad", "Bad_Name").with_mimes(["*"]);
        let err = registry.register(bad).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTagName { .. }));
        assert!(registry.get("bad").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn find_for_returns_only_enabled_handlers() {
        let registry = HandlerRegistry::new();
        registry.register(images()).expect("images");
        registry.register(videos()).expect("videos");

        let clip = FileRecord::new(1, "/clip.mp4", "video/mp4");
        let found = registry.find_for(std::slice::from_ref(&clip), None);
        assert_eq!(found.as_ref().map(|h| h.id.as_str()), Some("videos"));
        assert!(found.is_some_and(|h| h.is_enabled(&[clip])));

        let doc = FileRecord::new(2, "/doc.pdf", "application/pdf");
        assert!(registry.find_for(&[doc], None).is_none());
    }

    #[test]
    fn find_for_prefers_first_registered() {
        let registry = HandlerRegistry::new();
        registry
            .register(Handler::new("first", "First", "first-view").with_mimes(["image/*"]))
            .expect("first");
        registry
            .register(Handler::new("second", "Second", "second-view").with_mimes(["image/*"]))
            .expect("second");

        let png = FileRecord::new(1, "/a.png", "image/png");
        assert_eq!(
            registry.find_for(&[png], None).map(|h| h.id.clone()),
            Some("first".to_string())
        );
    }

    #[test]
    fn find_for_filters_by_group() {
        let registry = HandlerRegistry::new();
        registry
            .register(Handler::new("plain", "Plain", "plain-view").with_mimes(["image/*"]))
            .expect("plain");
        registry.register(images()).expect("images");

        let png = FileRecord::new(1, "/a.png", "image/png");
        assert_eq!(
            registry
                .find_for(std::slice::from_ref(&png), Some("media"))
                .map(|h| h.id.clone()),
            Some("images".to_string())
        );
        assert!(registry.find_for(&[png], Some("office")).is_none());
    }

    #[test]
    fn alias_table_includes_handler_aliases() {
        let registry = HandlerRegistry::new();
        registry.register(videos()).expect("videos");
        let table = registry.alias_table();
        assert_eq!(table.canonical("video/x-matroska"), Some("video/webm"));
    }

    #[test]
    fn by_id_exposes_every_handler() {
        let registry = HandlerRegistry::new();
        registry.register(images()).expect("images");
        registry.register(videos()).expect("videos");
        let map = registry.by_id();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("videos"));
    }
}
