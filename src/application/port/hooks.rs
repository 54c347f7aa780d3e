// SPDX-License-Identifier: MPL-2.0
//! Host-side navigation collaborators.
//!
//! The host router observes transitions through [`NavigationHooks`] and
//! feeds pagination through [`LoadMore`]. Both are injected per session.

use crate::domain::file::FileRecord;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Error type surfaced by host callbacks; never propagated past the controller.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a host hook. Failures are logged and ignored.
pub type HookResult = Result<(), CollaboratorError>;

/// A transition that happened, delivered at most once.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    Opened(FileRecord),
    Next(FileRecord),
    Previous(FileRecord),
    Closed,
}

impl NavigationEvent {
    /// The record that became active, if any.
    #[must_use]
    pub fn file(&self) -> Option<&FileRecord> {
        match self {
            NavigationEvent::Opened(file)
            | NavigationEvent::Next(file)
            | NavigationEvent::Previous(file) => Some(file),
            NavigationEvent::Closed => None,
        }
    }
}

/// Observer for session transitions, typically the host router keeping
/// deep-link state in sync.
///
/// Hooks run after the internal state already reflects the transition and
/// outside of any session lock, so they may query the session.
pub trait NavigationHooks: Send + Sync {
    fn on_open(&self, _file: &FileRecord) -> HookResult {
        Ok(())
    }

    fn on_prev(&self, _file: &FileRecord) -> HookResult {
        Ok(())
    }

    fn on_next(&self, _file: &FileRecord) -> HookResult {
        Ok(())
    }

    fn on_close(&self) -> HookResult {
        Ok(())
    }
}

/// Hooks that ignore every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl NavigationHooks for NoopHooks {}

type FileCallback = Box<dyn Fn(&FileRecord) -> HookResult + Send + Sync>;
type CloseCallback = Box<dyn Fn() -> HookResult + Send + Sync>;

/// Closure-based hooks, each one optional.
#[derive(Default)]
pub struct CallbackHooks {
    on_open: Option<FileCallback>,
    on_prev: Option<FileCallback>,
    on_next: Option<FileCallback>,
    on_close: Option<CloseCallback>,
}

impl CallbackHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_open(mut self, f: impl Fn(&FileRecord) -> HookResult + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_prev(mut self, f: impl Fn(&FileRecord) -> HookResult + Send + Sync + 'static) -> Self {
        self.on_prev = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_next(mut self, f: impl Fn(&FileRecord) -> HookResult + Send + Sync + 'static) -> Self {
        self.on_next = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_close(mut self, f: impl Fn() -> HookResult + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for CallbackHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_prev", &self.on_prev.is_some())
            .field("on_next", &self.on_next.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl NavigationHooks for CallbackHooks {
    fn on_open(&self, file: &FileRecord) -> HookResult {
        self.on_open.as_ref().map_or(Ok(()), |f| f(file))
    }

    fn on_prev(&self, file: &FileRecord) -> HookResult {
        self.on_prev.as_ref().map_or(Ok(()), |f| f(file))
    }

    fn on_next(&self, file: &FileRecord) -> HookResult {
        self.on_next.as_ref().map_or(Ok(()), |f| f(file))
    }

    fn on_close(&self) -> HookResult {
        self.on_close.as_ref().map_or(Ok(()), |f| f())
    }
}

/// Delivers `event` to `hooks`; a failing hook is logged and otherwise ignored.
pub fn dispatch(hooks: &dyn NavigationHooks, event: &NavigationEvent) {
    let outcome = match event {
        NavigationEvent::Opened(file) => hooks.on_open(file),
        NavigationEvent::Next(file) => hooks.on_next(file),
        NavigationEvent::Previous(file) => hooks.on_prev(file),
        NavigationEvent::Closed => hooks.on_close(),
    };
    if let Err(err) = outcome {
        tracing::warn!("Navigation hook failed for {event:?}: {err}");
    }
}

// =============================================================================
// LoadMore
// =============================================================================

/// Pagination source queried when `next()` reaches the end of the list.
///
/// An empty result means the collection is exhausted.
#[async_trait]
pub trait LoadMore: Send + Sync {
    async fn load_more(&self) -> Result<Vec<FileRecord>, CollaboratorError>;
}

/// Pagination that never yields anything (ad-hoc lists, compare sessions).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMoreFiles;

#[async_trait]
impl LoadMore for NoMoreFiles {
    async fn load_more(&self) -> Result<Vec<FileRecord>, CollaboratorError> {
        Ok(Vec::new())
    }
}

type LoadMoreCallback =
    dyn Fn() -> BoxFuture<'static, Result<Vec<FileRecord>, CollaboratorError>> + Send + Sync;

/// Adapts an async closure into a [`LoadMore`].
#[derive(Clone)]
pub struct LoadMoreFn(Arc<LoadMoreCallback>);

impl LoadMoreFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Vec<FileRecord>, CollaboratorError>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for LoadMoreFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoadMoreFn")
    }
}

#[async_trait]
impl LoadMore for LoadMoreFn {
    async fn load_more(&self) -> Result<Vec<FileRecord>, CollaboratorError> {
        (self.0)().await
    }
}
