// SPDX-License-Identifier: MPL-2.0
//! Navigation state machine over an open file list.
//!
//! The controller owns the ordered [`FileList`], the active index, the loop
//! flag and the pagination bookkeeping:
//!
//! ```text
//! Closed --open--> Open --next at end, more available--> LoadingMore
//!   ^               |  ^                                      |
//!   +----close------+  +------records appended / exhausted----+
//! ```
//!
//! Every transition is available in two flavours. The `apply_*` /
//! [`begin_next`](NavigationController::begin_next) /
//! [`complete_next`](NavigationController::complete_next) methods mutate
//! state and hand back the [`NavigationEvent`] to deliver, so a caller
//! holding a lock can release it before running host hooks. The plain
//! [`open`](NavigationController::open), [`next`](NavigationController::next),
//! [`prev`](NavigationController::prev) and
//! [`close`](NavigationController::close) methods do both steps at once.

use crate::application::port::{dispatch, CollaboratorError, LoadMore, NavigationEvent, NavigationHooks, NoopHooks};
use crate::domain::file::{FileId, FileList, FileRecord, FileRef};
use crate::error::{Error, Result, ValidationError};
use std::fmt;
use std::sync::Arc;

/// Navigation state information for UI rendering.
///
/// A read-only snapshot; `has_next`/`has_previous` account for looping and
/// pending pagination while `at_first`/`at_last` describe the raw position.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationInfo {
    pub has_next: bool,
    pub has_previous: bool,
    pub at_first: bool,
    pub at_last: bool,
    /// Current position in the list (0-indexed), `None` when closed.
    pub current_index: Option<usize>,
    pub total_count: usize,
    pub can_loop: bool,
    /// Pagination reported that no more records exist.
    pub exhausted: bool,
}

/// Coarse state of the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NavigationState {
    #[default]
    Closed,
    Open,
    /// `next()` hit the end of the list and pagination is in flight.
    LoadingMore,
}

/// Per-open settings.
#[derive(Clone)]
pub struct NavigationOptions {
    pub can_loop: bool,
    /// `None` means the list is complete from the start.
    pub load_more: Option<Arc<dyn LoadMore>>,
    pub hooks: Arc<dyn NavigationHooks>,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            can_loop: true,
            load_more: None,
            hooks: Arc::new(NoopHooks),
        }
    }
}

impl fmt::Debug for NavigationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationOptions")
            .field("can_loop", &self.can_loop)
            .field("load_more", &self.load_more.is_some())
            .finish_non_exhaustive()
    }
}

/// Identifies one pagination round-trip.
///
/// A ticket from before a `close()`/`open()` no longer matches and its result
/// is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Pagination the caller must run before calling
/// [`NavigationController::complete_next`].
pub struct PendingLoad {
    pub loader: Arc<dyn LoadMore>,
    pub ticket: LoadTicket,
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Result of [`NavigationController::begin_next`].
#[derive(Debug)]
pub enum NextStep {
    /// The transition completed synchronously. `None` means boundary no-op.
    Done(Option<NavigationEvent>),
    Load(PendingLoad),
}

/// Owns the open list and the active index.
pub struct NavigationController {
    files: FileList,
    index: usize,
    can_loop: bool,
    exhausted: bool,
    state: NavigationState,
    generation: u64,
    hooks: Arc<dyn NavigationHooks>,
    load_more: Option<Arc<dyn LoadMore>>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("files", &self.files.len())
            .field("index", &self.index)
            .field("can_loop", &self.can_loop)
            .field("exhausted", &self.exhausted)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl NavigationController {
    /// Creates a closed controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: FileList::new(),
            index: 0,
            can_loop: true,
            exhausted: false,
            state: NavigationState::Closed,
            generation: 0,
            hooks: Arc::new(NoopHooks),
            load_more: None,
        }
    }

    // =========================================================================
    // Transitions (state only)
    // =========================================================================

    /// Replaces the open list and selects `active`.
    ///
    /// With an empty `files`, `active` becomes the sole element. Reopening an
    /// open controller discards any pagination in flight.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ActiveFileNotInList`] if `active` cannot be
    ///   located (see [`FileList::locate`]).
    /// - [`ValidationError::EmptySession`] if both `files` and `active` are empty.
    ///
    /// State is untouched on error.
    pub fn apply_open(
        &mut self,
        files: FileList,
        active: Option<FileRecord>,
        options: NavigationOptions,
    ) -> Result<NavigationEvent> {
        let (files, index) = match (files.is_empty(), active) {
            (true, Some(active)) => (FileList::from(vec![active]), 0),
            (true, None) => return Err(ValidationError::EmptySession.into()),
            (false, Some(active)) => {
                let index = files.locate(&active).ok_or_else(|| {
                    ValidationError::ActiveFileNotInList {
                        needle: active.filename.clone(),
                    }
                })?;
                (files, index)
            }
            (false, None) => (files, 0),
        };

        self.generation = self.generation.wrapping_add(1);
        self.files = files;
        self.index = index;
        self.can_loop = options.can_loop;
        self.exhausted = options.load_more.is_none();
        self.load_more = options.load_more;
        self.hooks = options.hooks;
        self.state = NavigationState::Open;

        tracing::debug!(
            "Navigation opened at {}/{} (loop: {})",
            self.index + 1,
            self.files.len(),
            self.can_loop
        );
        Ok(NavigationEvent::Opened(self.active_record()?))
    }

    /// Steps backwards. Pagination is never triggered from this direction.
    ///
    /// Returns `Ok(None)` at the first item without looping, on a single-item
    /// list, and when the controller is closed.
    ///
    /// # Errors
    ///
    /// [`Error::NavigationInProgress`] while pagination is pending.
    pub fn apply_prev(&mut self) -> Result<Option<NavigationEvent>> {
        match self.state {
            NavigationState::Closed => return Ok(None),
            NavigationState::LoadingMore => return Err(Error::NavigationInProgress),
            NavigationState::Open => {}
        }

        let Some(target) = self.previous_index() else {
            tracing::debug!("Navigation prev is a no-op at index {}", self.index);
            return Ok(None);
        };
        self.index = target;
        tracing::debug!("Navigation moved back to index {}", self.index);
        Ok(Some(NavigationEvent::Previous(self.active_record()?)))
    }

    /// Starts a forward step.
    ///
    /// At the end of a list that is not yet exhausted the controller enters
    /// `LoadingMore` and returns the loader to run; otherwise the step is
    /// applied immediately.
    ///
    /// # Errors
    ///
    /// [`Error::NavigationInProgress`] while pagination is pending.
    pub fn begin_next(&mut self) -> Result<NextStep> {
        match self.state {
            NavigationState::Closed => return Ok(NextStep::Done(None)),
            NavigationState::LoadingMore => return Err(Error::NavigationInProgress),
            NavigationState::Open => {}
        }

        if self.index + 1 < self.files.len() {
            self.index += 1;
            tracing::debug!("Navigation moved forward to index {}", self.index);
            return Ok(NextStep::Done(Some(NavigationEvent::Next(
                self.active_record()?,
            ))));
        }

        if !self.exhausted {
            if let Some(loader) = self.load_more.clone() {
                self.state = NavigationState::LoadingMore;
                tracing::debug!("Navigation reached the end, loading more records");
                return Ok(NextStep::Load(PendingLoad {
                    loader,
                    ticket: LoadTicket {
                        generation: self.generation,
                    },
                }));
            }
        }

        Ok(NextStep::Done(self.wrap_forward()?))
    }

    /// Applies the pagination outcome of a [`PendingLoad`].
    ///
    /// New records are appended and the first of them becomes active. An
    /// empty page marks the list exhausted; a failure is logged and leaves
    /// the boundary eligible for another fetch. In both cases the regular
    /// loop/no-op rule then applies. A stale `ticket` is ignored.
    pub fn complete_next(
        &mut self,
        ticket: LoadTicket,
        outcome: std::result::Result<Vec<FileRecord>, CollaboratorError>,
    ) -> Result<Option<NavigationEvent>> {
        if !self.owns(ticket) {
            tracing::debug!("Discarding pagination result from a previous session");
            return Ok(None);
        }
        self.state = NavigationState::Open;

        match outcome {
            Ok(records) if !records.is_empty() => {
                for record in &records {
                    if self.files.contains_id(record.fileid) {
                        tracing::warn!(
                            "Pagination returned duplicate file id {} ({})",
                            record.fileid,
                            record.filename
                        );
                    }
                }
                let added = self.files.append(records);
                self.index += 1;
                tracing::debug!(
                    "Appended {added} records, moved forward to index {}",
                    self.index
                );
                Ok(Some(NavigationEvent::Next(self.active_record()?)))
            }
            Ok(_) => {
                tracing::debug!("Pagination exhausted after {} records", self.files.len());
                self.exhausted = true;
                self.wrap_forward()
            }
            Err(err) => {
                tracing::warn!("Loading more records failed: {err}");
                self.wrap_forward()
            }
        }
    }

    /// Returns to `Open` when a pending load is dropped before completion.
    pub fn abandon_load(&mut self, ticket: LoadTicket) {
        if self.owns(ticket) {
            tracing::debug!("Pending pagination abandoned");
            self.state = NavigationState::Open;
        }
    }

    /// Clears the list. Returns `None` when already closed.
    pub fn apply_close(&mut self) -> Option<NavigationEvent> {
        if self.state == NavigationState::Closed {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.files = FileList::new();
        self.index = 0;
        self.exhausted = false;
        self.load_more = None;
        self.state = NavigationState::Closed;
        tracing::debug!("Navigation closed");
        Some(NavigationEvent::Closed)
    }

    // =========================================================================
    // Transitions (state + hooks)
    // =========================================================================

    /// Opens `files` at `active` and notifies the hooks.
    ///
    /// # Errors
    ///
    /// See [`NavigationController::apply_open`].
    pub fn open(
        &mut self,
        files: FileList,
        active: Option<FileRecord>,
        options: NavigationOptions,
    ) -> Result<FileRecord> {
        let event = self.apply_open(files, active, options)?;
        dispatch(self.hooks.as_ref(), &event);
        self.active_record()
    }

    /// Steps backwards and notifies the hooks; returns the new active record.
    ///
    /// # Errors
    ///
    /// See [`NavigationController::apply_prev`].
    pub fn prev(&mut self) -> Result<Option<FileRecord>> {
        let event = self.apply_prev()?;
        Ok(self.deliver(event))
    }

    /// Steps forward, paginating if needed, and notifies the hooks.
    ///
    /// Dropping the returned future while pagination is pending returns the
    /// controller to `Open`.
    ///
    /// # Errors
    ///
    /// See [`NavigationController::begin_next`].
    pub async fn next(&mut self) -> Result<Option<FileRecord>> {
        let pending = match self.begin_next()? {
            NextStep::Done(event) => return Ok(self.deliver(event)),
            NextStep::Load(pending) => pending,
        };

        let guard = LoadGuard {
            controller: self,
            ticket: Some(pending.ticket),
        };
        let outcome = pending.loader.load_more().await;
        let event = guard.finish(outcome)?;
        Ok(self.deliver(event))
    }

    /// Clears the list and notifies the hooks. Returns `false` if already closed.
    pub fn close(&mut self) -> bool {
        match self.apply_close() {
            Some(event) => {
                dispatch(self.hooks.as_ref(), &event);
                true
            }
            None => false,
        }
    }

    fn deliver(&self, event: Option<NavigationEvent>) -> Option<FileRecord> {
        let event = event?;
        dispatch(self.hooks.as_ref(), &event);
        event.file().cloned()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state != NavigationState::Closed
    }

    /// The active record, `None` when closed.
    #[must_use]
    pub fn current(&self) -> Option<&FileRecord> {
        if self.is_open() {
            self.files.get(self.index)
        } else {
            None
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current().map(|_| self.index)
    }

    #[must_use]
    pub fn files(&self) -> &FileList {
        &self.files
    }

    #[must_use]
    pub fn can_loop(&self) -> bool {
        self.can_loop
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Hooks installed by the last `open`.
    #[must_use]
    pub fn hooks(&self) -> Arc<dyn NavigationHooks> {
        Arc::clone(&self.hooks)
    }

    /// Record `next()` would land on without pagination, WITHOUT moving.
    #[must_use]
    pub fn peek_next(&self) -> Option<&FileRecord> {
        if !self.is_open() {
            return None;
        }
        self.next_index().and_then(|index| self.files.get(index))
    }

    /// Record `prev()` would land on, WITHOUT moving.
    #[must_use]
    pub fn peek_previous(&self) -> Option<&FileRecord> {
        if !self.is_open() {
            return None;
        }
        self.previous_index().and_then(|index| self.files.get(index))
    }

    /// Returns a snapshot of the current navigation state for UI rendering.
    #[must_use]
    pub fn navigation_info(&self) -> NavigationInfo {
        if !self.is_open() {
            return NavigationInfo {
                can_loop: self.can_loop,
                ..NavigationInfo::default()
            };
        }
        let total_count = self.files.len();
        let at_last = self.index + 1 == total_count;
        let can_paginate = at_last && !self.exhausted && self.load_more.is_some();
        NavigationInfo {
            has_next: self.peek_next().is_some() || can_paginate,
            has_previous: self.peek_previous().is_some(),
            at_first: self.index == 0,
            at_last,
            current_index: Some(self.index),
            total_count,
            can_loop: self.can_loop,
            exhausted: self.exhausted,
        }
    }

    /// Caches a resolved source on the record with `fileid`.
    ///
    /// Returns `false` if the record is no longer in the list.
    pub fn set_source(&mut self, fileid: FileId, source: String) -> bool {
        let Some(index) = self.files.position_of(FileRef::Id(fileid)) else {
            return false;
        };
        match self.files.get_mut(index) {
            Some(record) => {
                record.source = Some(source);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn owns(&self, ticket: LoadTicket) -> bool {
        self.state == NavigationState::LoadingMore && ticket.generation == self.generation
    }

    fn active_record(&self) -> Result<FileRecord> {
        self.files
            .get(self.index)
            .cloned()
            .ok_or(Error::SessionClosed)
    }

    fn next_index(&self) -> Option<usize> {
        let len = self.files.len();
        if self.index + 1 < len {
            Some(self.index + 1)
        } else if self.can_loop && len > 1 {
            Some(0)
        } else {
            None
        }
    }

    fn previous_index(&self) -> Option<usize> {
        let len = self.files.len();
        if self.index > 0 {
            Some(self.index - 1)
        } else if self.can_loop && len > 1 {
            Some(len - 1)
        } else {
            None
        }
    }

    /// Boundary rule at the last index: wrap to the start or stay put.
    fn wrap_forward(&mut self) -> Result<Option<NavigationEvent>> {
        match self.next_index() {
            Some(target) => {
                self.index = target;
                tracing::debug!("Navigation wrapped to index {}", self.index);
                Ok(Some(NavigationEvent::Next(self.active_record()?)))
            }
            None => {
                tracing::debug!("Navigation next is a no-op at index {}", self.index);
                Ok(None)
            }
        }
    }
}

/// Resets `LoadingMore` if the pagination future is dropped mid-flight.
struct LoadGuard<'a> {
    controller: &'a mut NavigationController,
    ticket: Option<LoadTicket>,
}

impl LoadGuard<'_> {
    fn finish(
        mut self,
        outcome: std::result::Result<Vec<FileRecord>, CollaboratorError>,
    ) -> Result<Option<NavigationEvent>> {
        match self.ticket.take() {
            Some(ticket) => self.controller.complete_next(ticket, outcome),
            None => Ok(None),
        }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.controller.abandon_load(ticket);
        }
    }
}
