// SPDX-License-Identifier: MPL-2.0
//! Viewer session façade.
//!
//! [`ViewerSession`] ties the handler registry, the navigation controller and
//! the media source resolver together behind the four entry points a host
//! needs: [`open`](ViewerSession::open),
//! [`open_folder`](ViewerSession::open_folder),
//! [`compare`](ViewerSession::compare) and [`close`](ViewerSession::close),
//! plus [`next`](ViewerSession::next)/[`prev`](ViewerSession::prev).
//!
//! State lives behind a single mutex that is never held across an `.await`
//! nor while host hooks run, so hooks may query the session.

use crate::application::mime::{AliasTable, MimeResolver};
use crate::application::navigation::{
    LoadTicket, NavigationController, NavigationInfo, NavigationOptions, NextStep,
};
use crate::application::port::{
    dispatch, CollaboratorError, FileInfoSource, LoadMore, MediaTransport, NavigationEvent,
    NavigationHooks, NoMoreFiles, NoopHooks, SourceProbe,
};
use crate::application::registry::HandlerRegistry;
use crate::config::Config;
use crate::domain::file::{FileId, FileList, FileRecord, FileRef};
use crate::domain::handler::Handler;
use crate::error::{Error, MediaLoadError, Result, ValidationError};
use crate::media::blob::BlobStore;
use crate::media::source::{self, CancellationToken, MediaSourceResolver, SourceConfig};
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host-provided settings for one `open`.
#[derive(Clone, Default)]
pub struct OpenOptions {
    pub load_more: Option<Arc<dyn LoadMore>>,
    pub hooks: Option<Arc<dyn NavigationHooks>>,
    /// Falls back to the session default.
    pub can_loop: Option<bool>,
    /// Restricts handler resolution to one group.
    pub group: Option<String>,
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_load_more(mut self, load_more: impl LoadMore + 'static) -> Self {
        self.load_more = Some(Arc::new(load_more));
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl NavigationHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    #[must_use]
    pub fn with_can_loop(mut self, can_loop: bool) -> Self {
        self.can_loop = Some(can_loop);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("load_more", &self.load_more.is_some())
            .field("hooks", &self.hooks.is_some())
            .field("can_loop", &self.can_loop)
            .field("group", &self.group)
            .finish()
    }
}

/// Outcome of resolving the active file's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Ready(String),
    /// Recorded as the file's error; navigation keeps working.
    Failed(MediaLoadError),
    /// The active file changed while the request was in flight.
    Superseded,
}

struct SessionState {
    controller: NavigationController,
    active_handler: Option<Arc<Handler>>,
    /// Explicit handler chosen by the host for the whole session.
    pinned_handler: Option<Arc<Handler>>,
    group: Option<String>,
    cancel: CancellationToken,
    media_errors: HashMap<FileId, MediaLoadError>,
    /// Still image id to its live-photo video.
    companions: HashMap<FileId, FileRecord>,
    comparing: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            controller: NavigationController::new(),
            active_handler: None,
            pinned_handler: None,
            group: None,
            cancel: source::new_token(),
            media_errors: HashMap::new(),
            companions: HashMap::new(),
            comparing: false,
        }
    }

    /// Cancels requests for the outgoing file and issues a fresh token.
    fn rotate_token(&mut self) {
        source::cancel(&self.cancel);
        self.cancel = source::new_token();
    }
}

/// What `open` needs once the list and the active record are known.
struct OpenRequest {
    files: FileList,
    active: Option<FileRecord>,
    navigation: NavigationOptions,
    pinned: Option<Arc<Handler>>,
    group: Option<String>,
    companions: HashMap<FileId, FileRecord>,
    comparing: bool,
}

/// The viewer session.
pub struct ViewerSession {
    registry: Arc<HandlerRegistry>,
    file_info: Arc<dyn FileInfoSource>,
    sources: MediaSourceResolver,
    extra_aliases: BTreeMap<String, String>,
    default_can_loop: bool,
    state: Mutex<SessionState>,
}

impl fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerSession")
            .field("handlers", &self.registry.len())
            .field("sources", &self.sources)
            .field("default_can_loop", &self.default_can_loop)
            .field("navigation", &self.navigation_info())
            .finish_non_exhaustive()
    }
}

impl ViewerSession {
    #[must_use]
    pub fn new(
        registry: Arc<HandlerRegistry>,
        file_info: Arc<dyn FileInfoSource>,
        sources: MediaSourceResolver,
    ) -> Self {
        Self {
            registry,
            file_info,
            sources,
            extra_aliases: BTreeMap::new(),
            default_can_loop: true,
            state: Mutex::new(SessionState::new()),
        }
    }

    /// Builds a session from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configured base URL is unusable.
    pub fn from_config(
        config: &Config,
        registry: Arc<HandlerRegistry>,
        file_info: Arc<dyn FileInfoSource>,
        transport: Arc<dyn MediaTransport>,
    ) -> Result<Self> {
        let source_config = SourceConfig::new(
            &config.server.base_url,
            config.server.user.clone(),
            config.preview.viewport(),
        )?;
        let sources = MediaSourceResolver::new(
            source_config,
            transport,
            BlobStore::new(config.media.blob_cache_bytes()),
        );
        Ok(Self::new(registry, file_info, sources)
            .with_default_loop(config.navigation.can_loop())
            .with_aliases(config.media.mime_aliases.clone()))
    }

    /// Loop behaviour used when [`OpenOptions::can_loop`] is unset.
    #[must_use]
    pub fn with_default_loop(mut self, can_loop: bool) -> Self {
        self.default_can_loop = can_loop;
        self
    }

    /// Aliases merged over the built-in and handler-declared ones.
    #[must_use]
    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.extra_aliases = aliases;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn sources(&self) -> &MediaSourceResolver {
        &self.sources
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Opens `files` with `file` active.
    ///
    /// `handler_id` pins a handler for the whole session; otherwise the
    /// handler is resolved from the active file's mime type on every
    /// transition.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownHandler`] if `handler_id` is not registered.
    /// - [`Error::NoHandler`] if nothing can render the active file.
    /// - [`Error::Validation`] if `file` is not part of `files`, or both are empty.
    pub fn open(
        &self,
        files: Vec<FileRecord>,
        file: Option<FileRecord>,
        options: OpenOptions,
        handler_id: Option<&str>,
    ) -> Result<FileRecord> {
        let pinned = self.pinned_handler(handler_id)?;
        let navigation = self.navigation_options(&options);
        self.open_with(OpenRequest {
            files: files.into_iter().map(FileRecord::ingested).collect(),
            active: file.map(FileRecord::ingested),
            navigation,
            pinned,
            group: options.group,
            companions: HashMap::new(),
            comparing: false,
        })
    }

    /// Lists `folder` through the file-info source and opens its files.
    ///
    /// Directories are skipped, and so are the video halves of live photos
    /// whose still image is listed too. `file` is a path (or basename) inside
    /// the folder; when it is not part of the listing it is stat'ed.
    ///
    /// # Errors
    ///
    /// [`Error::FileInfo`] from the collaborator, plus everything
    /// [`ViewerSession::open`] reports.
    pub async fn open_folder(
        &self,
        folder: &str,
        file: Option<&str>,
        options: OpenOptions,
        handler_id: Option<&str>,
    ) -> Result<FileRecord> {
        let pinned = self.pinned_handler(handler_id)?;
        let listing: FileList = self
            .file_info
            .list_folder(folder)
            .await?
            .into_iter()
            .map(FileRecord::ingested)
            .filter(FileRecord::is_file)
            .collect();
        let companions = live_photo_companions(&listing);
        let files = listing.without_live_photo_companions();
        tracing::debug!("Listed {} viewable files in {folder}", files.len());

        let active = match file {
            Some(path) => Some(self.locate_in_folder(&files, path).await?),
            None => None,
        };

        let navigation = self.navigation_options(&options);
        self.open_with(OpenRequest {
            files,
            active,
            navigation,
            pinned,
            group: options.group,
            companions,
            comparing: false,
        })
    }

    /// Opens a two-item, non-looping, non-paginating session with `a` active.
    ///
    /// # Errors
    ///
    /// See [`ViewerSession::open`].
    pub fn compare(
        &self,
        a: FileRecord,
        b: FileRecord,
        handler_id: Option<&str>,
    ) -> Result<FileRecord> {
        let pinned = self.pinned_handler(handler_id)?;
        let a = a.ingested();
        let b = b.ingested();
        self.open_with(OpenRequest {
            files: FileList::from(vec![a.clone(), b]),
            active: Some(a),
            navigation: NavigationOptions {
                can_loop: false,
                load_more: Some(Arc::new(NoMoreFiles)),
                hooks: Arc::new(NoopHooks),
            },
            pinned,
            group: None,
            companions: HashMap::new(),
            comparing: true,
        })
    }

    /// Closes the session: cancels pending source requests, revokes blob URLs
    /// and notifies `on_close` once. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let (hooks, event) = {
            let mut state = self.lock();
            let Some(event) = state.controller.apply_close() else {
                return false;
            };
            state.rotate_token();
            state.active_handler = None;
            state.pinned_handler = None;
            state.group = None;
            state.media_errors.clear();
            state.companions.clear();
            state.comparing = false;
            (state.controller.hooks(), event)
        };
        self.sources.clear_blobs();
        tracing::info!("Viewer closed");
        dispatch(hooks.as_ref(), &event);
        true
    }

    /// Moves to the next file, loading more records at the end of the list.
    ///
    /// Returns the new active record, or `None` for a boundary no-op or a
    /// closed session.
    ///
    /// # Errors
    ///
    /// [`Error::NavigationInProgress`] while another `next()` is paginating.
    pub async fn next(&self) -> Result<Option<FileRecord>> {
        let pending = {
            let mut state = self.lock();
            match state.controller.begin_next()? {
                NextStep::Done(event) => {
                    let hooks = self.after_transition(&mut state, event.as_ref());
                    drop(state);
                    return Ok(deliver(hooks.as_ref(), event));
                }
                NextStep::Load(pending) => pending,
            }
        };

        let guard = PendingLoadGuard {
            session: self,
            ticket: Some(pending.ticket),
        };
        let outcome = pending.loader.load_more().await;
        let (hooks, event) = guard.finish(outcome)?;
        Ok(deliver(hooks.as_ref(), event))
    }

    /// Moves to the previous file.
    ///
    /// # Errors
    ///
    /// [`Error::NavigationInProgress`] while `next()` is paginating.
    pub fn prev(&self) -> Result<Option<FileRecord>> {
        let (hooks, event) = {
            let mut state = self.lock();
            let event = state.controller.apply_prev()?;
            let hooks = self.after_transition(&mut state, event.as_ref());
            (hooks, event)
        };
        Ok(deliver(hooks.as_ref(), event))
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Resolves (and caches) the active file's source URL.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`] when nothing is open. Media failures are
    /// reported as [`SourceState::Failed`], not as errors.
    pub async fn resolve_active_source(&self) -> Result<SourceState> {
        let (file, token) = self.active_request()?;
        if let Some(source) = &file.source {
            return Ok(SourceState::Ready(source.clone()));
        }
        let outcome = self.sources.resolve(&file, &token).await;
        Ok(self.settle(&file, &token, outcome))
    }

    /// Resolves the active file and, for streamed media, verifies it plays
    /// with `probe`, falling back once to a manual fetch.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`] when nothing is open.
    pub async fn load_active_media(&self, probe: &dyn SourceProbe) -> Result<SourceState> {
        let (file, token) = self.active_request()?;
        if !file.media_type().is_streamed() {
            if let Some(source) = &file.source {
                return Ok(SourceState::Ready(source.clone()));
            }
            let outcome = self.sources.resolve(&file, &token).await;
            return Ok(self.settle(&file, &token, outcome));
        }
        let outcome = self.sources.load_streamed(&file, probe, &token).await;
        Ok(self.settle(&file, &token, outcome))
    }

    /// Error recorded for `fileid` by a failed source resolution.
    #[must_use]
    pub fn media_error(&self, fileid: FileId) -> Option<MediaLoadError> {
        self.lock().media_errors.get(&fileid).cloned()
    }

    /// Runs the `preload` of the handlers that will render the next and
    /// previous files. Returns how many preloads ran.
    pub async fn preload_neighbours(&self) -> usize {
        let jobs: Vec<_> = {
            let state = self.lock();
            let neighbours = [
                state.controller.peek_next().cloned(),
                state.controller.peek_previous().cloned(),
            ];
            let active_id = state.controller.current().map(|file| file.fileid);
            let mut seen = Vec::new();
            neighbours
                .into_iter()
                .flatten()
                .filter(|file| Some(file.fileid) != active_id)
                .filter(|file| {
                    let fresh = !seen.contains(&file.fileid);
                    seen.push(file.fileid);
                    fresh
                })
                .filter_map(|file| {
                    let handler = self
                        .handler_for(&file, state.pinned_handler.as_ref(), state.group.as_deref())
                        .ok()?;
                    let preload = handler.preload.clone()?;
                    Some(preload(file))
                })
                .collect()
        };
        let count = jobs.len();
        join_all(jobs).await;
        count
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn current(&self) -> Option<FileRecord> {
        self.lock().controller.current().cloned()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.lock().controller.current_index()
    }

    /// Snapshot of the open list.
    #[must_use]
    pub fn files(&self) -> FileList {
        self.lock().controller.files().clone()
    }

    #[must_use]
    pub fn active_handler(&self) -> Option<Arc<Handler>> {
        self.lock().active_handler.clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().controller.is_open()
    }

    #[must_use]
    pub fn is_comparing(&self) -> bool {
        self.lock().comparing
    }

    #[must_use]
    pub fn navigation_info(&self) -> NavigationInfo {
        self.lock().controller.navigation_info()
    }

    /// The live-photo video paired with the active still image, if listed.
    #[must_use]
    pub fn live_photo_companion(&self) -> Option<FileRecord> {
        let state = self.lock();
        let active = state.controller.current()?;
        state.companions.get(&active.fileid).cloned()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn pinned_handler(&self, handler_id: Option<&str>) -> Result<Option<Arc<Handler>>> {
        handler_id
            .map(|id| {
                self.registry
                    .get(id)
                    .ok_or_else(|| Error::UnknownHandler(id.to_string()))
            })
            .transpose()
    }

    fn navigation_options(&self, options: &OpenOptions) -> NavigationOptions {
        NavigationOptions {
            can_loop: options.can_loop.unwrap_or(self.default_can_loop),
            load_more: options.load_more.clone(),
            hooks: options
                .hooks
                .clone()
                .unwrap_or_else(|| Arc::new(NoopHooks)),
        }
    }

    fn alias_table(&self) -> AliasTable {
        let mut table = self.registry.alias_table();
        table.extend(&self.extra_aliases);
        table
    }

    /// Pinned handler, else mime resolution (one alias hop), else the first
    /// enabled handler, else the generic fallback.
    fn handler_for(
        &self,
        file: &FileRecord,
        pinned: Option<&Arc<Handler>>,
        group: Option<&str>,
    ) -> Result<Arc<Handler>> {
        if let Some(handler) = pinned {
            return Ok(Arc::clone(handler));
        }

        let candidates: Vec<Arc<Handler>> = self
            .registry
            .handlers()
            .into_iter()
            .filter(|handler| group.is_none_or(|group| handler.group.as_deref() == Some(group)))
            .collect();
        if let Some(handler) = MimeResolver::resolve(&file.mime, &self.alias_table(), &candidates)
            .and_then(|id| self.registry.get(&id))
        {
            return Ok(handler);
        }

        self.registry
            .find_for(std::slice::from_ref(file), group)
            .or_else(|| self.registry.wildcard())
            .ok_or_else(|| Error::NoHandler {
                mime: file.mime.clone(),
            })
    }

    async fn locate_in_folder(&self, files: &FileList, path: &str) -> Result<FileRecord> {
        if let Some(found) = files.find(FileRef::Name(path)) {
            return Ok(found.clone());
        }
        let basename = path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(path);
        if let Some(found) = files.iter().find(|file| file.basename == basename) {
            return Ok(found.clone());
        }
        tracing::debug!("{path} is not in the listing, asking for its metadata");
        Ok(self.file_info.stat(path).await?.ingested())
    }

    fn open_with(&self, request: OpenRequest) -> Result<FileRecord> {
        let target = request
            .active
            .as_ref()
            .or_else(|| request.files.first())
            .ok_or(ValidationError::EmptySession)?;
        let handler = self.handler_for(target, request.pinned.as_ref(), request.group.as_deref())?;

        let (hooks, event) = {
            let mut state = self.lock();
            let event = state
                .controller
                .apply_open(request.files, request.active, request.navigation)?;
            state.rotate_token();
            state.active_handler = Some(Arc::clone(&handler));
            state.pinned_handler = request.pinned;
            state.group = request.group;
            state.media_errors.clear();
            state.companions = request.companions;
            state.comparing = request.comparing;
            (state.controller.hooks(), event)
        };
        self.sources.clear_blobs();

        let file = event.file().cloned().ok_or(Error::SessionClosed)?;
        tracing::info!(
            "Viewer opened {} with handler '{}'",
            file.filename,
            handler.id
        );
        dispatch(hooks.as_ref(), &event);
        Ok(file)
    }

    /// Post-transition bookkeeping, run under the lock.
    fn after_transition(
        &self,
        state: &mut SessionState,
        event: Option<&NavigationEvent>,
    ) -> Arc<dyn NavigationHooks> {
        if let Some(file) = event.and_then(NavigationEvent::file) {
            state.rotate_token();
            state.active_handler =
                match self.handler_for(file, state.pinned_handler.as_ref(), state.group.as_deref()) {
                    Ok(handler) => Some(handler),
                    Err(err) => {
                        tracing::warn!("No handler for {}: {err}", file.filename);
                        None
                    }
                };
        }
        state.controller.hooks()
    }

    fn active_request(&self) -> Result<(FileRecord, CancellationToken)> {
        let state = self.lock();
        let file = state
            .controller
            .current()
            .cloned()
            .ok_or(Error::SessionClosed)?;
        Ok((file, Arc::clone(&state.cancel)))
    }

    /// Applies a source outcome unless the file is no longer active.
    fn settle(
        &self,
        file: &FileRecord,
        token: &CancellationToken,
        outcome: std::result::Result<String, MediaLoadError>,
    ) -> SourceState {
        let mut state = self.lock();
        let still_active = !source::is_cancelled(token)
            && state.controller.current().map(|f| f.fileid) == Some(file.fileid);
        if !still_active {
            tracing::debug!("Dropping stale source for {}", file.filename);
            return SourceState::Superseded;
        }
        match outcome {
            Ok(url) => {
                state.media_errors.remove(&file.fileid);
                state.controller.set_source(file.fileid, url.clone());
                SourceState::Ready(url)
            }
            Err(MediaLoadError::Cancelled) => SourceState::Superseded,
            Err(err) => {
                tracing::warn!("Failed to load {}: {err}", file.filename);
                state.media_errors.insert(file.fileid, err.clone());
                SourceState::Failed(err)
            }
        }
    }
}

fn deliver(hooks: &dyn NavigationHooks, event: Option<NavigationEvent>) -> Option<FileRecord> {
    let event = event?;
    dispatch(hooks, &event);
    event.file().cloned()
}

/// Maps each listed still image to its listed live-photo video.
fn live_photo_companions(listing: &FileList) -> HashMap<FileId, FileRecord> {
    listing
        .iter()
        .filter(|file| !file.media_type().is_streamed())
        .filter_map(|image| {
            let video = listing.find(FileRef::Id(image.metadata_files_live_photo?))?;
            Some((image.fileid, video.clone()))
        })
        .collect()
}

/// Returns the controller to `Open` if `next()` is dropped mid-pagination.
struct PendingLoadGuard<'a> {
    session: &'a ViewerSession,
    ticket: Option<LoadTicket>,
}

impl PendingLoadGuard<'_> {
    fn finish(
        mut self,
        outcome: std::result::Result<Vec<FileRecord>, CollaboratorError>,
    ) -> Result<(Arc<dyn NavigationHooks>, Option<NavigationEvent>)> {
        let Some(ticket) = self.ticket.take() else {
            return Ok((Arc::new(NoopHooks), None));
        };
        let mut state = self.session.lock();
        let event = state.controller.complete_next(ticket, outcome)?;
        let hooks = self.session.after_transition(&mut state, event.as_ref());
        Ok((hooks, event))
    }
}

impl Drop for PendingLoadGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.session.lock().controller.abandon_load(ticket);
        }
    }
}
