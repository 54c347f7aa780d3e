// SPDX-License-Identifier: MPL-2.0
//! Process-wide registry and session slots.
//!
//! Feature modules that cannot share a composition root register their
//! handlers here and reach the installed session through the free functions.
//! Everything below delegates to an explicitly installed [`ViewerSession`];
//! nothing is created implicitly except the empty registry.

use crate::application::registry::{HandlerRegistry, Registration};
use crate::application::session::{OpenOptions, ViewerSession};
use crate::domain::file::FileRecord;
use crate::domain::handler::Handler;
use crate::error::{Error, Result, ValidationError};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static REGISTRY: OnceLock<Arc<HandlerRegistry>> = OnceLock::new();
static SESSION: RwLock<Option<Arc<ViewerSession>>> = RwLock::new(None);

/// The shared registry, created empty on first use.
pub fn registry() -> Arc<HandlerRegistry> {
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(HandlerRegistry::new())))
}

/// Registers `handler` in the shared registry.
///
/// # Errors
///
/// Returns the violated rule when the descriptor is malformed.
pub fn register_handler(handler: Handler) -> std::result::Result<Registration, ValidationError> {
    registry().register(handler)
}

/// Registered handlers keyed by id.
pub fn get_handlers() -> HashMap<String, Arc<Handler>> {
    registry().by_id()
}

/// Installs `session` as the process-wide session, closing any previous one.
pub fn init_session(session: ViewerSession) -> Arc<ViewerSession> {
    let session = Arc::new(session);
    let previous = SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(Arc::clone(&session));
    if let Some(previous) = previous {
        tracing::debug!("Replacing the installed viewer session");
        previous.close();
    }
    session
}

/// Closes and removes the installed session. Returns `false` if none was installed.
pub fn teardown() -> bool {
    let previous = SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match previous {
        Some(session) => {
            session.close();
            true
        }
        None => false,
    }
}

/// The installed session.
///
/// # Errors
///
/// [`Error::NotInitialized`] if [`init_session`] has not run.
pub fn session() -> Result<Arc<ViewerSession>> {
    SESSION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(Error::NotInitialized)
}

/// See [`ViewerSession::open`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session, otherwise as the method.
pub fn open(
    files: Vec<FileRecord>,
    file: Option<FileRecord>,
    options: OpenOptions,
    handler_id: Option<&str>,
) -> Result<FileRecord> {
    session()?.open(files, file, options, handler_id)
}

/// See [`ViewerSession::open_folder`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session, otherwise as the method.
pub async fn open_folder(
    folder: &str,
    file: Option<&str>,
    options: OpenOptions,
    handler_id: Option<&str>,
) -> Result<FileRecord> {
    session()?.open_folder(folder, file, options, handler_id).await
}

/// See [`ViewerSession::compare`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session, otherwise as the method.
pub fn compare(a: FileRecord, b: FileRecord, handler_id: Option<&str>) -> Result<FileRecord> {
    session()?.compare(a, b, handler_id)
}

/// See [`ViewerSession::close`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session.
pub fn close() -> Result<bool> {
    Ok(session()?.close())
}

/// See [`ViewerSession::next`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session, otherwise as the method.
pub async fn next() -> Result<Option<FileRecord>> {
    session()?.next().await
}

/// See [`ViewerSession::prev`].
///
/// # Errors
///
/// [`Error::NotInitialized`] without a session, otherwise as the method.
pub fn prev() -> Result<Option<FileRecord>> {
    session()?.prev()
}
