// SPDX-License-Identifier: MPL-2.0
//! Media source resolution.
//!
//! Turns a [`FileRecord`] into a URL a renderer can load:
//!
//! 1. an explicit `preview_url` is returned unchanged;
//! 2. files with a server preview get a preview endpoint URL sized for the
//!    viewport, fetched manually and inlined as a data URL when the share
//!    forbids downloads;
//! 3. everything else, including streamed media whose preview is only a
//!    thumbnail, uses the raw WebDAV path.
//!
//! Streamed media (video/audio) that fails to play from its direct URL is
//! fetched manually once and served from a local blob URL. A second failure
//! is terminal.

use crate::application::port::{MediaTransport, SourceProbe};
use crate::domain::file::FileRecord;
use crate::error::{Error, MediaLoadError, Result};
use crate::media::blob::{BlobStats, BlobStore};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Cancellation token type for source requests.
pub type CancellationToken = Arc<AtomicBool>;

/// Creates a fresh, untriggered token.
#[must_use]
pub fn new_token() -> CancellationToken {
    Arc::new(AtomicBool::new(false))
}

/// Checks if the cancellation token has been triggered.
#[inline]
pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

/// Triggers the token.
#[inline]
pub fn cancel(token: &CancellationToken) {
    token.store(true, Ordering::SeqCst);
}

/// Preview content type assumed when the server does not send one.
const DEFAULT_PREVIEW_MIME: &str = "image/jpeg";

/// Screen geometry previews are sized for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Requested preview size in physical pixels: `floor(dimension × dpr)`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn target_size(&self) -> (u32, u32) {
        let ratio = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        let scale = |dimension: u32| (f64::from(dimension) * ratio).floor() as u32;
        (scale(self.width), scale(self.height))
    }
}

/// Where and as whom sources are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub base_url: Url,
    pub user: String,
    pub viewport: Viewport,
}

impl SourceConfig {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not an absolute hierarchical URL.
    pub fn new(base_url: &str, user: impl Into<String>, viewport: Viewport) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| Error::Config(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            user: user.into(),
            viewport,
        })
    }
}

/// Resolves file records to loadable URLs.
pub struct MediaSourceResolver {
    config: SourceConfig,
    transport: Arc<dyn MediaTransport>,
    blobs: Mutex<BlobStore>,
}

impl std::fmt::Debug for MediaSourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSourceResolver")
            .field("config", &self.config)
            .field("blobs", &self.blob_stats())
            .finish_non_exhaustive()
    }
}

impl MediaSourceResolver {
    #[must_use]
    pub fn new(config: SourceConfig, transport: Arc<dyn MediaTransport>, blobs: BlobStore) -> Self {
        Self {
            config,
            transport,
            blobs: Mutex::new(blobs),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn blobs(&self) -> MutexGuard<'_, BlobStore> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // URL construction
    // =========================================================================

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> std::result::Result<Url, MediaLoadError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MediaLoadError::Rejected {
                url: self.config.base_url.to_string(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Raw WebDAV URL of the file. Pure; never touches the network.
    ///
    /// # Errors
    ///
    /// Only fails if the configured base URL cannot carry a path.
    pub fn remote_url(&self, file: &FileRecord) -> std::result::Result<String, MediaLoadError> {
        let path = file.filename.split('/').filter(|segment| !segment.is_empty());
        let url = self.endpoint(
            ["remote.php", "dav", "files", self.config.user.as_str()]
                .into_iter()
                .chain(path),
        )?;
        Ok(url.into())
    }

    /// Preview endpoint URL for the file at the viewport's physical size.
    ///
    /// # Errors
    ///
    /// Only fails if the configured base URL cannot carry a path.
    pub fn preview_url(&self, file: &FileRecord) -> std::result::Result<String, MediaLoadError> {
        let (x, y) = self.config.viewport.target_size();
        let mut url = self.endpoint(["index.php", "core", "preview"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("fileId", &file.fileid.to_string())
                .append_pair("x", &x.to_string())
                .append_pair("y", &y.to_string())
                .append_pair("a", "true");
            if let Some(etag) = &file.etag {
                query.append_pair("etag", etag);
            }
        }
        Ok(url.into())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves the URL a renderer should load for `file`.
    ///
    /// # Errors
    ///
    /// Fails only on the restricted-preview path (the manual fetch failed) or
    /// with [`MediaLoadError::Cancelled`] once `cancel` is triggered.
    pub async fn resolve(
        &self,
        file: &FileRecord,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, MediaLoadError> {
        if let Some(url) = &file.preview_url {
            tracing::debug!("Using explicit preview URL for {}", file.filename);
            return Ok(url.clone());
        }

        if file.media_type().is_streamed() {
            tracing::debug!("Streaming {} from its remote path", file.filename);
            return self.remote_url(file);
        }

        if !file.has_preview {
            tracing::debug!("No preview for {}, using remote path", file.filename);
            return self.remote_url(file);
        }

        let preview = self.preview_url(file)?;
        if file.can_download() {
            return Ok(preview);
        }

        tracing::debug!(
            "Share forbids downloads, inlining preview of {}",
            file.filename
        );
        ensure_active(cancel)?;
        let fetched = self.transport.fetch(&preview).await?;
        ensure_active(cancel)?;
        let content_type = fetched
            .content_type
            .unwrap_or_else(|| DEFAULT_PREVIEW_MIME.to_string());
        Ok(format!(
            "data:{content_type};base64,{}",
            STANDARD.encode(&fetched.bytes)
        ))
    }

    /// Resolves a streamed file and verifies it plays, falling back once to a
    /// manual authenticated fetch served from a blob URL.
    ///
    /// At most two load attempts are made: the direct URL, then the blob.
    ///
    /// # Errors
    ///
    /// - [`MediaLoadError::FallbackExhausted`] when both attempts failed.
    /// - [`MediaLoadError::Cancelled`] once `cancel` is triggered.
    /// - Any error from [`MediaSourceResolver::resolve`].
    pub async fn load_streamed(
        &self,
        file: &FileRecord,
        probe: &dyn SourceProbe,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, MediaLoadError> {
        let direct = match &file.source {
            Some(source) => source.clone(),
            None => self.resolve(file, cancel).await?,
        };
        ensure_active(cancel)?;

        let direct_reason = match probe.try_load(&direct).await {
            Ok(()) => return Ok(direct),
            Err(reason) => reason,
        };
        tracing::debug!(
            "Direct load of {} failed ({direct_reason}), trying manual fetch",
            file.filename
        );
        ensure_active(cancel)?;

        let remote = self.remote_url(file)?;
        let fetched = match self.transport.fetch(&remote).await {
            Ok(fetched) => fetched,
            Err(err) => {
                return Err(MediaLoadError::FallbackExhausted {
                    direct: direct_reason,
                    fallback: err.to_string(),
                })
            }
        };
        ensure_active(cancel)?;

        let content_type = fetched.content_type.or_else(|| Some(file.mime.clone()));
        let blob_url = self.blobs().insert(content_type, fetched.bytes);
        match probe.try_load(&blob_url).await {
            Ok(()) => Ok(blob_url),
            Err(fallback) => {
                self.blobs().revoke(&blob_url);
                Err(MediaLoadError::FallbackExhausted {
                    direct: direct_reason,
                    fallback,
                })
            }
        }
    }

    // =========================================================================
    // Blob store access
    // =========================================================================

    /// Bytes behind a `blob:` URL minted by this resolver.
    #[must_use]
    pub fn blob(&self, url: &str) -> Option<crate::media::blob::Blob> {
        self.blobs().get(url)
    }

    /// Revokes every blob URL.
    pub fn clear_blobs(&self) {
        self.blobs().clear();
    }

    #[must_use]
    pub fn blob_stats(&self) -> BlobStats {
        self.blobs().stats()
    }
}

fn ensure_active(cancel: &CancellationToken) -> std::result::Result<(), MediaLoadError> {
    if is_cancelled(cancel) {
        Err(MediaLoadError::Cancelled)
    } else {
        Ok(())
    }
}
