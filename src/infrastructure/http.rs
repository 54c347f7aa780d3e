// SPDX-License-Identifier: MPL-2.0
//! Authenticated HTTP transport backed by `reqwest`.

use crate::application::port::{FetchedBytes, MediaTransport};
use crate::config::defaults::MAX_REDIRECTS;
use crate::config::ServerConfig;
use crate::error::{Error, MediaLoadError, Result};
use crate::media::blob::MAX_BLOB_CACHE_BYTES;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::fmt;

/// How requests authenticate against the server.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Anonymous,
    Bearer(String),
    Basic { user: String, password: String },
}

impl Credentials {
    /// Bearer token wins over a password; neither means anonymous.
    #[must_use]
    pub fn from_server(server: &ServerConfig) -> Self {
        match (&server.token, &server.password) {
            (Some(token), _) if !token.is_empty() => Credentials::Bearer(token.clone()),
            (_, Some(password)) => Credentials::Basic {
                user: server.user.clone(),
                password: password.clone(),
            },
            _ => Credentials::Anonymous,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// [`MediaTransport`] that performs GET requests with the session credentials.
///
/// Bodies are capped at `max_body_bytes`, the blob store's upper budget by
/// default, since fetched bytes end up there.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    credentials: Credentials,
    max_body_bytes: usize,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            credentials,
            max_body_bytes: MAX_BLOB_CACHE_BYTES,
        })
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        Self::new(server.user_agent(), Credentials::from_server(server))
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.credentials {
            Credentials::Anonymous => request,
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic { user, password } => request.basic_auth(user, Some(password)),
        }
    }
}

#[async_trait]
impl MediaTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedBytes, MediaLoadError> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| MediaLoadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {url} answered {status}");
            return Err(MediaLoadError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let declared = response.content_length();
        if let Some(len) = declared {
            tracing::debug!("GET {url} declares {len} bytes");
        }
        let bytes = read_body(response.bytes_stream(), declared, self.max_body_bytes).await?;

        tracing::debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(FetchedBytes::new(content_type, bytes))
    }
}

/// Collects a body stream, failing as soon as it grows past `limit`.
///
/// `declared` is the untrusted `Content-Length`; it only sizes the first
/// allocation and never beyond `limit`.
async fn read_body<S, B, E>(
    mut stream: S,
    declared: Option<u64>,
    limit: usize,
) -> std::result::Result<Vec<u8>, MediaLoadError>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(MediaLoadError::TooLarge { limit });
    }

    let capacity = declared
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0)
        .min(limit);
    let mut bytes = Vec::with_capacity(capacity);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MediaLoadError::Transport(e.to_string()))?;
        let chunk = chunk.as_ref();
        if bytes.len() + chunk.len() > limit {
            return Err(MediaLoadError::TooLarge { limit });
        }
        bytes.extend_from_slice(chunk);
    }
    Ok(bytes)
}
