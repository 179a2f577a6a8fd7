//! Game-server directory: upstream fetch and in-memory cache.
//!
//! The control panel's server picker is filled from a public directory
//! service that publishes a JSON array of servers.  The bridge fetches it at
//! startup and on demand (`POST /api/refresh-servers`) and serves the cached
//! copy from `GET /api/servers`.
//!
//! The relay core never reads this cache; it only sees the `host:port` string
//! the control panel submits with a start request.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::application::{parse_directory, ControlError};
use crate::domain::GameServerDescriptor;

/// Why a directory fetch failed.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The HTTP request failed, timed out, or returned a non-success status.
    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The directory answered with a body that is not a server list.
    #[error(transparent)]
    Decode(#[from] ControlError),
}

/// Something that can produce the current list of game servers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<GameServerDescriptor>, DirectoryError>;
}

// ── HTTP source ───────────────────────────────────────────────────────────────

/// Fetches the directory with one `GET` to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpDirectorySource {
    client: reqwest::Client,
    url: String,
}

impl HttpDirectorySource {
    /// Creates a source for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Request`] if the HTTP client cannot be built
    /// (e.g. no TLS backend available).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn fetch(&self) -> Result<Vec<GameServerDescriptor>, DirectoryError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(parse_directory(&body)?)
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────────

/// The cached server list plus the source that refreshes it.
pub struct ServerDirectory {
    source: Box<dyn DirectorySource>,
    servers: RwLock<Vec<GameServerDescriptor>>,
}

impl ServerDirectory {
    /// An empty directory; call [`refresh`](Self::refresh) to populate it.
    pub fn new(source: Box<dyn DirectorySource>) -> Self {
        Self {
            source,
            servers: RwLock::new(Vec::new()),
        }
    }

    /// Re-fetches the list.
    ///
    /// On success the cache is replaced wholesale and the number of entries
    /// is returned.  On failure the previous list stays in place.
    pub async fn refresh(&self) -> Result<usize, DirectoryError> {
        match self.source.fetch().await {
            Ok(fresh) => {
                let count = fresh.len();
                *self.servers.write().await = fresh;
                info!("server directory refreshed: {count} server(s)");
                Ok(count)
            }
            Err(e) => {
                warn!("server directory refresh failed, keeping cached list: {e}");
                Err(e)
            }
        }
    }

    /// Snapshot of the cached list.
    pub async fn servers(&self) -> Vec<GameServerDescriptor> {
        self.servers.read().await.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
