//! Streaming installer download with explicit redirect handling.
//!
//! The fetcher follows HTTP redirects itself (the underlying client has
//! redirect following disabled) so the hop count can be bounded, and it
//! guarantees that no partial file survives any failure: on every
//! non-success outcome the destination path does not exist afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use reqwest::{Client, redirect};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::user_agent;

/// Maximum redirect hops before the fetch fails.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Default HTTP connect timeout (30 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large installers).
const READ_TIMEOUT_SECS: u64 = 300;

/// A completed download: where the bytes came from and where they landed.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// The URL the fetch was started with (before any redirects).
    pub source_url: String,
    /// Final output path.
    pub destination: PathBuf,
    /// Size declared by the terminal response, when known.
    pub expected_bytes: Option<u64>,
    /// Bytes actually written to the destination.
    pub bytes_written: u64,
}

/// A chunk-arrival progress event.
///
/// Delivered over an explicit channel so a UI can render a bar and tests can
/// assert on delivery; correctness of the fetch does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Cumulative bytes received so far.
    pub bytes_received: u64,
    /// Total size declared by the server.
    pub total_bytes: u64,
}

/// Errors that can occur during an installer fetch.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The provided or redirected-to URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS, connection, TLS, mid-stream failure).
    #[error("network error downloading {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Terminal non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A redirect response arrived without a `Location` header.
    #[error("HTTP {status} from {url} carried no Location header")]
    MissingLocation {
        /// The URL that produced the redirect.
        url: String,
        /// The redirect status code.
        status: u16,
    },

    /// The redirect chain exceeded [`MAX_REDIRECT_HOPS`].
    #[error("redirect chain from {url} exceeded {hops} hops")]
    TooManyRedirects {
        /// The URL the fetch was started with.
        url: String,
        /// The hop limit that was exceeded.
        hops: usize,
    },

    /// File system error writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Streaming downloader for release installer assets.
///
/// Create once per update run. The client is built with redirect following
/// disabled; redirects are resolved in [`fetch`](Self::fetch) against an
/// explicit hop counter.
#[derive(Debug, Clone)]
pub struct InstallerFetcher {
    client: Client,
    progress: Option<UnboundedSender<DownloadProgress>>,
}

impl Default for InstallerFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallerFetcher {
    /// Creates a fetcher with default timeouts and no progress reporting.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .redirect(redirect::Policy::none())
            .user_agent(user_agent::default_update_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            progress: None,
        }
    }

    /// Attaches a progress event channel.
    ///
    /// Events are emitted only when the terminal response declares a
    /// content length. A dropped receiver is tolerated.
    #[must_use]
    pub fn with_progress(mut self, sender: UnboundedSender<DownloadProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Downloads `source_url` to `destination`, following redirects.
    ///
    /// On success the destination file holds exactly the terminal
    /// resource's bytes. On any failure the destination path does not
    /// exist (a pre-existing file at that path is removed as well, since
    /// the fetcher owns the path for the duration of the fetch).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on invalid URLs, transport failures,
    /// non-success terminal statuses, malformed or over-long redirect
    /// chains, and write failures.
    #[instrument(skip(self), fields(url = %source_url, destination = %destination.display()))]
    pub async fn fetch(
        &self,
        source_url: &str,
        destination: &Path,
    ) -> Result<DownloadTask, DownloadError> {
        let result = self.fetch_inner(source_url, destination).await;
        if result.is_err() {
            remove_partial(destination).await;
        }
        result
    }

    async fn fetch_inner(
        &self,
        source_url: &str,
        destination: &Path,
    ) -> Result<DownloadTask, DownloadError> {
        let mut current_url = Url::parse(source_url).map_err(|_| DownloadError::InvalidUrl {
            url: source_url.to_string(),
        })?;

        for hop in 0..=MAX_REDIRECT_HOPS {
            let response = self
                .client
                .get(current_url.clone())
                .send()
                .await
                .map_err(|source| DownloadError::Transport {
                    url: current_url.to_string(),
                    source,
                })?;

            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| DownloadError::MissingLocation {
                        url: current_url.to_string(),
                        status: status.as_u16(),
                    })?;

                // Location may be relative; resolve against the current URL.
                let next_url =
                    current_url
                        .join(location)
                        .map_err(|_| DownloadError::InvalidUrl {
                            url: location.to_string(),
                        })?;

                debug!(hop = hop + 1, from = %current_url, to = %next_url, "following redirect");
                current_url = next_url;
                continue;
            }

            if !status.is_success() {
                return Err(DownloadError::HttpStatus {
                    url: current_url.to_string(),
                    status: status.as_u16(),
                });
            }

            let (bytes_written, expected_bytes) =
                self.stream_to_file(response, destination).await?;
            info!(bytes = bytes_written, "installer download complete");
            return Ok(DownloadTask {
                source_url: source_url.to_string(),
                destination: destination.to_path_buf(),
                expected_bytes,
                bytes_written,
            });
        }

        Err(DownloadError::TooManyRedirects {
            url: source_url.to_string(),
            hops: MAX_REDIRECT_HOPS,
        })
    }

    /// Streams the terminal response body to the destination file.
    ///
    /// Returns the byte count written and the declared content length.
    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        destination: &Path,
    ) -> Result<(u64, Option<u64>), DownloadError> {
        let terminal_url = response.url().to_string();
        let total_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let file = File::create(destination)
            .await
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|source| DownloadError::Transport {
                url: terminal_url.clone(),
                source,
            })?;

            writer
                .write_all(&chunk)
                .await
                .map_err(|source| DownloadError::Io {
                    path: destination.to_path_buf(),
                    source,
                })?;

            bytes_written += chunk.len() as u64;
            if let Some(total) = total_bytes {
                self.emit_progress(DownloadProgress {
                    bytes_received: bytes_written,
                    total_bytes: total,
                });
            }
        }

        writer.flush().await.map_err(|source| DownloadError::Io {
            path: destination.to_path_buf(),
            source,
        })?;

        Ok((bytes_written, total_bytes))
    }

    fn emit_progress(&self, progress: DownloadProgress) {
        if let Some(sender) = &self.progress {
            // Receiver may have been dropped; progress is observational only.
            let _ = sender.send(progress);
        }
    }
}

/// Removes a partial destination file, tolerating its absence.
async fn remove_partial(destination: &Path) {
    if tokio::fs::remove_file(destination).await.is_ok() {
        warn!(path = %destination.display(), "removed partial download after failure");
    }
}
