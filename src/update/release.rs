//! Release descriptor query against the GitHub releases API.
//!
//! Fetches the "latest release" JSON document and exposes the pieces the
//! update pipeline needs: the tag version and the installer asset list.

use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::update::version::VersionTriple;
use crate::user_agent;

/// Accept header for the GitHub releases API.
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// A downloadable file attached to a published release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name (e.g. `app-Setup.exe`).
    pub name: String,
    /// Direct download URL for the asset.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// The parts of a release document the update pipeline consumes.
///
/// Extra fields in the API response are ignored by design.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDescriptor {
    /// Release tag, possibly `v`-prefixed (e.g. `v1.8.0`).
    pub tag_name: String,
    /// Attached assets in the order the API returns them.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseDescriptor {
    /// Tag parsed as a version triple (leading `v` stripped).
    #[must_use]
    pub fn version(&self) -> VersionTriple {
        VersionTriple::parse(&self.tag_name)
    }

    /// First asset whose name ends with `installer_suffix`, in API order.
    #[must_use]
    pub fn installer_asset(&self, installer_suffix: &str) -> Option<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|asset| asset.name.ends_with(installer_suffix))
    }
}

/// Errors that can occur while querying the release endpoint.
///
/// All variants are non-fatal at the top of the update pipeline: a failed
/// check is logged and skipped so the tool stays usable offline.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// Network-level failure reaching the endpoint.
    #[error("network error querying {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} querying {url}")]
    HttpStatus {
        /// The endpoint that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body did not parse as a release document.
    #[error("invalid release document from {url}: {source}")]
    Parse {
        /// The endpoint that produced the document.
        url: String,
        /// The underlying deserialization error.
        #[source]
        source: reqwest::Error,
    },
}

/// Client for the release query endpoint.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: Client,
    endpoint: String,
}

impl ReleaseClient {
    /// Creates a release client for the given endpoint URL.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Fetches and parses the latest release descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError`] on network failure, non-success status, or
    /// an unparseable body.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn latest_release(&self) -> Result<ReleaseDescriptor, ReleaseError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(USER_AGENT, user_agent::default_update_user_agent())
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|source| ReleaseError::Network {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseError::HttpStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let descriptor: ReleaseDescriptor =
            response.json().await.map_err(|source| ReleaseError::Parse {
                url: self.endpoint.clone(),
                source,
            })?;

        debug!(
            tag = %descriptor.tag_name,
            assets = descriptor.assets.len(),
            "fetched release descriptor"
        );

        Ok(descriptor)
    }
}
