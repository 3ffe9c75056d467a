//! Self-update pipeline: version gate, release query, installer fetch.
//!
//! The pipeline runs as a short-circuiting preamble before normal
//! operation. A release-query failure is logged and skipped (the tool must
//! stay usable offline); a newer release triggers exactly one installer
//! fetch, after which the caller hands off to [`launcher::launch`] and the
//! process exits.

pub mod fetcher;
pub mod launcher;
pub mod release;
pub mod version;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

pub use fetcher::{
    DownloadError, DownloadProgress, DownloadTask, InstallerFetcher, MAX_REDIRECT_HOPS,
};
pub use launcher::{LaunchError, detached_command, launch};
pub use release::{ReleaseAsset, ReleaseClient, ReleaseDescriptor, ReleaseError};
pub use version::{VersionTriple, is_newer};

/// Configuration for the update pipeline.
///
/// All values arrive from the caller (environment / Cargo metadata at the
/// binary boundary); nothing here is a pipeline-level literal.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Release query endpoint (GitHub "latest release" API URL).
    pub endpoint: String,
    /// Version currently running, as a dotted string.
    pub current_version: String,
    /// Suffix identifying the installer asset (e.g. `.exe`).
    pub installer_suffix: String,
}

/// Outcome of one update check.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The running version is current; continue normal operation.
    UpToDate,
    /// A newer installer was downloaded; the caller must hand off to it.
    InstallerReady(PathBuf),
    /// The release query failed; the check was skipped.
    CheckSkipped,
}

/// Errors fatal to the update flow (the host process continues).
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The release carries no asset matching the installer predicate.
    #[error("release {tag} has no installer asset matching '{suffix}'")]
    NoInstallerAsset {
        /// The offending release tag.
        tag: String,
        /// The suffix that was searched for.
        suffix: String,
    },

    /// The installer download failed (no partial file remains).
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Runs the update check and, when a newer release exists, fetches its
/// installer into `staging_dir`.
///
/// Query failures are demoted to a warning and [`UpdateOutcome::CheckSkipped`]
/// here, at the top of the pipeline; everything past the version gate is a
/// hard [`UpdateError`] for the update flow.
///
/// # Errors
///
/// Returns [`UpdateError`] when a newer release has no installer asset or
/// the installer download fails.
#[instrument(skip(progress), fields(current = %config.current_version))]
pub async fn run_update_check(
    config: &ReleaseConfig,
    staging_dir: &Path,
    progress: Option<UnboundedSender<DownloadProgress>>,
) -> Result<UpdateOutcome, UpdateError> {
    let client = ReleaseClient::new(&config.endpoint);
    let descriptor = match client.latest_release().await {
        Ok(descriptor) => descriptor,
        Err(error) => {
            warn!(error = %error, "update check failed, continuing without update");
            return Ok(UpdateOutcome::CheckSkipped);
        }
    };

    let latest = descriptor.version();
    if !is_newer(&descriptor.tag_name, &config.current_version) {
        info!(latest = %latest, "already on latest version");
        return Ok(UpdateOutcome::UpToDate);
    }

    info!(latest = %latest, "new version available");

    let asset = descriptor
        .installer_asset(&config.installer_suffix)
        .ok_or_else(|| UpdateError::NoInstallerAsset {
            tag: descriptor.tag_name.clone(),
            suffix: config.installer_suffix.clone(),
        })?;

    let destination = staging_dir.join(&asset.name);
    let mut fetcher = InstallerFetcher::new();
    if let Some(sender) = progress {
        fetcher = fetcher.with_progress(sender);
    }

    let task = fetcher.fetch(&asset.download_url, &destination).await?;
    info!(
        installer = %task.destination.display(),
        bytes = task.bytes_written,
        "installer staged"
    );

    Ok(UpdateOutcome::InstallerReady(task.destination))
}
