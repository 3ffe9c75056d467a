//! Detached installer handoff.
//!
//! The installer must outlive this process so it can replace the running
//! executable, so it is spawned detached from the current process group and
//! the current process exits immediately afterwards.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{info, instrument};

/// Errors that can occur while launching an installer.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Spawning the installer process failed (missing file, rejected exec).
    #[error("failed to start installer {path}: {source}")]
    Spawn {
        /// Path to the installer that failed to start.
        path: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// Builds the detached command used to run an installer.
///
/// Stdio is nulled and the child is unlinked from this process's lifetime:
/// its own process group on Unix, `DETACHED_PROCESS` creation flags on
/// Windows. Split out from [`launch`] so the construction is testable.
#[must_use]
pub fn detached_command(installer_path: &Path) -> Command {
    let mut command = Command::new(installer_path);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    command
}

/// Starts the installer detached and terminates the current process.
///
/// Does not return on success: once the installer is running, this process
/// exits with status 0 so the installer can replace its files.
///
/// # Errors
///
/// Returns [`LaunchError::Spawn`] when the installer cannot be started.
#[instrument(fields(installer = %installer_path.display()))]
pub fn launch(installer_path: &Path) -> Result<Infallible, LaunchError> {
    let mut command = detached_command(installer_path);
    command.spawn().map_err(|source| LaunchError::Spawn {
        path: installer_path.to_path_buf(),
        source,
    })?;

    info!("installer started, handing off and exiting");
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_command_targets_installer() {
        let command = detached_command(Path::new("/tmp/app-Setup.exe"));
        assert_eq!(command.get_program(), "/tmp/app-Setup.exe");
        assert_eq!(command.get_args().count(), 0, "installer takes no arguments");
    }

    #[test]
    fn test_launch_missing_installer_surfaces_spawn_error() {
        let missing = Path::new("/nonexistent/path/to/installer");
        let result = launch(missing);
        match result {
            Err(LaunchError::Spawn { path, .. }) => {
                assert_eq!(path, missing);
            }
            Ok(never) => match never {},
        }
    }

    #[test]
    fn test_launch_error_display_names_installer() {
        let error = LaunchError::Spawn {
            path: PathBuf::from("/tmp/app-Setup.exe"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = error.to_string();
        assert!(msg.contains("/tmp/app-Setup.exe"), "expected path in: {msg}");
    }
}
