//! External media tool (yt-dlp) invocation boundary.
//!
//! Builds the argument list for the external extraction/transcoding tool
//! and spawns it with inherited stdio so its own progress output reaches
//! the user directly. The tool is an external collaborator: nothing here
//! interprets its output beyond the exit status.
//!
//! # Module structure note
//!
//! Intentionally a single file (`mod.rs`-only); the feature scope is small
//! enough to not warrant sub-files.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, instrument};

/// Output format choice passed through to the media tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// Best MP4 video plus M4A audio, merged into an MP4 container.
    VideoAudio,
    /// Best M4A audio only.
    AudioOnly,
}

impl MediaFormat {
    /// The tool's format selector expression.
    #[must_use]
    pub fn selector(self) -> &'static str {
        match self {
            Self::VideoAudio => "bestvideo[ext=mp4][vcodec^=avc1]+bestaudio[ext=m4a]/best[ext=mp4]",
            Self::AudioOnly => "bestaudio[ext=m4a]",
        }
    }
}

/// Errors produced by the media tool boundary.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// The tool executable is not where the caller said it would be.
    #[error("media tool not found at {path}")]
    ToolMissing {
        /// The expected executable path.
        path: PathBuf,
    },

    /// Spawning the tool failed.
    #[error("failed to run media tool {path}: {source}")]
    Spawn {
        /// The executable path.
        path: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// One fully specified media tool run.
#[derive(Debug, Clone)]
pub struct MediaToolInvocation {
    /// Path to the tool executable.
    pub tool_path: PathBuf,
    /// The media URL to fetch.
    pub url: String,
    /// Requested output format.
    pub format: MediaFormat,
    /// Directory the tool writes its output into.
    pub output_dir: PathBuf,
    /// Netscape cookie file for authenticated access, when captured.
    pub cookie_file: Option<PathBuf>,
    /// Directory containing the ffmpeg binaries, when known.
    pub ffmpeg_dir: Option<PathBuf>,
}

impl MediaToolInvocation {
    /// Builds the tool's argument list.
    ///
    /// Order: fixed flags, optional cookies, format selection, optional
    /// merge flags, optional ffmpeg location, output template, URL last.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["--no-mtime".to_string(), "--restrict-filenames".to_string()];

        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookie_file.to_string_lossy().into_owned());
        }

        args.push("-f".to_string());
        args.push(self.format.selector().to_string());

        if self.format == MediaFormat::VideoAudio {
            args.extend(
                ["--merge-output-format", "mp4", "--remux-video", "mp4"]
                    .map(ToString::to_string),
            );
        }

        if let Some(ffmpeg_dir) = &self.ffmpeg_dir {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg_dir.to_string_lossy().into_owned());
        }

        args.push("-o".to_string());
        args.push(
            self.output_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .into_owned(),
        );

        args.push(self.url.clone());
        args
    }

    /// Runs the tool to completion with inherited stdio.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::ToolMissing`] when the executable does not
    /// exist and [`SidecarError::Spawn`] when it cannot be started.
    #[instrument(skip(self), fields(tool = %self.tool_path.display(), url = %self.url))]
    pub async fn run(&self) -> Result<ExitStatus, SidecarError> {
        if !tool_exists(&self.tool_path) {
            return Err(SidecarError::ToolMissing {
                path: self.tool_path.clone(),
            });
        }

        let args = self.args();
        info!(args = ?args, "running media tool");

        let status = Command::new(&self.tool_path)
            .args(&args)
            .status()
            .await
            .map_err(|source| SidecarError::Spawn {
                path: self.tool_path.clone(),
                source,
            })?;

        info!(code = status.code(), "media tool finished");
        Ok(status)
    }
}

/// Whether the tool executable is present.
///
/// Bare names (resolved through `PATH`) are accepted as-is; only explicit
/// paths are checked for existence.
fn tool_exists(path: &Path) -> bool {
    path.components().count() <= 1 || path.exists()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn invocation(format: MediaFormat, cookie_file: Option<&str>) -> MediaToolInvocation {
        MediaToolInvocation {
            tool_path: PathBuf::from("/opt/tools/yt-dlp"),
            url: "https://media.example/watch?v=abc".to_string(),
            format,
            output_dir: PathBuf::from("/home/user/Downloads"),
            cookie_file: cookie_file.map(PathBuf::from),
            ffmpeg_dir: Some(PathBuf::from("/opt/tools/ffmpeg")),
        }
    }

    #[test]
    fn test_args_video_format_includes_merge_flags() {
        let args = invocation(MediaFormat::VideoAudio, None).args();
        let joined = args.join(" ");
        assert!(
            joined.contains(
                "-f bestvideo[ext=mp4][vcodec^=avc1]+bestaudio[ext=m4a]/best[ext=mp4]"
            )
        );
        assert!(joined.contains("--merge-output-format mp4"));
        assert!(joined.contains("--remux-video mp4"));
    }

    #[test]
    fn test_args_audio_format_has_no_merge_flags() {
        let args = invocation(MediaFormat::AudioOnly, None).args();
        let joined = args.join(" ");
        assert!(joined.contains("-f bestaudio[ext=m4a]"));
        assert!(!joined.contains("--merge-output-format"));
    }

    #[test]
    fn test_args_cookie_file_passed_through() {
        let args = invocation(MediaFormat::AudioOnly, Some("/tmp/cookies.txt")).args();
        let cookies_pos = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[cookies_pos + 1], "/tmp/cookies.txt");
    }

    #[test]
    fn test_args_omit_cookies_when_not_captured() {
        let args = invocation(MediaFormat::AudioOnly, None).args();
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_args_url_is_last() {
        let args = invocation(MediaFormat::VideoAudio, Some("/tmp/cookies.txt")).args();
        assert_eq!(args.last().unwrap(), "https://media.example/watch?v=abc");
    }

    #[test]
    fn test_args_output_template_under_output_dir() {
        let args = invocation(MediaFormat::VideoAudio, None).args();
        let output_pos = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[output_pos + 1].starts_with("/home/user/Downloads"));
        assert!(args[output_pos + 1].ends_with("%(title)s.%(ext)s"));
    }

    #[tokio::test]
    async fn test_run_missing_tool_is_typed_error() {
        let run = MediaToolInvocation {
            tool_path: PathBuf::from("/nonexistent/yt-dlp"),
            ..invocation(MediaFormat::AudioOnly, None)
        };
        let result = run.run().await;
        assert!(matches!(result, Err(SidecarError::ToolMissing { .. })));
    }

    #[test]
    fn test_bare_tool_name_resolves_via_path() {
        assert!(tool_exists(Path::new("yt-dlp")));
        assert!(!tool_exists(Path::new("/definitely/not/here/yt-dlp")));
    }
}
