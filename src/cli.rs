//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

use ytgrab_core::sidecar::MediaFormat;

/// Hosts accepted as target resources.
const ACCEPTED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Fetch a video or its audio track, keeping the tool itself current.
///
/// Checks for a newer release first (handing off to its installer when one
/// exists), optionally captures an authenticated session for age-restricted
/// videos, then delegates the actual download to yt-dlp.
#[derive(Parser, Debug)]
#[command(name = "ytgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Video URL to fetch
    #[arg(value_parser = validate_target_url)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatChoice::Video)]
    pub format: FormatChoice,

    /// Log in with the service account to access age-restricted videos
    #[arg(long)]
    pub login: bool,

    /// Directory for downloaded media (defaults to ~/Downloads)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the release check at startup
    #[arg(long)]
    pub skip_update_check: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// User-facing format choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatChoice {
    /// Video with audio (MP4)
    Video,
    /// Audio only (M4A)
    Audio,
}

impl From<FormatChoice> for MediaFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Video => Self::VideoAudio,
            FormatChoice::Audio => Self::AudioOnly,
        }
    }
}

/// Validates that the target is an http(s) URL on an accepted video host.
fn validate_target_url(input: &str) -> Result<String, String> {
    let parsed = Url::parse(input).map_err(|_| format!("'{input}' is not a valid URL"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("'{input}' must use http or https"));
    }

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    if !ACCEPTED_HOSTS.contains(&host.as_str()) {
        return Err(format!("'{host}' is not a supported video host"));
    }

    Ok(input.to_string())
}
