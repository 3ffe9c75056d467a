//! CLI entry point for the ytgrab tool.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ytgrab_core::{
    AppConfig, DownloadProgress, MediaToolInvocation, SessionAuthenticator, UpdateOutcome,
    WebDriverSession, run_update_check, update, write_cookie_file,
};

mod cli;

use cli::Args;

/// File name of the exported cookie jar under the staging directory.
const COOKIE_FILE_NAME: &str = "yt_cookies.txt";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("ytgrab starting");

    let config = AppConfig::from_env();

    // Update preamble: a newer release short-circuits the whole run by
    // handing off to its installer. Check failures only skip the check.
    if args.skip_update_check {
        debug!("update check skipped by flag");
    } else {
        run_update_preamble(&config).await?;
    }

    let Some(url) = args.url else {
        info!("No video URL provided.");
        info!("Example: ytgrab 'https://www.youtube.com/watch?v=abc123'");
        return Ok(());
    };

    // Authenticated access is all-or-nothing: a login failure stops the run
    // rather than degrading to an unauthenticated attempt.
    let cookie_file = if args.login {
        Some(capture_session_cookies(&config, &url).await?)
    } else {
        None
    };

    let output_dir = args.output_dir.unwrap_or_else(default_output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    let invocation = MediaToolInvocation {
        tool_path: find_media_tool(),
        url,
        format: args.format.into(),
        output_dir,
        cookie_file,
        ffmpeg_dir: find_ffmpeg_dir(),
    };

    let status = invocation.run().await?;
    if !status.success() {
        bail!("media tool exited with {status}");
    }

    info!("download complete");
    Ok(())
}

/// Runs the update check, handing off to the installer when one is staged.
///
/// Update-flow failures are warnings: the tool keeps working offline. Only
/// a failed installer handoff is fatal.
async fn run_update_preamble(config: &AppConfig) -> Result<()> {
    let (progress, bar_task) = spawn_progress_bar();

    let outcome = run_update_check(&config.release, &config.staging_dir, Some(progress)).await;
    bar_task.await.ok();

    match outcome {
        Ok(UpdateOutcome::InstallerReady(installer)) => {
            info!(installer = %installer.display(), "launching installer");
            // Never returns on success: the process exits for the handoff.
            match update::launch(&installer).context("installer handoff failed")? {}
        }
        Ok(UpdateOutcome::UpToDate) => debug!("no update available"),
        Ok(UpdateOutcome::CheckSkipped) => {}
        Err(error) => warn!(error = %error, "update flow failed, continuing"),
    }
    Ok(())
}

/// Drives the browser login and exports the captured cookies.
async fn capture_session_cookies(config: &AppConfig, url: &str) -> Result<PathBuf> {
    let login = config.login_config()?;

    info!("starting browser login");
    let browser = WebDriverSession::connect(&config.webdriver)
        .await
        .context("could not reach the WebDriver endpoint; is the driver running?")?;

    let cookies = SessionAuthenticator::new(browser, login)
        .authenticate(url)
        .await?;

    let destination = config.staging_dir.join(COOKIE_FILE_NAME);
    let path = write_cookie_file(&cookies, &destination)?;
    info!(path = %path.display(), cookies = cookies.len(), "session cookies exported");
    Ok(path)
}

/// Renders installer download progress from the fetcher's event channel.
fn spawn_progress_bar() -> (
    mpsc::UnboundedSender<DownloadProgress>,
    JoinHandle<()>,
) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<DownloadProgress>();
    let handle = tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(event) = receiver.recv().await {
            let bar = bar.get_or_insert_with(|| {
                let bar = ProgressBar::new(event.total_bytes);
                bar.set_style(
                    ProgressStyle::with_template(
                        "  downloading [{bar:40}] {percent}% {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            });
            bar.set_position(event.bytes_received);
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    });
    (sender, handle)
}

/// Locates the media tool: next to the executable first, `PATH` otherwise.
fn find_media_tool() -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };

    if let Some(exe_dir) = executable_dir() {
        let sibling = exe_dir.join(name);
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from(name)
}

/// Locates a bundled ffmpeg directory next to the executable, if any.
fn find_ffmpeg_dir() -> Option<PathBuf> {
    let candidate = executable_dir()?.join("ffmpeg");
    candidate.is_dir().then_some(candidate)
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
}

/// Default download location: the user's Downloads directory when it can be
/// derived from the environment, the current directory otherwise.
fn default_output_dir() -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    home.map_or_else(|| PathBuf::from("."), |home| PathBuf::from(home).join("Downloads"))
}
