//! Application configuration assembled at the process boundary.
//!
//! Endpoints, the baseline version, and the service-account credentials all
//! enter here (from Cargo metadata and the environment) and are handed to
//! the pipelines as explicit configuration. Nothing below this module reads
//! the environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::auth::{LoginConfig, WebDriverConfig};
use crate::update::ReleaseConfig;

/// Environment variable overriding the release query endpoint.
pub const RELEASE_URL_VAR: &str = "YTGRAB_RELEASE_URL";

/// Environment variable holding the service-account email.
pub const LOGIN_EMAIL_VAR: &str = "YTGRAB_LOGIN_EMAIL";

/// Environment variable holding the service-account password.
pub const LOGIN_PASSWORD_VAR: &str = "YTGRAB_LOGIN_PASSWORD";

/// Environment variable overriding the WebDriver endpoint.
pub const WEBDRIVER_URL_VAR: &str = "YTGRAB_WEBDRIVER_URL";

/// Default release query endpoint.
const DEFAULT_RELEASE_URL: &str =
    "https://api.github.com/repos/fierce/ytgrab/releases/latest";

/// Installer asset suffix for the current platform.
fn installer_suffix() -> &'static str {
    if cfg!(target_os = "windows") {
        ".exe"
    } else if cfg!(target_os = "macos") {
        ".dmg"
    } else {
        ".AppImage"
    }
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Update pipeline configuration.
    pub release: ReleaseConfig,
    /// WebDriver connection settings for the login flow.
    pub webdriver: WebDriverConfig,
    /// Temp-directory location for staged installers and cookie files.
    pub staging_dir: PathBuf,
}

impl AppConfig {
    /// Builds the configuration from the environment and Cargo metadata.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint =
            env::var(RELEASE_URL_VAR).unwrap_or_else(|_| DEFAULT_RELEASE_URL.to_string());
        let mut webdriver = WebDriverConfig::default();
        if let Ok(webdriver_url) = env::var(WEBDRIVER_URL_VAR) {
            webdriver.endpoint = webdriver_url;
        }

        Self {
            release: ReleaseConfig {
                endpoint,
                current_version: env!("CARGO_PKG_VERSION").to_string(),
                installer_suffix: installer_suffix().to_string(),
            },
            webdriver,
            staging_dir: env::temp_dir(),
        }
    }

    /// Reads the service-account credentials for the login flow.
    ///
    /// # Errors
    ///
    /// Fails when either credential variable is unset or empty; the error
    /// names the variables so the user can fix their environment.
    pub fn login_config(&self) -> Result<LoginConfig> {
        let email = non_empty_var(LOGIN_EMAIL_VAR)?;
        let password = non_empty_var(LOGIN_PASSWORD_VAR)?;
        Ok(LoginConfig::new(email, password))
    }
}

fn non_empty_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!(
            "login requires service-account credentials; set {LOGIN_EMAIL_VAR} and \
             {LOGIN_PASSWORD_VAR} in the environment (missing: {name})"
        ),
    }
}
