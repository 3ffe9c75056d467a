//! Netscape cookie file serialization.
//!
//! Writes captured session cookies in the Netscape HTTP Cookie File format
//! (7 TAB-separated fields per line) consumed by the external media tool's
//! `--cookies` option.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

/// Fixed first header line of the cookie file.
const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

/// Generator identification comment (second header line).
const GENERATOR_HEADER: &str = concat!("# Generated by ytgrab ", env!("CARGO_PKG_VERSION"));

/// A single cookie captured from the authenticated browser session.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive session data.
#[derive(Clone)]
pub struct SessionCookie {
    /// The domain the cookie belongs to (e.g. `.youtube.com`).
    pub domain: String,
    /// Whether the cookie is restricted to the exact host (no subdomains).
    pub host_only: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry in whole seconds (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive — never log).
    value: String,
}

impl SessionCookie {
    /// Creates a new session cookie.
    #[must_use]
    pub fn new(
        domain: String,
        host_only: bool,
        path: String,
        secure: bool,
        expires: u64,
        name: String,
        value: String,
    ) -> Self {
        Self {
            domain,
            host_only,
            path,
            secure,
            expires,
            name,
            value,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while writing a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error writing the cookie file.
    #[error("failed to write cookie file {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Serializes one cookie as a Netscape cookie-jar line.
///
/// Exactly 7 TAB-separated fields: domain, include-subdomains flag (`TRUE`
/// when the cookie is not host-only), path, secure flag, expiry, name,
/// value.
#[must_use]
pub fn cookie_line(cookie: &SessionCookie) -> String {
    [
        cookie.domain.as_str(),
        flag(!cookie.host_only),
        cookie.path.as_str(),
        flag(cookie.secure),
        &cookie.expires.to_string(),
        cookie.name.as_str(),
        cookie.value(),
    ]
    .join("\t")
}

fn flag(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Writes the two-line header plus one line per cookie, preserving input
/// order, with a trailing newline.
///
/// # Errors
///
/// Returns [`ExportError::Io`] when the destination cannot be written.
#[instrument(skip(cookies), fields(destination = %destination.display(), count = cookies.len()))]
pub fn write_cookie_file(
    cookies: &[SessionCookie],
    destination: &Path,
) -> Result<PathBuf, ExportError> {
    let io_error = |source| ExportError::Io {
        path: destination.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(destination).map_err(io_error)?;
    writeln!(file, "{NETSCAPE_HEADER}").map_err(io_error)?;
    writeln!(file, "{GENERATOR_HEADER}").map_err(io_error)?;
    for cookie in cookies {
        writeln!(file, "{}", cookie_line(cookie)).map_err(io_error)?;
    }
    file.flush().map_err(io_error)?;

    debug!("cookie file written");
    Ok(destination.to_path_buf())
}
