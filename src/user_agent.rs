//! Shared User-Agent strings for update and browser-session traffic.
//!
//! Single source for project URL and UA format so release-query and
//! installer-download traffic stay consistent and easy to update.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/ytgrab";

/// Default User-Agent for update traffic (identifies the tool).
#[must_use]
pub(crate) fn default_update_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ytgrab/{version} (updater; +{PROJECT_UA_URL})")
}

/// Realistic browser User-Agent for the automated login session.
///
/// The identity provider's pages treat headless-default UA strings as
/// automation; the login session presents a current desktop browser
/// identification instead.
#[must_use]
pub(crate) fn browser_user_agent() -> &'static str {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
}
