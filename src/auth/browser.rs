//! Browser automation capability surface.
//!
//! The login state machine in [`crate::auth::flow`] is written against this
//! trait so it can be exercised with a scripted fake; the production
//! implementation lives in [`crate::auth::webdriver`].

use std::time::Duration;

use async_trait::async_trait;

use super::export::SessionCookie;

/// A native page dialog (alert/confirm) surfaced as an explicit event.
///
/// Dialogs block a real browser until handled, so the flow drains and
/// dismisses them at every step boundary instead of relying on
/// fire-and-forget callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDialog {
    /// The dialog's message text.
    pub message: String,
}

/// Errors surfaced by a browser session implementation.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Navigation failed or did not settle.
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// The URL that failed to load.
        url: String,
        /// Implementation-specific failure description.
        reason: String,
    },

    /// An awaited element did not appear within the timeout.
    #[error("timed out after {timeout:?} waiting for element '{selector}'")]
    ElementTimeout {
        /// The CSS selector that was awaited.
        selector: String,
        /// The bounded wait that elapsed.
        timeout: Duration,
    },

    /// Any other session-level failure (protocol error, closed session).
    #[error("browser session error: {0}")]
    Session(String),
}

/// Capability interface over one automated browser session.
///
/// Implementations own the underlying session and release it in
/// [`close`](Self::close); callers must close on both success and failure
/// paths.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url` and waits for the load to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Waits until an element matching `selector` is present.
    ///
    /// Returns [`BrowserError::ElementTimeout`] when the bounded wait
    /// elapses; callers treating absence as tolerable match on that
    /// variant.
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Types `text` into the element matching `selector`.
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Clicks the element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Returns the URL of the current page.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Executes a page script in the current browsing context.
    async fn execute_script(&mut self, script: &str) -> Result<(), BrowserError>;

    /// Returns the currently blocking native dialog, if any.
    async fn pending_dialog(&mut self) -> Result<Option<PageDialog>, BrowserError>;

    /// Dismisses the currently blocking native dialog.
    async fn dismiss_dialog(&mut self) -> Result<(), BrowserError>;

    /// Reads all cookies visible to the session.
    async fn cookies(&mut self) -> Result<Vec<SessionCookie>, BrowserError>;

    /// Ends the session and releases the underlying browser.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
