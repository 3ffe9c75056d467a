//! Scripted login flow against the identity provider.
//!
//! Drives a [`BrowserSession`] through the multi-page credential login,
//! confirms authenticated access to the target resource, and captures the
//! session cookie set. The flow is a forward-only state machine; the single
//! allowed repeat is one retry of the target-page navigation.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::browser::{BrowserError, BrowserSession};
use super::export::SessionCookie;

/// Page script injected at session start.
///
/// Masks the automation flag page scripts probe for and disables the
/// hardware-credential surface so the provider cannot divert the password
/// flow into a passkey challenge.
const STEALTH_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
if (navigator.credentials) {
  navigator.credentials.get = function () {
    return Promise.reject(new Error('credential prompts unavailable'));
  };
}
window.PublicKeyCredential = undefined;
";

/// States of the login flow, in flow order.
///
/// The derived ordering follows the flow: transitions only ever move to a
/// later state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoginFlowState {
    /// Opening the sign-in page and submitting the email.
    Start,
    /// Email accepted; submitting the password.
    EmailEntered,
    /// Password submitted; waiting for navigation to settle.
    PasswordEntered,
    /// Optional "stay signed in" interstitial handled.
    ConsentHandled,
    /// Optional passkey/phone-sign-in banner handled.
    PasskeyBannerHandled,
    /// Authenticated landing page confirmed via its signed-in marker.
    HomepageConfirmed,
    /// Target resource reached (at most one navigation retry).
    TargetPageConfirmed,
    /// Cookie set read and session closed. Terminal success.
    CookiesCaptured,
    /// Terminal failure.
    Failed,
}

impl fmt::Display for LoginFlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::EmailEntered => "email-entered",
            Self::PasswordEntered => "password-entered",
            Self::ConsentHandled => "consent-handled",
            Self::PasskeyBannerHandled => "passkey-banner-handled",
            Self::HomepageConfirmed => "homepage-confirmed",
            Self::TargetPageConfirmed => "target-page-confirmed",
            Self::CookiesCaptured => "cookies-captured",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What went wrong inside a flow step.
#[derive(Debug, thiserror::Error)]
pub enum AuthErrorKind {
    /// The browser surface reported a failure (timeout, navigation, session).
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// The page reached after target navigation is not the target resource.
    #[error("page at {actual} is not the requested resource {expected}")]
    TargetMismatch {
        /// The URL that was requested.
        expected: String,
        /// The URL the browser ended up on.
        actual: String,
    },
}

/// Authentication failure, carrying the stage that was being executed.
///
/// The caller must treat this as a hard stop for the authenticated-access
/// request, never as a cue to fall back to an unauthenticated attempt.
#[derive(Debug, thiserror::Error)]
#[error("authentication failed at {stage}: {kind}")]
pub struct AuthError {
    /// The flow stage whose entry action failed.
    pub stage: LoginFlowState,
    /// The underlying failure.
    #[source]
    pub kind: AuthErrorKind,
}

/// CSS selectors the flow interacts with.
///
/// Defaults target the Google sign-in pages and the YouTube signed-in
/// marker; tests substitute their own.
#[derive(Debug, Clone)]
pub struct FlowSelectors {
    /// Email input on the sign-in page.
    pub email_input: String,
    /// Submit control for the email step.
    pub email_next: String,
    /// Password input.
    pub password_input: String,
    /// Submit control for the password step.
    pub password_next: String,
    /// Optional "stay signed in" confirmation control.
    pub stay_signed_in: String,
    /// Optional passkey/phone-sign-in dismissal control.
    pub passkey_dismiss: String,
    /// Element only present when the landing page is authenticated.
    pub signed_in_marker: String,
}

impl Default for FlowSelectors {
    fn default() -> Self {
        Self {
            email_input: r#"input[type="email"]"#.to_string(),
            email_next: "#identifierNext".to_string(),
            password_input: r#"input[type="password"]"#.to_string(),
            password_next: "#passwordNext".to_string(),
            stay_signed_in: "#save-credential-defaults".to_string(),
            passkey_dismiss: r#"button[data-challenge-ui="passkey"] [data-action="skip"]"#
                .to_string(),
            signed_in_marker: "button#avatar-btn".to_string(),
        }
    }
}

/// Credentials and page locations for the login flow.
///
/// Credentials belong to the tool's own service account and are supplied by
/// the caller from environment or a secret store, never embedded here.
#[derive(Clone)]
pub struct LoginConfig {
    /// Account email.
    pub email: String,
    /// Identity-provider sign-in page.
    pub signin_url: String,
    /// Authenticated landing page of the provider.
    pub home_url: String,
    /// Selectors for the flow's interaction points.
    pub selectors: FlowSelectors,
    /// Account password (sensitive — never log).
    password: String,
}

impl LoginConfig {
    /// Creates a login configuration with default page URLs and selectors.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            signin_url: "https://accounts.google.com/signin/v2/identifier".to_string(),
            home_url: "https://www.youtube.com/".to_string(),
            selectors: FlowSelectors::default(),
        }
    }

    /// Returns the account password.
    ///
    /// Sensitive — avoid logging the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Custom Debug impl that redacts the password.
impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("email", &self.email)
            .field("signin_url", &self.signin_url)
            .field("home_url", &self.home_url)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Bounded waits used by the flow.
///
/// Navigation waits are bounded separately, by the browser session's own
/// page-load timeout.
#[derive(Debug, Clone, Copy)]
pub struct FlowTimeouts {
    /// Per-element-appearance wait for required elements.
    pub element: Duration,
    /// Short wait for optional interstitials (their absence is tolerated).
    pub banner: Duration,
    /// Settle delay after target navigation (consent overlays load late).
    pub settle: Duration,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(30),
            banner: Duration::from_secs(5),
            settle: Duration::from_secs(2),
        }
    }
}

/// Drives one browser session through the login flow.
pub struct SessionAuthenticator<B: BrowserSession> {
    browser: B,
    config: LoginConfig,
    timeouts: FlowTimeouts,
    state: LoginFlowState,
}

impl<B: BrowserSession> SessionAuthenticator<B> {
    /// Creates an authenticator over a fresh browser session.
    #[must_use]
    pub fn new(browser: B, config: LoginConfig) -> Self {
        Self {
            browser,
            config,
            timeouts: FlowTimeouts::default(),
            state: LoginFlowState::Start,
        }
    }

    /// Overrides the flow timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: FlowTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The stage the flow is currently in.
    #[must_use]
    pub fn state(&self) -> LoginFlowState {
        self.state
    }

    /// Runs the full login flow and captures the session cookie set.
    ///
    /// The browser session is closed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] carrying the stage whose entry action failed.
    #[instrument(skip(self), fields(target = %target_url))]
    pub async fn authenticate(
        mut self,
        target_url: &str,
    ) -> Result<Vec<SessionCookie>, AuthError> {
        match self.run(target_url).await {
            Ok(cookies) => {
                info!(cookies = cookies.len(), "login flow complete");
                Ok(cookies)
            }
            Err(kind) => {
                let stage = self.state;
                self.state = LoginFlowState::Failed;
                // Release the browser before propagating.
                let _ = self.browser.close().await;
                warn!(%stage, "login flow failed");
                Err(AuthError { stage, kind })
            }
        }
    }

    async fn run(&mut self, target_url: &str) -> Result<Vec<SessionCookie>, AuthErrorKind> {
        let selectors = self.config.selectors.clone();

        // Start: open the sign-in page, apply session-level countermeasures,
        // submit the email.
        self.browser.navigate(&self.config.signin_url).await?;
        self.browser.execute_script(STEALTH_SCRIPT).await?;
        self.drain_dialogs().await?;
        self.browser
            .wait_for_element(&selectors.email_input, self.timeouts.element)
            .await?;
        let email = self.config.email.clone();
        self.browser
            .type_text(&selectors.email_input, &email)
            .await?;
        self.browser.click(&selectors.email_next).await?;

        // EmailEntered: submit the password.
        self.advance(LoginFlowState::EmailEntered);
        self.drain_dialogs().await?;
        self.browser
            .wait_for_element(&selectors.password_input, self.timeouts.element)
            .await?;
        let password = self.config.password.clone();
        self.browser
            .type_text(&selectors.password_input, &password)
            .await?;
        self.browser.click(&selectors.password_next).await?;

        // PasswordEntered: let the post-submit navigation settle.
        self.advance(LoginFlowState::PasswordEntered);
        tokio::time::sleep(self.timeouts.settle).await;
        self.drain_dialogs().await?;

        // ConsentHandled: the interstitial may not appear at all.
        self.advance(LoginFlowState::ConsentHandled);
        if self
            .optional_element(&selectors.stay_signed_in, self.timeouts.banner)
            .await?
        {
            self.browser.click(&selectors.stay_signed_in).await?;
            tokio::time::sleep(self.timeouts.settle).await;
        }

        // PasskeyBannerHandled: dismiss the passkey offer when it shows up.
        self.advance(LoginFlowState::PasskeyBannerHandled);
        if self
            .optional_element(&selectors.passkey_dismiss, self.timeouts.banner)
            .await?
        {
            self.browser.click(&selectors.passkey_dismiss).await?;
        }

        // HomepageConfirmed: the signed-in marker proves the login took.
        self.advance(LoginFlowState::HomepageConfirmed);
        self.browser.navigate(&self.config.home_url).await?;
        self.drain_dialogs().await?;
        self.browser
            .wait_for_element(&selectors.signed_in_marker, self.timeouts.element)
            .await?;

        // TargetPageConfirmed: reach the requested resource, retrying the
        // navigation exactly once if the provider bounced us elsewhere.
        self.advance(LoginFlowState::TargetPageConfirmed);
        self.confirm_target(target_url).await?;

        // CookiesCaptured: read the session state and release the browser.
        self.advance(LoginFlowState::CookiesCaptured);
        let cookies = self.browser.cookies().await?;
        self.browser.close().await?;

        Ok(cookies)
    }

    /// Navigates to the target, allowing one retry on a mismatched landing.
    async fn confirm_target(&mut self, target_url: &str) -> Result<(), AuthErrorKind> {
        let mut last_url = String::new();
        for attempt in 1..=2u8 {
            self.browser.navigate(target_url).await?;
            tokio::time::sleep(self.timeouts.settle).await;
            self.drain_dialogs().await?;

            last_url = self.browser.current_url().await?;
            if page_matches_target(&last_url, target_url) {
                return Ok(());
            }
            warn!(attempt, current = %last_url, "landed off-target after navigation");
        }

        Err(AuthErrorKind::TargetMismatch {
            expected: target_url.to_string(),
            actual: last_url,
        })
    }

    /// Short bounded wait for an element whose absence is tolerated.
    async fn optional_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, AuthErrorKind> {
        match self.browser.wait_for_element(selector, timeout).await {
            Ok(()) => Ok(true),
            Err(BrowserError::ElementTimeout { .. }) => {
                debug!(selector, "optional element absent");
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Dismisses any native dialogs queued up by the page.
    async fn drain_dialogs(&mut self) -> Result<(), AuthErrorKind> {
        while let Some(dialog) = self.browser.pending_dialog().await? {
            warn!(message = %dialog.message, "dismissing page dialog");
            self.browser.dismiss_dialog().await?;
        }
        Ok(())
    }

    fn advance(&mut self, next: LoginFlowState) {
        debug_assert!(next > self.state, "login flow must not move backward");
        debug!(from = %self.state, to = %next, "login flow transition");
        self.state = next;
    }
}

/// Whether `current` is recognizably the requested target page.
///
/// Hosts are compared with `www.`/`m.` prefixes stripped; paths must match
/// and every query pair of the target must be present on the current URL.
#[must_use]
fn page_matches_target(current: &str, target: &str) -> bool {
    let (Ok(current), Ok(target)) = (Url::parse(current), Url::parse(target)) else {
        return false;
    };

    let host = |url: &Url| {
        url.host_str()
            .map(|host| {
                host.strip_prefix("www.")
                    .or_else(|| host.strip_prefix("m."))
                    .unwrap_or(host)
                    .to_ascii_lowercase()
            })
            .unwrap_or_default()
    };

    if host(&current) != host(&target) || current.path() != target.path() {
        return false;
    }

    let current_pairs: Vec<(String, String)> = current
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    target
        .query_pairs()
        .all(|(k, v)| current_pairs.iter().any(|(ck, cv)| *ck == k && *cv == v))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::browser::PageDialog;

    use std::collections::{HashSet, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    /// Scripted page state shared between the flow under test and the
    /// assertions. All logic is synchronous; the trait impl below just locks
    /// and delegates, so no guard is ever held across an await point.
    #[derive(Default)]
    struct ScriptedPages {
        /// Selectors that "exist" on the scripted pages.
        present: HashSet<String>,
        /// Overrides consumed by `current_url`; falls back to the last
        /// navigated URL when empty.
        url_overrides: VecDeque<String>,
        /// Dialogs the pages raise.
        dialogs: VecDeque<PageDialog>,
        /// Cookie set returned on capture.
        cookies: Vec<SessionCookie>,
        /// Recorded interactions, in order.
        actions: Vec<String>,
        navigations: Vec<String>,
        dismissed_dialogs: usize,
        closed: bool,
    }

    impl ScriptedPages {
        fn with_elements(selectors: &[&str]) -> Self {
            Self {
                present: selectors.iter().map(|s| (*s).to_string()).collect(),
                cookies: vec![SessionCookie::new(
                    ".example.com".to_string(),
                    false,
                    "/".to_string(),
                    true,
                    0,
                    "session".to_string(),
                    "token".to_string(),
                )],
                ..Self::default()
            }
        }

        fn navigations_to(&self, url: &str) -> usize {
            self.navigations.iter().filter(|n| *n == url).count()
        }
    }

    /// Handle implementing [`BrowserSession`] over shared scripted pages.
    #[derive(Clone)]
    struct ScriptedBrowser(Arc<Mutex<ScriptedPages>>);

    impl ScriptedBrowser {
        fn new(pages: ScriptedPages) -> Self {
            Self(Arc::new(Mutex::new(pages)))
        }

        fn pages(&self) -> std::sync::MutexGuard<'_, ScriptedPages> {
            self.0.lock().unwrap()
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedBrowser {
        async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
            let mut pages = self.pages();
            pages.actions.push(format!("navigate:{url}"));
            pages.navigations.push(url.to_string());
            Ok(())
        }

        async fn wait_for_element(
            &mut self,
            selector: &str,
            timeout: Duration,
        ) -> Result<(), BrowserError> {
            let mut pages = self.pages();
            pages.actions.push(format!("wait:{selector}"));
            if pages.present.contains(selector) {
                Ok(())
            } else {
                Err(BrowserError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout,
                })
            }
        }

        async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
            self.pages().actions.push(format!("type:{selector}:{text}"));
            Ok(())
        }

        async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
            self.pages().actions.push(format!("click:{selector}"));
            Ok(())
        }

        async fn current_url(&mut self) -> Result<String, BrowserError> {
            let mut pages = self.pages();
            if let Some(url) = pages.url_overrides.pop_front() {
                return Ok(url);
            }
            Ok(pages.navigations.last().cloned().unwrap_or_default())
        }

        async fn execute_script(&mut self, _script: &str) -> Result<(), BrowserError> {
            self.pages().actions.push("script".to_string());
            Ok(())
        }

        async fn pending_dialog(&mut self) -> Result<Option<PageDialog>, BrowserError> {
            Ok(self.pages().dialogs.front().cloned())
        }

        async fn dismiss_dialog(&mut self) -> Result<(), BrowserError> {
            let mut pages = self.pages();
            pages.dialogs.pop_front();
            pages.dismissed_dialogs += 1;
            Ok(())
        }

        async fn cookies(&mut self) -> Result<Vec<SessionCookie>, BrowserError> {
            Ok(self.pages().cookies.clone())
        }

        async fn close(&mut self) -> Result<(), BrowserError> {
            self.pages().closed = true;
            Ok(())
        }
    }

    fn test_config() -> LoginConfig {
        let mut config = LoginConfig::new("bot@example.com", "hunter2");
        config.signin_url = "https://idp.example/signin".to_string();
        config.home_url = "https://media.example/".to_string();
        config.selectors = FlowSelectors {
            email_input: "#email".to_string(),
            email_next: "#email-next".to_string(),
            password_input: "#password".to_string(),
            password_next: "#password-next".to_string(),
            stay_signed_in: "#stay-signed-in".to_string(),
            passkey_dismiss: "#skip-passkey".to_string(),
            signed_in_marker: "#avatar".to_string(),
        };
        config
    }

    fn fast_timeouts() -> FlowTimeouts {
        FlowTimeouts {
            element: Duration::from_millis(50),
            banner: Duration::from_millis(50),
            settle: Duration::ZERO,
        }
    }

    const TARGET: &str = "https://media.example/watch?v=abc123";

    fn required_elements() -> Vec<&'static str> {
        vec!["#email", "#password", "#avatar"]
    }

    async fn run_flow(
        pages: ScriptedPages,
    ) -> (Result<Vec<SessionCookie>, AuthError>, ScriptedBrowser) {
        let browser = ScriptedBrowser::new(pages);
        let probe = browser.clone();
        let authenticator =
            SessionAuthenticator::new(browser, test_config()).with_timeouts(fast_timeouts());
        let result = authenticator.authenticate(TARGET).await;
        (result, probe)
    }

    #[tokio::test]
    async fn test_happy_path_captures_cookies_and_closes() {
        let pages = ScriptedPages::with_elements(&required_elements());
        let (result, browser) = run_flow(pages).await;

        let cookies = result.unwrap();
        assert_eq!(cookies.len(), 1);
        assert!(browser.pages().closed, "session must be released on success");
        assert!(
            browser
                .pages()
                .actions
                .contains(&"type:#email:bot@example.com".to_string())
        );
        assert!(browser.pages().actions.contains(&"click:#email-next".to_string()));
        assert!(browser.pages().actions.contains(&"click:#password-next".to_string()));
        // Optional interstitials were absent and must not have been clicked.
        assert!(!browser.pages().actions.contains(&"click:#stay-signed-in".to_string()));
        assert!(!browser.pages().actions.contains(&"click:#skip-passkey".to_string()));
        // Stealth prep runs before any element interaction.
        let script_pos = browser
            .pages()
            .actions
            .iter()
            .position(|a| a == "script")
            .unwrap();
        let email_pos = browser
            .pages()
            .actions
            .iter()
            .position(|a| a == "wait:#email")
            .unwrap();
        assert!(script_pos < email_pos);
    }

    #[tokio::test]
    async fn test_optional_interstitials_clicked_when_present() {
        let mut elements = required_elements();
        elements.push("#stay-signed-in");
        elements.push("#skip-passkey");
        let pages = ScriptedPages::with_elements(&elements);
        let (result, browser) = run_flow(pages).await;

        result.unwrap();
        assert!(browser.pages().actions.contains(&"click:#stay-signed-in".to_string()));
        assert!(browser.pages().actions.contains(&"click:#skip-passkey".to_string()));
    }

    #[tokio::test]
    async fn test_missing_email_input_fails_at_start() {
        let pages = ScriptedPages::with_elements(&["#password", "#avatar"]);
        let (result, browser) = run_flow(pages).await;

        let error = result.unwrap_err();
        assert_eq!(error.stage, LoginFlowState::Start);
        assert!(matches!(
            error.kind,
            AuthErrorKind::Browser(BrowserError::ElementTimeout { .. })
        ));
        assert!(browser.pages().closed, "session must be released on failure");
    }

    #[tokio::test]
    async fn test_missing_password_input_fails_at_email_entered() {
        let pages = ScriptedPages::with_elements(&["#email", "#avatar"]);
        let (result, _browser) = run_flow(pages).await;

        let error = result.unwrap_err();
        assert_eq!(error.stage, LoginFlowState::EmailEntered);
    }

    #[tokio::test]
    async fn test_missing_signed_in_marker_fails_at_homepage() {
        let pages = ScriptedPages::with_elements(&["#email", "#password"]);
        let (result, browser) = run_flow(pages).await;

        let error = result.unwrap_err();
        assert_eq!(error.stage, LoginFlowState::HomepageConfirmed);
        assert!(browser.pages().closed);
    }

    #[tokio::test]
    async fn test_target_mismatch_retries_exactly_once_then_fails() {
        let mut pages = ScriptedPages::with_elements(&required_elements());
        // Both target navigations land back on the home page.
        pages
            .url_overrides
            .push_back("https://media.example/".to_string());
        pages
            .url_overrides
            .push_back("https://media.example/".to_string());
        let (result, browser) = run_flow(pages).await;

        let error = result.unwrap_err();
        assert_eq!(error.stage, LoginFlowState::TargetPageConfirmed);
        assert!(matches!(error.kind, AuthErrorKind::TargetMismatch { .. }));
        assert_eq!(
            browser.pages().navigations_to(TARGET),
            2,
            "exactly one retry of the target navigation"
        );
        assert!(browser.pages().closed);
    }

    #[tokio::test]
    async fn test_target_mismatch_once_then_success() {
        let mut pages = ScriptedPages::with_elements(&required_elements());
        pages
            .url_overrides
            .push_back("https://media.example/".to_string());
        // Second attempt falls through to the last navigated URL (= target).
        let (result, browser) = run_flow(pages).await;

        result.unwrap();
        assert_eq!(browser.pages().navigations_to(TARGET), 2);
    }

    #[tokio::test]
    async fn test_page_dialogs_are_drained_and_dismissed() {
        let mut pages = ScriptedPages::with_elements(&required_elements());
        pages.dialogs.push_back(PageDialog {
            message: "Are you sure?".to_string(),
        });
        pages.dialogs.push_back(PageDialog {
            message: "Really?".to_string(),
        });
        let (result, browser) = run_flow(pages).await;

        result.unwrap();
        assert_eq!(browser.pages().dismissed_dialogs, 2);
        assert!(browser.pages().dialogs.is_empty());
    }

    #[test]
    fn test_state_ordering_follows_flow() {
        use LoginFlowState::{
            ConsentHandled, CookiesCaptured, EmailEntered, HomepageConfirmed,
            PasskeyBannerHandled, PasswordEntered, Start, TargetPageConfirmed,
        };
        let flow = [
            Start,
            EmailEntered,
            PasswordEntered,
            ConsentHandled,
            PasskeyBannerHandled,
            HomepageConfirmed,
            TargetPageConfirmed,
            CookiesCaptured,
        ];
        for pair in flow.windows(2) {
            assert!(pair[0] < pair[1], "{} must precede {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_page_matches_target() {
        assert!(page_matches_target(
            "https://www.media.example/watch?v=abc123&t=10",
            "https://media.example/watch?v=abc123"
        ));
        assert!(!page_matches_target(
            "https://media.example/",
            "https://media.example/watch?v=abc123"
        ));
        assert!(!page_matches_target(
            "https://media.example/watch?v=other",
            "https://media.example/watch?v=abc123"
        ));
        assert!(!page_matches_target(
            "https://elsewhere.example/watch?v=abc123",
            "https://media.example/watch?v=abc123"
        ));
        assert!(!page_matches_target("not a url", TARGET));
    }

    #[test]
    fn test_login_config_debug_redacts_password() {
        let config = LoginConfig::new("bot@example.com", "hunter2");
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_auth_error_display_names_stage() {
        let error = AuthError {
            stage: LoginFlowState::HomepageConfirmed,
            kind: AuthErrorKind::TargetMismatch {
                expected: "https://a/".to_string(),
                actual: "https://b/".to_string(),
            },
        };
        let msg = error.to_string();
        assert!(msg.contains("homepage-confirmed"), "got: {msg}");
    }
}
