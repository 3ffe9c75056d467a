//! W3C WebDriver implementation of the browser capability surface.
//!
//! Talks the WebDriver JSON protocol over HTTP to a locally running driver
//! (chromedriver or compatible). Only the endpoints the login flow needs
//! are implemented.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

use super::browser::{BrowserError, BrowserSession, PageDialog};
use super::export::SessionCookie;
use crate::user_agent;

/// Polling interval while waiting for an element to appear.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Page-load timeout applied to every navigation (milliseconds).
const PAGE_LOAD_TIMEOUT_MS: u64 = 60_000;

/// Element identifier key defined by the WebDriver specification.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Connection settings for the WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// Base URL of the running driver (e.g. `http://127.0.0.1:9515`).
    pub endpoint: String,
    /// User-Agent string presented by the automated browser.
    pub user_agent: String,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9515".to_string(),
            user_agent: user_agent::browser_user_agent().to_string(),
        }
    }
}

/// One live WebDriver session.
///
/// Created with [`connect`](Self::connect); the underlying browser is
/// released by [`close`](BrowserSession::close).
#[derive(Debug)]
pub struct WebDriverSession {
    http: Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverSession {
    /// Starts a new driver session.
    ///
    /// The browser is launched with the configured User-Agent so page
    /// scripts see a realistic client identification string.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Session`] when the driver is unreachable or
    /// rejects the session request.
    #[instrument(skip(config), fields(endpoint = %config.endpoint))]
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, BrowserError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|error| BrowserError::Session(error.to_string()))?;

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": [
                            format!("--user-agent={}", config.user_agent),
                            "--disable-blink-features=AutomationControlled",
                        ]
                    }
                }
            }
        });

        let response = http
            .post(format!("{}/session", config.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                BrowserError::Session(format!("driver unreachable at {}: {error}", config.endpoint))
            })?;
        let value = unwrap_value(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Session("driver returned no session id".to_string()))?
            .to_string();

        debug!(session = %session_id, "webdriver session created");
        let session = Self {
            http,
            endpoint: config.endpoint.clone(),
            session_id,
        };

        // Bound every navigation wait at the driver level.
        session
            .command(
                Method::POST,
                "/timeouts",
                Some(json!({ "pageLoad": PAGE_LOAD_TIMEOUT_MS })),
            )
            .await?;

        Ok(session)
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.endpoint, self.session_id)
    }

    /// Issues one command against the session and unwraps its `value`.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = self.session_url(path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            // WebDriver requires a JSON body on every POST.
            request = request.json(&json!({}));
        }

        let response = request
            .send()
            .await
            .map_err(|error| BrowserError::Session(format!("{url}: {error}")))?;
        unwrap_value(response).await
    }

    /// Looks up an element, mapping "no such element" to `None`.
    async fn find_element(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let body = json!({ "using": "css selector", "value": selector });
        match self.command(Method::POST, "/element", Some(body)).await {
            Ok(value) => {
                let element_id = value
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(ToString::to_string);
                Ok(element_id)
            }
            Err(BrowserError::Session(message)) if message.contains("no such element") => Ok(None),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(|error| BrowserError::Navigation {
                url: url.to_string(),
                reason: error.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find_element(selector).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element_id = self.find_element(selector).await?.ok_or_else(|| {
            BrowserError::Session(format!("element '{selector}' not present for typing"))
        })?;
        self.command(
            Method::POST,
            &format!("/element/{element_id}/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element_id = self.find_element(selector).await?.ok_or_else(|| {
            BrowserError::Session(format!("element '{selector}' not present for click"))
        })?;
        self.command(Method::POST, &format!("/element/{element_id}/click"), None)
            .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| BrowserError::Session("driver returned non-string URL".to_string()))
    }

    async fn execute_script(&mut self, script: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await?;
        Ok(())
    }

    async fn pending_dialog(&mut self) -> Result<Option<PageDialog>, BrowserError> {
        match self.command(Method::GET, "/alert/text", None).await {
            Ok(value) => Ok(value.as_str().map(|message| PageDialog {
                message: message.to_string(),
            })),
            Err(BrowserError::Session(message)) if message.contains("no such alert") => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn dismiss_dialog(&mut self) -> Result<(), BrowserError> {
        self.command(Method::POST, "/alert/dismiss", None).await?;
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<SessionCookie>, BrowserError> {
        let value = self.command(Method::GET, "/cookie", None).await?;
        let wire_cookies: Vec<WireCookie> = serde_json::from_value(value)
            .map_err(|error| BrowserError::Session(format!("invalid cookie payload: {error}")))?;
        Ok(wire_cookies.into_iter().map(SessionCookie::from).collect())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        match self.command(Method::DELETE, "", None).await {
            Ok(_) => Ok(()),
            Err(error) => {
                // The session may already be gone; closing is best-effort.
                warn!(error = %error, "webdriver session delete failed");
                Ok(())
            }
        }
    }
}

/// Parses a WebDriver response envelope and extracts its `value`.
async fn unwrap_value(response: reqwest::Response) -> Result<Value, BrowserError> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|error| BrowserError::Session(format!("invalid driver response: {error}")))?;

    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if status == StatusCode::OK {
        return Ok(value);
    }

    // Error envelope: { "value": { "error": ..., "message": ... } }
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");
    Err(BrowserError::Session(format!(
        "driver error ({status}): {error}: {message}"
    )))
}

/// Cookie object as returned by the WebDriver cookie endpoint.
#[derive(Debug, Deserialize)]
struct WireCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secure: bool,
    /// Epoch seconds; drivers may report fractional values.
    #[serde(default)]
    expiry: Option<f64>,
}

impl From<WireCookie> for SessionCookie {
    fn from(wire: WireCookie) -> Self {
        let domain = wire.domain.unwrap_or_default();
        // A leading dot marks a domain cookie (sent to subdomains); its
        // absence marks a host-only cookie.
        let host_only = !domain.starts_with('.');
        let path = wire
            .path
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| "/".to_string());
        let expires = wire.expiry.map_or(0, normalized_expiry);

        SessionCookie::new(
            domain,
            host_only,
            path,
            wire.secure,
            expires,
            wire.name,
            wire.value,
        )
    }
}

/// Floors a driver-reported expiry to whole epoch seconds.
fn normalized_expiry(raw_expiry: f64) -> u64 {
    if !raw_expiry.is_finite() || raw_expiry <= 0.0 {
        return 0;
    }

    let floored = raw_expiry.floor();
    let integer_text = format!("{floored:.0}");
    // Overflow → treat as far-future (permanent cookie); only reachable with
    // expiry values exceeding u64::MAX.
    integer_text.parse::<u64>().unwrap_or(u64::MAX)
}
