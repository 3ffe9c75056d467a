//! Authenticated-session capture and cookie export.
//!
//! Drives a browser through the provider login flow, captures the session
//! cookie set, and serializes it in the Netscape cookie-jar format for the
//! external media tool.

mod browser;
mod export;
mod flow;
mod webdriver;

pub use browser::{BrowserError, BrowserSession, PageDialog};
pub use export::{ExportError, SessionCookie, cookie_line, write_cookie_file};
pub use flow::{
    AuthError, AuthErrorKind, FlowSelectors, FlowTimeouts, LoginConfig, LoginFlowState,
    SessionAuthenticator,
};
pub use webdriver::{WebDriverConfig, WebDriverSession};
