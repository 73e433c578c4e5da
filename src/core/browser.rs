use crate::core::Config;
use crate::errors::Result;
use crate::session_store::CookieRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// How a connection to the browser was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    /// Connected to a browser that was already running; never torn down.
    Existing,
    /// Launched by this process; may be closed when the run ends.
    Launched,
}

/// Abstraction over a controllable browser.
///
/// The workflow engine and element locator are generic over this trait so
/// they can be exercised against a scripted mock in tests. The production
/// implementation is [`crate::browser::ChromeBrowser`].
#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Attach to a browser already listening on the configured remote-debug
    /// address. Preferred over launching because it leaves a user's open
    /// windows and login state untouched.
    async fn attach(&mut self, config: &Config) -> Result<()>;

    /// Launch a new browser instance with a dedicated profile directory.
    async fn launch(&mut self, config: &Config) -> Result<()>;

    /// Create a new tab/page.
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL and wait for the initial load.
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Execute JavaScript in the page and return its JSON result.
    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Submit a local file path to a file-input element.
    async fn set_file_input(
        &self,
        tab: &Self::TabHandle,
        selector: &str,
        path: &Path,
    ) -> Result<()>;

    /// Read all cookies visible to the current page.
    async fn get_cookies(&self, tab: &Self::TabHandle) -> Result<Vec<CookieRecord>>;

    /// Install cookies into the browser before/after navigation.
    async fn set_cookies(&self, tab: &Self::TabHandle, cookies: &[CookieRecord]) -> Result<()>;

    /// Take a screenshot of the visible viewport.
    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>>;

    /// Get current URL.
    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Get page title.
    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String>;

    /// How this browser connection was obtained.
    fn attach_mode(&self) -> AttachMode;

    /// Check if the browser connection is still alive.
    fn is_running(&self) -> bool;

    /// Close the browser. Implementations must refuse to terminate a
    /// browser they merely attached to.
    async fn close(&mut self) -> Result<()>;
}
