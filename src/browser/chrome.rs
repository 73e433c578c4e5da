use crate::core::{AttachMode, BrowserTrait, Config};
use crate::errors::{PublishError, Result};
use crate::session_store::CookieRecord;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Chrome implementation of [`BrowserTrait`].
///
/// Prefers attaching to a browser the user already has open on the
/// configured remote-debug address; only launches its own instance when the
/// attach probe fails. A connection obtained by attaching is never torn
/// down, because killing it would take the user's windows with it.
pub struct ChromeBrowser {
    browser: Option<Browser>,
    attach_mode: AttachMode,
}

/// What the DevTools HTTP endpoint reports about an already-running browser.
#[derive(Debug, Clone)]
pub struct DebugEndpointInfo {
    pub browser_version: String,
    pub user_agent: String,
    pub ws_url: String,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self {
            browser: None,
            attach_mode: AttachMode::Launched,
        }
    }

    /// Ask the DevTools HTTP endpoint (`GET /json/version`) what is
    /// listening on `debug_address`. Also used as a standalone diagnostic
    /// before a long publish run.
    pub async fn probe_debug_endpoint(debug_address: &str) -> Result<DebugEndpointInfo> {
        let version_url = url::Url::parse(&format!("http://{}/json/version", debug_address))
            .map_err(|e| {
                PublishError::ConfigurationError(format!(
                    "bad debug address '{}': {}",
                    debug_address, e
                ))
            })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .map_err(|e| PublishError::AttachFailed(e.to_string()))?;

        let payload: Value = client
            .get(version_url.clone())
            .send()
            .await
            .map_err(|e| PublishError::AttachFailed(format!("{}: {}", version_url, e)))?
            .json()
            .await
            .map_err(|e| PublishError::AttachFailed(e.to_string()))?;

        let ws_url = payload
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PublishError::AttachFailed(format!(
                    "no webSocketDebuggerUrl in response from {}",
                    version_url
                ))
            })?;

        Ok(DebugEndpointInfo {
            browser_version: payload
                .get("Browser")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            user_agent: payload
                .get("User-Agent")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            ws_url,
        })
    }

    fn browser_ref(&self) -> Result<&Browser> {
        self.browser.as_ref().ok_or(PublishError::NotConnected)
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn attach(&mut self, config: &Config) -> Result<()> {
        let endpoint = Self::probe_debug_endpoint(&config.browser.debug_address).await?;
        info!(
            "chrome: attaching to {} at {}",
            endpoint.browser_version, config.browser.debug_address
        );

        let browser = Browser::connect(endpoint.ws_url)
            .map_err(|e| PublishError::AttachFailed(e.to_string()))?;

        self.browser = Some(browser);
        self.attach_mode = AttachMode::Existing;
        Ok(())
    }

    async fn launch(&mut self, config: &Config) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.browser.viewport.width, config.browser.viewport.height
        );
        let user_agent_arg = config
            .browser
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }
        for arg in &config.browser.extra_args {
            args.push(OsStr::new(arg));
        }

        // Dedicated profile so login state survives across launches.
        std::fs::create_dir_all(&config.browser.profile_dir)?;

        let launch_options = LaunchOptions::default_builder()
            .headless(config.browser.headless)
            .user_data_dir(Some(config.browser.profile_dir.clone()))
            .args(args)
            .build()
            .map_err(|e| PublishError::LaunchFailed(e.to_string()))?;

        info!(
            "chrome: launching new instance (headless={}, profile={})",
            config.browser.headless,
            config.browser.profile_dir.display()
        );
        let browser =
            Browser::new(launch_options).map_err(|e| PublishError::LaunchFailed(e.to_string()))?;

        self.browser = Some(browser);
        self.attach_mode = AttachMode::Launched;
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self.browser_ref()?;
        let tab = browser
            .new_tab()
            .map_err(|e| PublishError::TabCreationFailed(e.to_string()))?;
        Ok(tab)
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        tab.navigate_to(url)
            .map_err(|e| PublishError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| PublishError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let result = tab
            .evaluate(script, false)
            .map_err(|e| PublishError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn set_file_input(
        &self,
        tab: &Self::TabHandle,
        selector: &str,
        path: &Path,
    ) -> Result<()> {
        use headless_chrome::protocol::cdp::DOM::SetFileInputFiles;

        let element = tab
            .find_element(selector)
            .map_err(|e| PublishError::UploadFailed(format!("{}: {}", selector, e)))?;

        tab.call_method(SetFileInputFiles {
            files: vec![path.to_string_lossy().to_string()],
            node_id: None,
            backend_node_id: Some(element.backend_node_id),
            object_id: None,
        })
        .map_err(|e| PublishError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn get_cookies(&self, tab: &Self::TabHandle) -> Result<Vec<CookieRecord>> {
        let cookies = tab
            .get_cookies()
            .map_err(|e| PublishError::Session(e.to_string()))?;
        Ok(cookies
            .into_iter()
            .map(|c| CookieRecord {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                // -1 marks a session-scoped cookie in the protocol.
                expires: if c.expires > 0.0 { Some(c.expires) } else { None },
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn set_cookies(&self, tab: &Self::TabHandle, cookies: &[CookieRecord]) -> Result<()> {
        use headless_chrome::protocol::cdp::Network::CookieParam;

        // Build params via their serde shape so optional protocol fields can
        // stay absent (the same trick the DevTools JSON itself uses).
        let params: Vec<CookieParam> = cookies
            .iter()
            .filter_map(|c| {
                let mut raw = json!({
                    "name": c.name,
                    "value": c.value,
                    "domain": c.domain,
                    "path": c.path,
                    "secure": c.secure,
                    "httpOnly": c.http_only,
                });
                if let Some(expires) = c.expires {
                    raw["expires"] = json!(expires);
                }
                serde_json::from_value::<CookieParam>(raw).ok()
            })
            .collect();

        if params.is_empty() {
            warn!("chrome: no valid cookies to inject");
            return Ok(());
        }

        let count = params.len();
        tab.set_cookies(params)
            .map_err(|e| PublishError::Session(e.to_string()))?;
        info!("chrome: 💉 injected {} cookies", count);
        Ok(())
    }

    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>> {
        let screenshot = tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| PublishError::ScreenshotFailed(e.to_string()))?;
        Ok(screenshot)
    }

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.get_url())
    }

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String> {
        let result = self.execute_script(tab, "document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    fn attach_mode(&self) -> AttachMode {
        self.attach_mode
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        match self.attach_mode {
            AttachMode::Existing => {
                // Dropping the handle only closes our websocket; the user's
                // browser keeps running.
                info!("chrome: detaching from user browser, leaving it running");
            }
            AttachMode::Launched => {
                info!("chrome: shutting down launched instance");
            }
        }
        self.browser = None;
        Ok(())
    }
}
