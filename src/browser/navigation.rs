use crate::core::BrowserTrait;
use crate::errors::Result;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct NavigationManager;

/// Probe executed repeatedly until the document settles.
const READINESS_PROBE: &str = r#"
    (function() {
        return {
            readyState: document.readyState,
            url: window.location.href,
            bodyLength: document.body ? document.body.innerText.trim().length : 0
        };
    })()
"#;

impl NavigationManager {
    /// Wait for the current navigation to settle: `document.readyState`
    /// reaching `complete` with a non-empty body.
    ///
    /// Timing out is not an error. Heavy pages keep streaming long after
    /// they are usable, so the caller gets the last observed state and the
    /// subsequent locate steps decide whether the page is actually dead.
    pub async fn wait_for_navigation_complete<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let mut last = NavigationResult {
            url: String::new(),
            ready_state: String::new(),
            has_content: false,
            elapsed_ms: 0,
        };

        loop {
            if let Ok(value) = browser.execute_script(tab, READINESS_PROBE).await {
                if let Some(obj) = value.as_object() {
                    last.url = obj
                        .get("url")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    last.ready_state = obj
                        .get("readyState")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    last.has_content = obj
                        .get("bodyLength")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0)
                        > 0;
                }
            }
            last.elapsed_ms = start.elapsed().as_millis() as u64;

            if last.ready_state == "complete" && last.has_content {
                debug!(
                    "navigation: settled at {} after {}ms",
                    last.url, last.elapsed_ms
                );
                return Ok(last);
            }
            if start.elapsed() >= timeout {
                warn!(
                    "navigation: not settled after {}ms (readyState={:?}), continuing anyway",
                    timeout_ms, last.ready_state
                );
                return Ok(last);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub ready_state: String,
    pub has_content: bool,
    pub elapsed_ms: u64,
}

impl NavigationResult {
    pub fn settled(&self) -> bool {
        self.ready_state == "complete" && self.has_content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBrowser;
    use serde_json::json;

    #[tokio::test]
    async fn completes_when_document_ready() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://example.com/", "bodyLength": 42 }),
        );
        let tab = ();

        let result = NavigationManager::wait_for_navigation_complete(&browser, &tab, 5_000)
            .await
            .unwrap();
        assert!(result.settled());
        assert_eq!(result.url, "https://example.com/");
    }

    #[tokio::test]
    async fn timeout_returns_last_observed_state() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "loading", "url": "https://example.com/", "bodyLength": 0 }),
        );
        let tab = ();

        let result = NavigationManager::wait_for_navigation_complete(&browser, &tab, 100)
            .await
            .unwrap();
        assert!(!result.settled());
        assert_eq!(result.ready_state, "loading");
    }
}
