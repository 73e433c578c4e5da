//! Test doubles for exercising workflows without a real browser.
//!
//! [`MockBrowser`] implements [`BrowserTrait`] against a table of scripted
//! responses: each stub pairs a substring with the JSON value returned when
//! an executed script contains it. Unstubbed scripts evaluate to `null`,
//! which every caller treats as "no result".

use crate::core::{AttachMode, BrowserTrait, Config};
use crate::errors::Result;
use crate::session_store::CookieRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    stubs: Vec<(String, Value)>,
    url: String,
    title: String,
    navigations: Vec<String>,
    uploaded_files: Vec<(String, PathBuf)>,
    cookies: Vec<CookieRecord>,
}

/// Scripted in-memory stand-in for a browser connection.
pub struct MockBrowser {
    state: Mutex<MockState>,
    script_calls: AtomicUsize,
    attach_mode: AttachMode,
    unreachable: bool,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
            script_calls: AtomicUsize::new(0),
            attach_mode: AttachMode::Launched,
            unreachable: false,
        }
    }

    pub fn attached() -> Self {
        Self {
            attach_mode: AttachMode::Existing,
            ..Self::new()
        }
    }

    /// A browser that can neither be attached to nor launched, for
    /// exercising session-acquisition failure paths.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    /// Register a response: any executed script containing `marker` returns
    /// `response`. Stubs are checked in registration order, first hit wins.
    pub fn stub_script(&self, marker: impl Into<String>, response: Value) {
        self.state
            .lock()
            .unwrap()
            .stubs
            .push((marker.into(), response));
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.lock().unwrap().url = url.into();
    }

    pub fn set_cookies_available(&self, cookies: Vec<CookieRecord>) {
        self.state.lock().unwrap().cookies = cookies;
    }

    pub fn script_calls(&self) -> usize {
        self.script_calls.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn uploaded_files(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().uploaded_files.clone()
    }

    pub fn injected_cookies(&self) -> Vec<CookieRecord> {
        self.state.lock().unwrap().cookies.clone()
    }
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserTrait for MockBrowser {
    type TabHandle = ();

    async fn attach(&mut self, _config: &Config) -> Result<()> {
        if self.unreachable {
            return Err(crate::errors::PublishError::AttachFailed(
                "nothing listening on the debug address".into(),
            ));
        }
        self.attach_mode = AttachMode::Existing;
        Ok(())
    }

    async fn launch(&mut self, _config: &Config) -> Result<()> {
        if self.unreachable {
            return Err(crate::errors::PublishError::LaunchFailed(
                "browser binary unavailable".into(),
            ));
        }
        self.attach_mode = AttachMode::Launched;
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        Ok(())
    }

    async fn navigate(&self, _tab: &Self::TabHandle, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn execute_script(&self, _tab: &Self::TabHandle, script: &str) -> Result<Value> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        for (marker, response) in &state.stubs {
            if script.contains(marker.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(Value::Null)
    }

    async fn set_file_input(
        &self,
        _tab: &Self::TabHandle,
        selector: &str,
        path: &Path,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .uploaded_files
            .push((selector.to_string(), path.to_path_buf()));
        Ok(())
    }

    async fn get_cookies(&self, _tab: &Self::TabHandle) -> Result<Vec<CookieRecord>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, _tab: &Self::TabHandle, cookies: &[CookieRecord]) -> Result<()> {
        self.state.lock().unwrap().cookies = cookies.to_vec();
        Ok(())
    }

    async fn take_screenshot(&self, _tab: &Self::TabHandle) -> Result<Vec<u8>> {
        Ok(vec![])
    }

    async fn get_url(&self, _tab: &Self::TabHandle) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn get_title(&self, _tab: &Self::TabHandle) -> Result<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    fn attach_mode(&self) -> AttachMode {
        self.attach_mode
    }

    fn is_running(&self) -> bool {
        true
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_matching_stub_wins() {
        tokio_test::block_on(async {
            let browser = MockBrowser::new();
            browser.stub_script("marker", json!({ "hit": 1 }));
            browser.stub_script("marker", json!({ "hit": 2 }));

            let value = browser
                .execute_script(&(), "probe with marker inside")
                .await
                .unwrap();
            assert_eq!(value, json!({ "hit": 1 }));
            assert_eq!(browser.script_calls(), 1);
        });
    }

    #[test]
    fn unstubbed_scripts_evaluate_to_null() {
        tokio_test::block_on(async {
            let browser = MockBrowser::new();
            let value = browser.execute_script(&(), "anything").await.unwrap();
            assert!(value.is_null());
        });
    }
}
