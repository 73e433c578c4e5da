use crate::browser::NavigationManager;
use crate::core::{BrowserTrait, Config};
use crate::dom::DomInspector;
use crate::errors::{PublishError, Result};
use crate::locator::{ElementLocator, LocatedElement, SemanticRole};
use crate::platforms::PlatformSpec;
use crate::session_store::{PersistedSession, SessionStore};
use crate::types::{CancelFlag, PublishRequest, WorkflowResult};
use crate::workflow::WorkflowState;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const AUTH_POLL_MS: u64 = 3_000;
const PROCESSING_POLL_MS: u64 = 2_000;

/// Drives one platform's publish state machine over a live browser tab.
///
/// Every fallible step funnels through [`PublishWorkflow::run`], which
/// converts errors into a `WorkflowResult` at this boundary. Nothing here
/// raises across to the coordinator, so one platform's failure can never
/// abort another's run.
pub struct PublishWorkflow<'a, B: BrowserTrait> {
    browser: &'a B,
    tab: &'a B::TabHandle,
    spec: &'a PlatformSpec,
    config: &'a Config,
    store: &'a SessionStore,
    locator: ElementLocator,
    cancel: CancelFlag,
    state: WorkflowState,
}

impl<'a, B: BrowserTrait> PublishWorkflow<'a, B> {
    pub fn new(
        browser: &'a B,
        tab: &'a B::TabHandle,
        spec: &'a PlatformSpec,
        config: &'a Config,
        store: &'a SessionStore,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            browser,
            tab,
            spec,
            config,
            store,
            locator: ElementLocator::new(config.timeouts.poll_interval_ms),
            cancel,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Run the full pipeline. Errors become `Done(failure)` results here.
    pub async fn run(&mut self, request: &PublishRequest) -> WorkflowResult {
        info!("workflow[{}]: starting publish", self.spec.name);
        match self.execute(request).await {
            Ok(result) => {
                self.transition(WorkflowState::Done);
                info!(
                    "workflow[{}]: finished with outcome {:?}",
                    self.spec.name, result.outcome
                );
                result
            }
            Err(e) => {
                warn!(
                    "workflow[{}]: failed while {}: {}",
                    self.spec.name, self.state, e
                );
                self.capture_failure_snapshot().await;
                self.transition(WorkflowState::Done);
                WorkflowResult::failed(self.spec.name, e.kind(), e.to_string())
            }
        }
    }

    /// Run only the authentication leg: navigate to the entry page, restore
    /// a stored session or wait for a manual login, then persist whatever
    /// cookies the browser now holds. Lets a human prepare logins ahead of
    /// an unattended batch publish.
    pub async fn capture_login(&mut self) -> Result<()> {
        self.transition(WorkflowState::Authenticating);
        let outcome = self.authenticate().await;
        if outcome.is_ok() {
            self.persist_session().await;
        }
        self.transition(WorkflowState::Done);
        outcome
    }

    async fn execute(&mut self, request: &PublishRequest) -> Result<WorkflowResult> {
        self.transition(WorkflowState::Authenticating);
        self.authenticate().await?;

        self.transition(WorkflowState::Uploading);
        self.upload(&request.video_path).await?;

        self.transition(WorkflowState::WaitingForProcessing);
        self.wait_for_processing().await?;

        self.transition(WorkflowState::FillingMetadata);
        self.fill_metadata(request).await?;

        self.transition(WorkflowState::Submitting);
        self.submit().await?;

        self.transition(WorkflowState::VerifyingResult);
        let result = self.verify().await?;

        if result.succeeded() {
            self.persist_session().await;
        }
        Ok(result)
    }

    fn transition(&mut self, next: WorkflowState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("workflow[{}]: {} -> {}", self.spec.name, self.state, next);
        self.state = next;
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PublishError::Cancelled)
        } else {
            Ok(())
        }
    }

    // ── Authenticating ──────────────────────────────────────────────────

    async fn authenticate(&mut self) -> Result<()> {
        self.check_cancelled()?;
        self.browser.navigate(self.tab, self.spec.entry_url).await?;
        NavigationManager::wait_for_navigation_complete(
            self.browser,
            self.tab,
            self.config.timeouts.navigation_ms,
        )
        .await?;

        if self.is_authenticated().await {
            info!("workflow[{}]: already authenticated", self.spec.name);
            return Ok(());
        }

        // Try restoring a persisted session before bothering the human.
        if let Ok(Some(session)) = self.store.load(self.spec.name).await {
            info!(
                "workflow[{}]: restoring session saved at {}",
                self.spec.name, session.saved_at
            );
            if let Err(e) = self.browser.set_cookies(self.tab, &session.cookies).await {
                warn!("workflow[{}]: cookie injection failed: {}", self.spec.name, e);
            }
            self.restore_local_storage(&session.local_storage).await;
            self.browser.navigate(self.tab, self.spec.entry_url).await?;
            NavigationManager::wait_for_navigation_complete(
                self.browser,
                self.tab,
                self.config.timeouts.navigation_ms,
            )
            .await?;

            if self.is_authenticated().await {
                info!("workflow[{}]: 🎉 session restore succeeded", self.spec.name);
                return Ok(());
            }
            warn!(
                "workflow[{}]: restored session is stale, clearing it",
                self.spec.name
            );
            let _ = self.store.clear(self.spec.name).await;
        }

        // Bounded wait for a human to complete the login in the visible tab.
        info!(
            "workflow[{}]: not authenticated, waiting up to {}ms for manual login",
            self.spec.name, self.config.timeouts.auth_ms
        );
        let deadline = Instant::now() + Duration::from_millis(self.config.timeouts.auth_ms);
        loop {
            self.check_cancelled()?;
            if self.is_authenticated().await {
                info!("workflow[{}]: manual login detected", self.spec.name);
                self.persist_session().await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PublishError::AuthenticationTimeout(
                    self.config.timeouts.auth_ms,
                ));
            }
            tokio::time::sleep(Duration::from_millis(AUTH_POLL_MS.min(
                self.config.timeouts.auth_ms.max(1),
            )))
            .await;
        }
    }

    /// Login detection: a login-wall URL or a visible login affordance means
    /// unauthenticated; a reachable upload control means authenticated.
    async fn is_authenticated(&self) -> bool {
        let url = self
            .browser
            .get_url(self.tab)
            .await
            .unwrap_or_default()
            .to_lowercase();
        if self
            .spec
            .login_url_keywords
            .iter()
            .any(|kw| url.contains(&kw.to_lowercase()))
        {
            return false;
        }

        if let Some(found) = self
            .locate_optional(
                SemanticRole::FileInput,
                Duration::from_millis(self.config.timeouts.per_step_ms),
            )
            .await
        {
            debug!(
                "workflow[{}]: upload control reachable ({})",
                self.spec.name, found.selector
            );
            return true;
        }

        self.locate_optional(SemanticRole::LoginIndicator, Duration::ZERO)
            .await
            .is_none()
    }

    async fn restore_local_storage(&self, storage: &HashMap<String, String>) {
        if storage.is_empty() {
            return;
        }
        let Ok(payload) = serde_json::to_string(storage) else {
            return;
        };
        let script = format!(
            r#"
            (function() {{
                const entries = {payload};
                let count = 0;
                try {{
                    for (const [key, value] of Object.entries(entries)) {{
                        localStorage.setItem(key, value);
                        count++;
                    }}
                    return {{ success: true, count: count }};
                }} catch (error) {{
                    return {{ success: false, error: error.message }};
                }}
            }})()
            "#
        );
        if let Err(e) = self.browser.execute_script(self.tab, &script).await {
            warn!(
                "workflow[{}]: localStorage restore failed: {}",
                self.spec.name, e
            );
        }
    }

    // ── Uploading ───────────────────────────────────────────────────────

    async fn upload(&mut self, video_path: &Path) -> Result<()> {
        self.check_cancelled()?;
        let input = self.locate_required(SemanticRole::FileInput).await?;
        info!(
            "workflow[{}]: submitting {} to {}",
            self.spec.name,
            video_path.display(),
            input.selector
        );

        if let Err(first_err) = self
            .browser
            .set_file_input(self.tab, &input.selector, video_path)
            .await
        {
            // Some upload widgets only wire their input after the drop zone
            // is poked once.
            warn!(
                "workflow[{}]: direct file set failed ({}), nudging the upload area",
                self.spec.name, first_err
            );
            self.dispatch_click(&input.selector).await;
            self.browser
                .set_file_input(self.tab, &input.selector, video_path)
                .await?;
        }

        // Fire the events a real file pick would have produced.
        self.dispatch_change_events(&input.selector).await;
        Ok(())
    }

    async fn dispatch_change_events(&self, selector: &str) {
        let Ok(selector_js) = serde_json::to_string(selector) else {
            return;
        };
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector_js});
                if (!el) return {{ success: false, error: 'element gone' }};
                ['input', 'change'].forEach(type => {{
                    el.dispatchEvent(new Event(type, {{ bubbles: true, cancelable: true }}));
                }});
                return {{ success: true }};
            }})()
            "#
        );
        let _ = self.browser.execute_script(self.tab, &script).await;
    }

    // ── WaitingForProcessing ────────────────────────────────────────────

    /// Server-side transcode wait. Completion signals, any of: a populated
    /// preview element, the title field becoming reachable, the progress
    /// indicator disappearing after the page settled.
    async fn wait_for_processing(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.processing_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout);
        info!(
            "workflow[{}]: waiting for processing (up to {}ms)",
            self.spec.name, timeout
        );

        loop {
            self.check_cancelled()?;

            if let Some(banner) = self
                .locate_optional(SemanticRole::ErrorBanner, Duration::ZERO)
                .await
            {
                return Err(PublishError::UploadFailed(format!(
                    "platform reported an error during upload: {}",
                    banner.text.unwrap_or_else(|| banner.selector.clone())
                )));
            }

            let progress_visible = self
                .locate_optional(SemanticRole::ProgressIndicator, Duration::ZERO)
                .await
                .is_some();
            if !progress_visible {
                let preview = self
                    .locate_optional(SemanticRole::VideoPreview, Duration::ZERO)
                    .await;
                let title_ready = self
                    .locate_optional(SemanticRole::TitleField, Duration::ZERO)
                    .await;
                if preview.is_some() || title_ready.is_some() {
                    info!("workflow[{}]: processing complete", self.spec.name);
                    return Ok(());
                }
            }

            if Instant::now() >= deadline {
                return Err(PublishError::UploadTimeout(timeout));
            }
            tokio::time::sleep(Duration::from_millis(
                PROCESSING_POLL_MS.min(timeout.max(1)),
            ))
            .await;
        }
    }

    // ── FillingMetadata ─────────────────────────────────────────────────

    async fn fill_metadata(&mut self, request: &PublishRequest) -> Result<()> {
        self.check_cancelled()?;

        let title = truncate_chars(&request.title, self.spec.title_limit);
        let title_field = self.locate_required(SemanticRole::TitleField).await?;
        self.set_text(&title_field, &title).await?;
        info!("workflow[{}]: title set ({} chars)", self.spec.name, title.chars().count());

        let description = compose_description(
            &request.description,
            &request.tags,
            self.spec.tags_in_description,
            self.spec.description_limit,
        );
        if !description.is_empty() {
            match self
                .locate_optional(
                    SemanticRole::DescriptionField,
                    Duration::from_millis(self.config.timeouts.per_step_ms),
                )
                .await
            {
                Some(field) => {
                    if let Err(e) = self.set_text(&field, &description).await {
                        warn!(
                            "workflow[{}]: description not set: {}",
                            self.spec.name, e
                        );
                    }
                }
                None => warn!(
                    "workflow[{}]: no description field found, skipping",
                    self.spec.name
                ),
            }
        }

        if !self.spec.tags_in_description && !request.tags.is_empty() {
            self.fill_tags(&request.tags).await;
        }

        if let Some(cover) = &request.cover_path {
            self.upload_cover(cover).await;
        }
        Ok(())
    }

    /// Custom covers are optional everywhere; a platform-generated thumbnail
    /// is an acceptable fallback, so failures only warn.
    async fn upload_cover(&self, cover_path: &Path) {
        let Some(input) = self
            .locate_optional(
                SemanticRole::CoverInput,
                Duration::from_millis(self.config.timeouts.per_step_ms),
            )
            .await
        else {
            warn!(
                "workflow[{}]: no cover input found, keeping generated thumbnail",
                self.spec.name
            );
            return;
        };
        match self
            .browser
            .set_file_input(self.tab, &input.selector, cover_path)
            .await
        {
            Ok(()) => {
                self.dispatch_change_events(&input.selector).await;
                info!(
                    "workflow[{}]: cover submitted from {}",
                    self.spec.name,
                    cover_path.display()
                );
            }
            Err(e) => warn!("workflow[{}]: cover upload failed: {}", self.spec.name, e),
        }
    }

    /// Dedicated tag inputs take one tag per Enter press. Best effort; tags
    /// never fail a publish.
    async fn fill_tags(&self, tags: &[String]) {
        let timeout = Duration::from_millis(self.config.timeouts.per_step_ms);
        let mut field = self.locate_optional(SemanticRole::TagField, timeout).await;
        if field.is_none() {
            // The tag input may sit behind a collapsed advanced-options
            // section; expand it and look again.
            if let Some(toggle) = self
                .locate_optional(SemanticRole::AdvancedToggle, Duration::ZERO)
                .await
            {
                debug!(
                    "workflow[{}]: expanding {} before retrying tag field",
                    self.spec.name, toggle.selector
                );
                self.dispatch_click(&toggle.selector).await;
                field = self.locate_optional(SemanticRole::TagField, timeout).await;
            }
        }
        let Some(field) = field else {
            warn!("workflow[{}]: no tag field found, skipping tags", self.spec.name);
            return;
        };
        let Ok(selector_js) = serde_json::to_string(&field.selector) else {
            return;
        };
        for tag in tags.iter().take(10) {
            let Ok(tag_js) = serde_json::to_string(tag) else {
                continue;
            };
            let script = format!(
                r#"
                (function() {{
                    const el = document.querySelector({selector_js});
                    if (!el) return {{ success: false }};
                    el.focus();
                    el.value = {tag_js};
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    el.dispatchEvent(new KeyboardEvent('keydown', {{ key: 'Enter', bubbles: true }}));
                    el.dispatchEvent(new KeyboardEvent('keyup', {{ key: 'Enter', bubbles: true }}));
                    return {{ success: true }};
                }})()
                "#
            );
            let _ = self.browser.execute_script(self.tab, &script).await;
        }
    }

    /// Plain inputs take a value assignment plus input/change events; rich
    /// editable regions need text-node injection and an InputEvent instead.
    async fn set_text(&self, element: &LocatedElement, text: &str) -> Result<()> {
        let selector_js = serde_json::to_string(&element.selector)?;
        let text_js = serde_json::to_string(text)?;
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector_js});
                if (!el) return {{ success: false, error: 'element gone' }};
                try {{
                    el.focus();
                    const tag = el.tagName.toLowerCase();
                    if (tag === 'input' || tag === 'textarea') {{
                        el.value = {text_js};
                        el.dispatchEvent(new Event('input', {{ bubbles: true, cancelable: true }}));
                        el.dispatchEvent(new Event('change', {{ bubbles: true, cancelable: true }}));
                    }} else {{
                        el.textContent = {text_js};
                        el.dispatchEvent(new InputEvent('input', {{
                            bubbles: true,
                            cancelable: true,
                            inputType: 'insertText',
                            data: {text_js}
                        }}));
                    }}
                    el.dispatchEvent(new Event('blur', {{ bubbles: true }}));
                    return {{ success: true, finalValue: (el.value || el.textContent || '').slice(0, 50) }};
                }} catch (error) {{
                    return {{ success: false, error: error.message }};
                }}
            }})()
            "#
        );
        let result = self.browser.execute_script(self.tab, &script).await?;
        if explicit_failure(&result) {
            return Err(PublishError::JavaScriptFailed(format!(
                "could not set text on {}: {}",
                element.selector,
                failure_message(&result)
            )));
        }
        Ok(())
    }

    // ── Submitting ──────────────────────────────────────────────────────

    async fn submit(&mut self) -> Result<()> {
        self.check_cancelled()?;
        let button = self.locate_required(SemanticRole::SubmitButton).await?;
        info!(
            "workflow[{}]: invoking submit via {}",
            self.spec.name, button.selector
        );

        if self.dispatch_click(&button.selector).await {
            return Ok(());
        }
        warn!(
            "workflow[{}]: direct click did not register, trying synthetic events",
            self.spec.name
        );
        if self.dispatch_synthetic_click(&button.selector).await {
            return Ok(());
        }
        warn!(
            "workflow[{}]: synthetic click failed too, trying keyboard submit",
            self.spec.name
        );
        if self.dispatch_keyboard_submit().await {
            return Ok(());
        }
        Err(PublishError::JavaScriptFailed(format!(
            "submit activation failed on {}",
            button.selector
        )))
    }

    async fn dispatch_click(&self, selector: &str) -> bool {
        let Ok(selector_js) = serde_json::to_string(selector) else {
            return false;
        };
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector_js});
                if (!el) return {{ success: false, error: 'element gone' }};
                try {{
                    el.scrollIntoView({{ behavior: 'smooth', block: 'center' }});
                    el.focus();
                    el.click();
                    return {{ success: true }};
                }} catch (error) {{
                    return {{ success: false, error: error.message }};
                }}
            }})()
            "#
        );
        match self.browser.execute_script(self.tab, &script).await {
            Ok(result) => !explicit_failure(&result),
            Err(_) => false,
        }
    }

    async fn dispatch_synthetic_click(&self, selector: &str) -> bool {
        let Ok(selector_js) = serde_json::to_string(selector) else {
            return false;
        };
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector_js});
                if (!el) return {{ success: false, error: 'element gone' }};
                try {{
                    const rect = el.getBoundingClientRect();
                    const x = rect.left + rect.width / 2;
                    const y = rect.top + rect.height / 2;
                    ['mousedown', 'mouseup', 'click'].forEach(type => {{
                        el.dispatchEvent(new MouseEvent(type, {{
                            bubbles: true,
                            cancelable: true,
                            clientX: x,
                            clientY: y
                        }}));
                    }});
                    return {{ success: true }};
                }} catch (error) {{
                    return {{ success: false, error: error.message }};
                }}
            }})()
            "#
        );
        match self.browser.execute_script(self.tab, &script).await {
            Ok(result) => !explicit_failure(&result),
            Err(_) => false,
        }
    }

    async fn dispatch_keyboard_submit(&self) -> bool {
        let script = r#"
            (function() {
                try {
                    const opts = { key: 'Enter', code: 'Enter', ctrlKey: true, bubbles: true };
                    document.activeElement.dispatchEvent(new KeyboardEvent('keydown', opts));
                    document.activeElement.dispatchEvent(new KeyboardEvent('keyup', opts));
                    return { success: true };
                } catch (error) {
                    return { success: false, error: error.message };
                }
            })()
        "#;
        match self.browser.execute_script(self.tab, script).await {
            Ok(result) => !explicit_failure(&result),
            Err(_) => false,
        }
    }

    // ── VerifyingResult ─────────────────────────────────────────────────

    /// Bounded scan for success and failure signals. Platforms redirect
    /// asynchronously, so an inconclusive window is reported as a qualified
    /// success rather than a failure.
    async fn verify(&mut self) -> Result<WorkflowResult> {
        let timeout = self.config.timeouts.verify_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout);

        loop {
            self.check_cancelled()?;

            if let Some(banner) = self
                .locate_optional(SemanticRole::ErrorBanner, Duration::ZERO)
                .await
            {
                let detail = banner.text.unwrap_or_else(|| banner.selector.clone());
                warn!(
                    "workflow[{}]: platform rejected the publish: {}",
                    self.spec.name, detail
                );
                return Ok(WorkflowResult::failed(
                    self.spec.name,
                    crate::types::ErrorKind::Internal,
                    format!("platform reported failure: {}", detail),
                ));
            }

            if self
                .locate_optional(SemanticRole::SuccessBanner, Duration::ZERO)
                .await
                .is_some()
            {
                let url = self.browser.get_url(self.tab).await.unwrap_or_default();
                let video_id = self.extract_video_id(&url);
                return Ok(WorkflowResult::confirmed(
                    self.spec.name,
                    "publish confirmed by platform",
                )
                .with_remote(video_id, Some(url)));
            }

            let url = self.browser.get_url(self.tab).await.unwrap_or_default();
            if self
                .spec
                .success_url_keywords
                .iter()
                .any(|kw| url.contains(kw))
            {
                let video_id = self.extract_video_id(&url);
                return Ok(WorkflowResult::confirmed(
                    self.spec.name,
                    "publish confirmed by redirect",
                )
                .with_remote(video_id, Some(url)));
            }

            if Instant::now() >= deadline {
                info!(
                    "workflow[{}]: no confirmation within {}ms, reporting qualified success",
                    self.spec.name, timeout
                );
                return Ok(WorkflowResult::unconfirmed(
                    self.spec.name,
                    "publish invoked; result could not be confirmed within the window",
                ));
            }
            tokio::time::sleep(Duration::from_millis(
                self.config.timeouts.poll_interval_ms.max(100).min(timeout.max(1)),
            ))
            .await;
        }
    }

    fn extract_video_id(&self, url: &str) -> Option<String> {
        extract_video_id(self.spec.video_id_pattern?, url)
    }

    // ── Session persistence ─────────────────────────────────────────────

    /// Capture cookies and localStorage into the session store. Best
    /// effort; losing a session only costs the next run a manual login.
    async fn persist_session(&self) {
        let cookies = match self.browser.get_cookies(self.tab).await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(
                    "workflow[{}]: cookie capture failed: {}",
                    self.spec.name, e
                );
                return;
            }
        };
        let storage = self.capture_local_storage().await;
        let url = self.browser.get_url(self.tab).await.unwrap_or_default();
        let session = PersistedSession::new(
            self.spec.name,
            cookies,
            storage,
            url,
            self.spec.session_expiry_hours,
        );
        if let Err(e) = self.store.save(&session).await {
            warn!(
                "workflow[{}]: session persistence failed: {}",
                self.spec.name, e
            );
        }
    }

    /// Dump a page snapshot (markup summary plus screenshot) next to the
    /// session records so a markup drift that broke a locator can be
    /// diagnosed after the fact.
    async fn capture_failure_snapshot(&self) {
        let Some(dir) = &self.config.store.diagnostics_dir else {
            return;
        };
        let snapshot = match DomInspector::capture(self.browser, self.tab, true).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "workflow[{}]: failure snapshot capture failed: {}",
                    self.spec.name, e
                );
                return;
            }
        };
        let path = dir.join(format!(
            "{}-{}.json",
            self.spec.name,
            snapshot.timestamp.format("%Y%m%dT%H%M%S")
        ));
        let write = std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap_or_default()));
        match write {
            Ok(()) => info!(
                "workflow[{}]: failure snapshot written to {}",
                self.spec.name,
                path.display()
            ),
            Err(e) => warn!(
                "workflow[{}]: failure snapshot not written: {}",
                self.spec.name, e
            ),
        }
    }

    async fn capture_local_storage(&self) -> HashMap<String, String> {
        let script = r#"
            (function() {
                const storage = {};
                for (let i = 0; i < localStorage.length; i++) {
                    const key = localStorage.key(i);
                    if (key) {
                        storage[key] = localStorage.getItem(key);
                    }
                }
                return storage;
            })()
        "#;
        match self.browser.execute_script(self.tab, script).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    // ── Locator plumbing ────────────────────────────────────────────────

    async fn locate_required(&self, role: SemanticRole) -> Result<LocatedElement> {
        let spec = self
            .spec
            .locator(role)
            .ok_or_else(|| PublishError::ElementNotFound(role.to_string()))?;
        self.locator
            .locate(
                self.browser,
                self.tab,
                spec,
                Duration::from_millis(self.config.timeouts.per_step_ms),
            )
            .await?
            .ok_or_else(|| PublishError::ElementNotFound(role.to_string()))
    }

    async fn locate_optional(&self, role: SemanticRole, timeout: Duration) -> Option<LocatedElement> {
        let spec = self.spec.locator(role)?;
        self.locator
            .locate(self.browser, self.tab, spec, timeout)
            .await
            .ok()
            .flatten()
    }
}

fn explicit_failure(result: &Value) -> bool {
    result.get("success").and_then(|v| v.as_bool()) == Some(false)
}

fn failure_message(result: &Value) -> String {
    result
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

/// Char-boundary-safe truncation; platform limits are counted in characters,
/// and most of these platforms use CJK text.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Merge description and tags. Platforms without a dedicated tag control
/// receive tags appended as `#tag` tokens, still within the length limit.
pub fn compose_description(
    description: &str,
    tags: &[String],
    tags_in_description: bool,
    limit: usize,
) -> String {
    let mut text = description.trim().to_string();
    if tags_in_description && !tags.is_empty() {
        let tag_line = tags
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("#{}", t.trim()))
            .collect::<Vec<_>>()
            .join(" ");
        if !tag_line.is_empty() {
            if text.is_empty() {
                text = tag_line;
            } else {
                text = format!("{}\n{}", text, tag_line);
            }
        }
    }
    truncate_chars(&text, limit)
}

pub fn extract_video_id(pattern: &str, url: &str) -> Option<String> {
    let re = regex::Regex::new(pattern).ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TimeoutConfig;
    use crate::platforms;
    use crate::session_store::{CookieRecord, SessionStore};
    use crate::testing::MockBrowser;
    use crate::types::{ErrorKind, PublishOutcome};
    use serde_json::json;
    use std::path::PathBuf;

    fn fast_config() -> Config {
        Config {
            timeouts: TimeoutConfig {
                per_step_ms: 150,
                poll_interval_ms: 50,
                navigation_ms: 100,
                auth_ms: 300,
                processing_ms: 300,
                verify_ms: 150,
            },
            ..Config::default()
        }
    }

    fn temp_store() -> SessionStore {
        SessionStore::new(
            std::env::temp_dir()
                .join("crosspub-tests")
                .join(uuid::Uuid::new_v4().to_string()),
        )
    }

    fn found(selector: &str, tag: &str, text: &str, editable: bool) -> serde_json::Value {
        json!({
            "found": true,
            "count": 1,
            "selector": selector,
            "tag": tag,
            "text": text,
            "editable": editable
        })
    }

    fn request() -> PublishRequest {
        PublishRequest::new("/tmp/video.mp4", "春日vlog：南方的第一场雨")
            .with_description("记录一场雨后的街头")
            .with_tags(vec!["vlog".into(), "生活".into()])
    }

    /// Stub a page where every douyin step succeeds and the success banner
    /// appears during verification.
    fn stub_happy_douyin(browser: &MockBrowser) {
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://creator.douyin.com/creator-micro/content/upload", "bodyLength": 900 }),
        );
        // Order matters: most specific markers first, since the first
        // matching stub wins.
        browser.stub_script("发布失败", json!({ "found": false, "count": 0 }));
        browser.stub_script("发布成功", found("div.toast", "div", "发布成功", false));
        browser.stub_script("上传中", json!({ "found": false, "count": 0 }));
        browser.stub_script(
            "input[type='file']",
            found("input[type='file']", "input", "", false),
        );
        browser.stub_script("semi-input", found("input.semi-input", "input", "", true));
        browser.stub_script(
            "data-placeholder",
            found("div[data-placeholder='添加作品简介']", "div", "", true),
        );
        // Quoted marker so the bare word inside candidate lists of other
        // probes cannot hit this stub.
        browser.stub_script("\"video\"", found("video", "video", "", false));
        browser.stub_script(
            "发布",
            found("button.semi-button-primary", "button", "发布", false),
        );
        browser.stub_script("localStorage", json!({}));
    }

    #[tokio::test]
    async fn happy_path_publishes_and_persists_session() {
        let browser = MockBrowser::new();
        stub_happy_douyin(&browser);
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let result = workflow.run(&request()).await;

        assert_eq!(result.outcome, PublishOutcome::Confirmed, "{}", result.message);
        assert_eq!(result.platform, "douyin");
        assert_eq!(workflow.state(), WorkflowState::Done);

        let uploads = browser.uploaded_files();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "input[type='file']");

        // Success must leave a persisted session behind.
        assert!(store.load("douyin").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_upload_control_reports_element_not_found() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://creator.douyin.com/creator-micro/content/upload", "bodyLength": 900 }),
        );
        // No other stubs: every probe misses, including the login indicator,
        // so the page passes for authenticated but has no upload control.
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let result = workflow.run(&request()).await;

        assert_eq!(result.outcome, PublishOutcome::Failed);
        assert_eq!(result.error_kind, Some(ErrorKind::ElementNotFound));
        assert!(store.load("douyin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unconfirmed_result_when_no_signal_observed() {
        // Same page as the happy path, except no success banner ever shows
        // and the platform never redirects.
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://creator.douyin.com/creator-micro/content/upload", "bodyLength": 900 }),
        );
        browser.stub_script("发布失败", json!({ "found": false, "count": 0 }));
        browser.stub_script("发布成功", json!({ "found": false, "count": 0 }));
        browser.stub_script("上传中", json!({ "found": false, "count": 0 }));
        browser.stub_script(
            "input[type='file']",
            found("input[type='file']", "input", "", false),
        );
        browser.stub_script("semi-input", found("input.semi-input", "input", "", true));
        browser.stub_script(
            "data-placeholder",
            found("div[data-placeholder='添加作品简介']", "div", "", true),
        );
        browser.stub_script("\"video\"", found("video", "video", "", false));
        browser.stub_script(
            "发布",
            found("button.semi-button-primary", "button", "发布", false),
        );
        browser.stub_script("localStorage", json!({}));

        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let result = workflow.run(&request()).await;

        // Qualified success, not a failure.
        assert_eq!(result.outcome, PublishOutcome::Unconfirmed);
        assert!(result.succeeded());
        // Qualified success still persists the session.
        assert!(store.load("douyin").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cover_is_submitted_when_requested() {
        let browser = MockBrowser::new();
        stub_happy_douyin(&browser);
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut req = request();
        req.cover_path = Some(PathBuf::from("/tmp/cover.png"));

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let result = workflow.run(&req).await;

        assert!(result.succeeded(), "{}", result.message);
        let uploads = browser.uploaded_files();
        assert_eq!(uploads.len(), 2, "video plus cover");
        assert_eq!(uploads[1].1, PathBuf::from("/tmp/cover.png"));
    }

    #[tokio::test]
    async fn failure_writes_diagnostics_snapshot() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "stub", "bodyLength": 900 }),
        );
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let mut config = fast_config();
        let diagnostics_dir = std::env::temp_dir()
            .join("crosspub-tests")
            .join(uuid::Uuid::new_v4().to_string());
        config.store.diagnostics_dir = Some(diagnostics_dir.clone());
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let result = workflow.run(&request()).await;

        assert_eq!(result.outcome, PublishOutcome::Failed);
        let entries: Vec<_> = std::fs::read_dir(&diagnostics_dir)
            .expect("diagnostics dir created")
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]
            .file_name()
            .to_string_lossy()
            .starts_with("douyin-"));
    }

    #[tokio::test]
    async fn cancelled_flag_stops_the_run() {
        let browser = MockBrowser::new();
        stub_happy_douyin(&browser);
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let mut workflow = PublishWorkflow::new(&browser, &tab, &spec, &config, &store, cancel);
        let result = workflow.run(&request()).await;

        assert_eq!(result.outcome, PublishOutcome::Failed);
        assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
        assert!(browser.uploaded_files().is_empty());
    }

    #[tokio::test]
    async fn capture_login_persists_current_session() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://creator.douyin.com/creator-micro/content/upload", "bodyLength": 900 }),
        );
        browser.stub_script(
            "input[type='file']",
            found("input[type='file']", "input", "", false),
        );
        browser.set_cookies_available(vec![CookieRecord {
            name: "sessionid".into(),
            value: "abc".into(),
            domain: ".douyin.com".into(),
            path: "/".into(),
            expires: None,
            http_only: true,
            secure: true,
        }]);
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        workflow.capture_login().await.unwrap();

        assert_eq!(workflow.state(), WorkflowState::Done);
        let session = store.load("douyin").await.unwrap().expect("session stored");
        assert_eq!(session.cookies.len(), 1);
        // Only the login leg ran.
        assert!(browser.uploaded_files().is_empty());
    }

    #[tokio::test]
    async fn capture_login_times_out_on_a_login_wall() {
        let browser = MockBrowser::new();
        browser.stub_script(
            "readyState",
            json!({ "readyState": "complete", "url": "https://creator.douyin.com/creator-micro/content/upload", "bodyLength": 900 }),
        );
        browser.stub_script("登录", found("a.login", "a", "登录", false));
        let tab = ();
        let spec = platforms::by_name("douyin").unwrap();
        let config = fast_config();
        let store = temp_store();

        let mut workflow =
            PublishWorkflow::new(&browser, &tab, &spec, &config, &store, CancelFlag::new());
        let err = workflow.capture_login().await.unwrap_err();

        assert!(matches!(err, PublishError::AuthenticationTimeout(_)));
        assert!(store.load("douyin").await.unwrap().is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("春日vlog记录", 4), "春日vl");
        assert_eq!(truncate_chars("short", 30), "short");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn compose_description_appends_hash_tags() {
        let text = compose_description(
            "记录一场雨",
            &["vlog".into(), "生活".into()],
            true,
            1000,
        );
        assert_eq!(text, "记录一场雨\n#vlog #生活");

        let without = compose_description("记录一场雨", &["vlog".into()], false, 1000);
        assert_eq!(without, "记录一场雨");
    }

    #[test]
    fn compose_description_obeys_limit() {
        let text = compose_description("一二三四五六七八九十", &[], true, 5);
        assert_eq!(text, "一二三四五");
    }

    #[test]
    fn extracts_video_id_from_url() {
        assert_eq!(
            extract_video_id(r"(BV[0-9A-Za-z]{10})", "https://member.bilibili.com/done?bvid=BV1xx411c7mD"),
            Some("BV1xx411c7mD".to_string())
        );
        assert_eq!(
            extract_video_id(r"/video/([\w-]{11})", "https://studio.youtube.com/video/dQw4w9WgXcQ/edit"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id(r"(BV[0-9A-Za-z]{10})", "https://example.com"), None);
    }
}
