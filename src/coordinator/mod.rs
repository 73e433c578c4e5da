//! Fan-out of one publish request across platforms.
//!
//! The coordinator owns the request for the duration of a call: it resolves
//! each requested platform's spec, makes sure a browser session exists, runs
//! the platform workflow and collects exactly one `WorkflowResult` per
//! platform. A platform failure is data, not an exception; the only hard
//! error is being unable to produce any browser session at all.

use crate::browser::manager::SessionManager;
use crate::browser::ChromeBrowser;
use crate::core::{BrowserTrait, Config};
use crate::errors::{PublishError, Result};
use crate::platforms::{self, PlatformSpec};
use crate::session_store::SessionStore;
use crate::types::{
    AggregateResult, CancelFlag, ErrorKind, PublishRequest, WorkflowResult,
};
use crate::workflow::PublishWorkflow;
use std::time::Duration;
use tracing::{info, warn};

const SIMULATE_DELAY_MS: u64 = 50;

pub struct PublishCoordinator<B, F>
where
    B: BrowserTrait,
    F: Fn() -> B + Send + Sync,
{
    config: Config,
    store: SessionStore,
    manager: SessionManager<B, F>,
    cancel: CancelFlag,
}

impl PublishCoordinator<ChromeBrowser, fn() -> ChromeBrowser> {
    /// Production coordinator driving Chrome.
    pub fn with_chrome(config: Config) -> Self {
        Self::new(config, ChromeBrowser::new as fn() -> ChromeBrowser)
    }
}

impl<B, F> PublishCoordinator<B, F>
where
    B: BrowserTrait,
    F: Fn() -> B + Send + Sync,
{
    pub fn new(config: Config, factory: F) -> Self {
        let store = SessionStore::from_config(&config.store.session_dir);
        let manager = SessionManager::new(config.clone(), factory);
        Self {
            config,
            store,
            manager,
            cancel: CancelFlag::new(),
        }
    }

    /// Flag callers can keep to cancel in-flight work cooperatively.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Publish to every requested platform, never short-circuiting.
    pub async fn publish(&mut self, request: &PublishRequest) -> Result<AggregateResult> {
        if !self.config.simulate_only && !request.video_path.exists() {
            return Err(PublishError::ConfigurationError(format!(
                "video file not found: {}",
                request.video_path.display()
            )));
        }

        info!(
            "coordinator: publishing '{}' to {} platform(s)",
            request.title,
            request.target_platforms.len()
        );

        let mut results: Vec<WorkflowResult> = Vec::with_capacity(request.target_platforms.len());
        let mut produced_session = false;
        let mut needed_session = false;

        for platform_name in &request.target_platforms {
            if self.cancel.is_cancelled() {
                results.push(WorkflowResult::failed(
                    platform_name,
                    ErrorKind::Cancelled,
                    "publish cancelled before this platform started",
                ));
                continue;
            }

            let Some(spec) = platforms::by_name(platform_name) else {
                warn!("coordinator: unknown platform '{}'", platform_name);
                results.push(WorkflowResult::failed(
                    platform_name,
                    ErrorKind::UnknownPlatform,
                    format!("platform '{}' is not supported", platform_name),
                ));
                continue;
            };

            if self.config.simulate_only {
                results.push(Self::simulate_result(&spec, request).await);
                continue;
            }

            needed_session = true;
            match self.manager.acquire_session(true).await {
                Ok(session) => {
                    produced_session = true;
                    let mut workflow = PublishWorkflow::new(
                        session.browser.as_ref(),
                        &session.tab,
                        &spec,
                        &self.config,
                        &self.store,
                        self.cancel.clone(),
                    );
                    results.push(workflow.run(request).await);
                }
                Err(e) => {
                    warn!(
                        "coordinator: no session for '{}': {}",
                        platform_name, e
                    );
                    results.push(WorkflowResult::failed(
                        platform_name,
                        ErrorKind::Session,
                        e.to_string(),
                    ));
                }
            }
        }

        // The one hard-error contract: session acquisition produced nothing
        // at all, so no platform ever had a chance.
        if needed_session && !produced_session {
            return Err(PublishError::Session(
                "no browser session could be acquired for any platform".into(),
            ));
        }

        let aggregate = AggregateResult::from_results(results);
        info!(
            "coordinator: done, {}/{} succeeded ({:?})",
            aggregate.success_count, aggregate.total_count, aggregate.status
        );
        Ok(aggregate)
    }

    /// Interactively prepare one platform's login: open its entry page,
    /// restore any stored session, wait (bounded) for a human to finish the
    /// login and persist the result. Nothing is published.
    pub async fn capture_login(&mut self, platform: &str) -> Result<()> {
        let spec = platforms::by_name(platform)
            .ok_or_else(|| PublishError::UnknownPlatform(platform.to_string()))?;

        if self.config.simulate_only {
            info!("coordinator: 🎭 simulated login capture for {}", spec.name);
            return Ok(());
        }

        let session = self.manager.acquire_session(true).await?;
        let mut workflow = PublishWorkflow::new(
            session.browser.as_ref(),
            &session.tab,
            &spec,
            &self.config,
            &self.store,
            self.cancel.clone(),
        );
        workflow.capture_login().await
    }

    /// Drop the stored session so the platform's next run starts from a
    /// fresh login.
    pub async fn logout(&mut self, platform: &str) -> Result<()> {
        self.store.clear(platform).await
    }

    /// Synthetic success used to exercise the aggregation/reporting path
    /// without a browser. Deterministic on purpose so repeated runs compare
    /// structurally equal.
    async fn simulate_result(spec: &PlatformSpec, request: &PublishRequest) -> WorkflowResult {
        tokio::time::sleep(Duration::from_millis(SIMULATE_DELAY_MS)).await;
        let video_id = format!("sim-{}", spec.name);
        let url = format!("{}/videos/{}", spec.base_url, video_id);
        info!(
            "coordinator: 🎭 simulated publish of '{}' to {}",
            request.title, spec.name
        );
        WorkflowResult::confirmed(
            spec.name,
            format!("simulated publish of '{}'", request.title),
        )
        .with_remote(Some(video_id), Some(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBrowser;
    use crate::types::{AggregateStatus, PublishOutcome};
    use serde_json::json;

    fn simulate_config() -> Config {
        let mut config = Config::default();
        config.simulate_only = true;
        config.store.session_dir = Some(
            std::env::temp_dir()
                .join("crosspub-tests")
                .join(uuid::Uuid::new_v4().to_string()),
        );
        config
    }

    fn fast_real_config() -> Config {
        let mut config = simulate_config();
        config.simulate_only = false;
        config.timeouts.per_step_ms = 150;
        config.timeouts.poll_interval_ms = 50;
        config.timeouts.navigation_ms = 100;
        config.timeouts.auth_ms = 300;
        config.timeouts.processing_ms = 300;
        config.timeouts.verify_ms = 150;
        config
    }

    fn request(platforms: &[&str]) -> PublishRequest {
        let missing = std::env::temp_dir().join(format!("crosspub-missing-{}.mp4", uuid::Uuid::new_v4()));
        PublishRequest::new(missing, "集成测试视频")
            .with_description("desc")
            .with_tags(vec!["tag".into()])
            .with_platforms(platforms.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn one_result_per_platform_even_with_failures() {
        let mut coordinator =
            PublishCoordinator::new(simulate_config(), MockBrowser::new);
        let request = request(&["douyin", "bilibili", "myspace"]);

        let aggregate = coordinator.publish(&request).await.unwrap();

        assert_eq!(aggregate.total_count, 3);
        assert_eq!(aggregate.per_platform.len(), 3);
        assert_eq!(aggregate.success_count, 2);
        assert_eq!(aggregate.status, AggregateStatus::PartialSuccess);

        let unknown = aggregate.result_for("myspace").unwrap();
        assert_eq!(unknown.error_kind, Some(ErrorKind::UnknownPlatform));
    }

    #[tokio::test]
    async fn simulate_mode_is_deterministic() {
        let mut coordinator =
            PublishCoordinator::new(simulate_config(), MockBrowser::new);
        let request = request(&["douyin", "kuaishou", "youtube"]);

        let first = coordinator.publish(&request).await.unwrap();
        let second = coordinator.publish(&request).await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.success_count, second.success_count);
        let fingerprint = |agg: &AggregateResult| {
            agg.per_platform
                .iter()
                .map(|r| (r.platform.clone(), r.outcome, r.remote_video_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(fingerprint(&first), fingerprint(&second));
    }

    #[tokio::test]
    async fn simulate_results_carry_synthetic_remotes() {
        let mut coordinator =
            PublishCoordinator::new(simulate_config(), MockBrowser::new);
        let aggregate = coordinator
            .publish(&request(&["wechat"]))
            .await
            .unwrap();
        let result = aggregate.result_for("wechat").unwrap();
        assert_eq!(result.outcome, PublishOutcome::Confirmed);
        assert_eq!(result.remote_video_id.as_deref(), Some("sim-wechat"));
        assert!(result
            .remote_url
            .as_deref()
            .unwrap()
            .starts_with("https://channels.weixin.qq.com"));
    }

    #[tokio::test]
    async fn partial_success_with_real_workflows() {
        // One shared mock page: douyin finds everything it needs, bilibili
        // cannot locate its title field and dies with ElementNotFound.
        let config = fast_real_config();
        let video = std::env::temp_dir().join(format!(
            "crosspub-{}.mp4",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&video, b"fake video").unwrap();

        let mut coordinator = PublishCoordinator::new(config, || {
            let browser = MockBrowser::new();
            browser.stub_script(
                "readyState",
                json!({ "readyState": "complete", "url": "stub", "bodyLength": 500 }),
            );
            browser.stub_script("发布失败", json!({ "found": false, "count": 0 }));
            browser.stub_script("投稿失败", json!({ "found": false, "count": 0 }));
            browser.stub_script(
                "发布成功",
                json!({
                    "found": true, "count": 1, "selector": "div.toast",
                    "tag": "div", "text": "发布成功", "editable": false
                }),
            );
            browser.stub_script("上传中", json!({ "found": false, "count": 0 }));
            browser.stub_script(
                "上传完成",
                json!({
                    "found": true, "count": 1, "selector": "div.upload-success",
                    "tag": "div", "text": "上传完成", "editable": false
                }),
            );
            browser.stub_script(
                "input[type='file']",
                json!({
                    "found": true, "count": 1, "selector": "input[type='file']",
                    "tag": "input", "text": "", "editable": false
                }),
            );
            browser.stub_script(
                "semi-input",
                json!({
                    "found": true, "count": 1, "selector": "input.semi-input",
                    "tag": "input", "text": "", "editable": true
                }),
            );
            browser.stub_script(
                "data-placeholder",
                json!({
                    "found": true, "count": 1, "selector": "div[data-placeholder='添加作品简介']",
                    "tag": "div", "text": "", "editable": true
                }),
            );
            browser.stub_script(
                "\"video\"",
                json!({
                    "found": true, "count": 1, "selector": "video",
                    "tag": "video", "text": "", "editable": false
                }),
            );
            browser.stub_script(
                "发布",
                json!({
                    "found": true, "count": 1, "selector": "button.semi-button-primary",
                    "tag": "button", "text": "发布", "editable": false
                }),
            );
            browser.stub_script("localStorage", json!({}));
            browser
        });

        let mut request = request(&["douyin", "bilibili"]);
        request.video_path = video.clone();

        let aggregate = coordinator.publish(&request).await.unwrap();
        std::fs::remove_file(&video).ok();

        assert_eq!(aggregate.status, AggregateStatus::PartialSuccess);
        assert_eq!(aggregate.success_count, 1);
        assert_eq!(aggregate.total_count, 2);

        let douyin = aggregate.result_for("douyin").unwrap();
        assert!(douyin.succeeded(), "{}", douyin.message);

        let bilibili = aggregate.result_for("bilibili").unwrap();
        assert_eq!(bilibili.outcome, PublishOutcome::Failed);
        assert_eq!(bilibili.error_kind, Some(ErrorKind::ElementNotFound));
    }

    #[tokio::test]
    async fn unreachable_browser_is_the_one_hard_error() {
        let mut config = fast_real_config();
        config.browser.acquire_attempts = 1;
        let video = std::env::temp_dir().join(format!(
            "crosspub-{}.mp4",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&video, b"fake video").unwrap();

        let mut coordinator = PublishCoordinator::new(config, MockBrowser::unreachable);
        let mut req = request(&["douyin"]);
        req.video_path = video.clone();

        let outcome = coordinator.publish(&req).await;
        std::fs::remove_file(&video).ok();

        assert!(matches!(outcome, Err(PublishError::Session(_))));
    }

    #[tokio::test]
    async fn missing_video_file_is_rejected_up_front() {
        let mut coordinator =
            PublishCoordinator::new(fast_real_config(), MockBrowser::new);
        let outcome = coordinator.publish(&request(&["douyin"])).await;
        assert!(matches!(
            outcome,
            Err(PublishError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn capture_login_rejects_unknown_platform() {
        let mut coordinator =
            PublishCoordinator::new(fast_real_config(), MockBrowser::new);
        let outcome = coordinator.capture_login("myspace").await;
        assert!(matches!(outcome, Err(PublishError::UnknownPlatform(_))));
    }

    #[tokio::test]
    async fn capture_login_stores_session_for_authenticated_page() {
        let mut coordinator = PublishCoordinator::new(fast_real_config(), || {
            let browser = MockBrowser::new();
            browser.stub_script(
                "readyState",
                json!({ "readyState": "complete", "url": "stub", "bodyLength": 500 }),
            );
            browser.stub_script(
                "input[type='file']",
                json!({
                    "found": true, "count": 1, "selector": "input[type='file']",
                    "tag": "input", "text": "", "editable": false
                }),
            );
            browser
        });

        coordinator.capture_login("douyin").await.unwrap();
        assert!(coordinator.store().load("douyin").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn logout_removes_stored_session() {
        let mut coordinator =
            PublishCoordinator::new(simulate_config(), MockBrowser::new);
        let session = crate::session_store::PersistedSession::new(
            "douyin",
            vec![],
            Default::default(),
            "https://creator.douyin.com",
            168,
        );
        coordinator.store().save(&session).await.unwrap();

        coordinator.logout("douyin").await.unwrap();
        assert!(coordinator.store().load("douyin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelled_request_reports_cancelled_results() {
        let mut coordinator =
            PublishCoordinator::new(simulate_config(), MockBrowser::new);
        coordinator.cancel_flag().cancel();

        let aggregate = coordinator
            .publish(&request(&["douyin", "bilibili"]))
            .await
            .unwrap();
        assert_eq!(aggregate.status, AggregateStatus::AllFailed);
        assert!(aggregate
            .per_platform
            .iter()
            .all(|r| r.error_kind == Some(ErrorKind::Cancelled)));
    }
}
