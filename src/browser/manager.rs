use crate::core::{AttachMode, BrowserTrait, Config};
use crate::errors::{PublishError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Identity and lifecycle facts for one live browser connection.
///
/// Lifecycle is an explicit field here, not inferred from context: a handle
/// that is `attached_to_existing` must never be force-closed, because the
/// browser belongs to the user.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    pub debug_endpoint: String,
    pub attached_to_existing: bool,
    pub owns_process: bool,
}

/// A usable browser connection: handle facts plus the shared browser and its
/// working tab.
pub struct ActiveSession<B: BrowserTrait> {
    pub handle: SessionHandle,
    pub browser: Arc<B>,
    pub tab: B::TabHandle,
}

/// Obtains and recycles browser sessions.
///
/// Acquisition order: (1) attach to a browser already listening on the
/// configured remote-debug address, (2) launch a fresh instance with a
/// dedicated profile. A failed health check discards the handle and the
/// sequence is retried with exponential backoff, up to the configured
/// attempt budget.
pub struct SessionManager<B, F>
where
    B: BrowserTrait,
    F: Fn() -> B + Send + Sync,
{
    config: Config,
    factory: F,
    active: Option<ActiveSession<B>>,
}

impl<B, F> SessionManager<B, F>
where
    B: BrowserTrait,
    F: Fn() -> B + Send + Sync,
{
    pub fn new(config: Config, factory: F) -> Self {
        Self {
            config,
            factory,
            active: None,
        }
    }

    /// Return a healthy session, creating one if needed.
    pub async fn acquire_session(&mut self, prefer_existing: bool) -> Result<&ActiveSession<B>> {
        let reusable = match &self.active {
            Some(active) => Self::health_check(active).await,
            None => false,
        };
        if !reusable {
            if self.active.is_some() {
                warn!("session: health check failed, discarding handle");
                self.invalidate().await;
            }
            let session = self.create_with_retries(prefer_existing).await?;
            self.active = Some(session);
        }
        self.active
            .as_ref()
            .ok_or_else(|| PublishError::Session("no active session".into()))
    }

    pub fn active(&self) -> Option<&ActiveSession<B>> {
        self.active.as_ref()
    }

    async fn create_with_retries(&self, prefer_existing: bool) -> Result<ActiveSession<B>> {
        let attempts = self.config.browser.acquire_attempts.max(1);
        let mut backoff = Duration::from_millis(500);
        let mut last_err = PublishError::Session("no acquisition attempt made".into());

        for attempt in 1..=attempts {
            match self.try_create(prefer_existing).await {
                Ok(session) => {
                    info!(
                        "session: acquired handle {} (attached={})",
                        session.handle.id, session.handle.attached_to_existing
                    );
                    return Ok(session);
                }
                Err(e) => {
                    warn!(
                        "session: acquisition attempt {}/{} failed: {}",
                        attempt, attempts, e
                    );
                    last_err = e;
                    if attempt < attempts {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }
        Err(PublishError::Session(format!(
            "could not obtain a browser session after {} attempts: {}",
            attempts, last_err
        )))
    }

    async fn try_create(&self, prefer_existing: bool) -> Result<ActiveSession<B>> {
        let mut browser = (self.factory)();

        if prefer_existing {
            if let Err(e) = browser.attach(&self.config).await {
                info!("session: attach failed ({}), launching instead", e);
                browser.launch(&self.config).await?;
            }
        } else {
            browser.launch(&self.config).await?;
        }
        let attached = browser.attach_mode() == AttachMode::Existing;

        let tab = browser.new_tab().await?;
        // Trivial "get current location" command doubles as the first
        // health check.
        browser.get_url(&tab).await?;

        let handle = SessionHandle {
            id: uuid::Uuid::new_v4().to_string(),
            debug_endpoint: self.config.browser.debug_address.clone(),
            attached_to_existing: attached,
            owns_process: !attached,
        };
        Ok(ActiveSession {
            handle,
            browser: Arc::new(browser),
            tab,
        })
    }

    async fn health_check(session: &ActiveSession<B>) -> bool {
        session.browser.get_url(&session.tab).await.is_ok()
    }

    /// Drop the current handle. Launched processes die with their handle;
    /// attached browsers only lose our websocket.
    pub async fn invalidate(&mut self) {
        if let Some(session) = self.active.take() {
            if session.handle.owns_process {
                info!("session: dropping launched browser {}", session.handle.id);
            } else {
                info!(
                    "session: detaching from user browser {} (left running)",
                    session.handle.id
                );
            }
        }
    }

    /// End-of-run cleanup; alias of [`SessionManager::invalidate`] kept for
    /// call-site readability.
    pub async fn release(&mut self) {
        self.invalidate().await;
    }
}
