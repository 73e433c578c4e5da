use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration consumed, not owned, by the automation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub timeouts: TimeoutConfig,
    pub store: StoreConfig,
    /// Skip real browser interaction and return synthetic successes after a
    /// short delay. Used for exercising the coordinator/reporting path.
    pub simulate_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote-debug address of an already-running browser to attach to.
    pub debug_address: String,
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    /// Profile directory for launched instances, so login state survives
    /// across launches. Resolved relative to the working directory when not
    /// absolute.
    pub profile_dir: PathBuf,
    pub extra_args: Vec<String>,
    /// Attach/launch retry budget for session acquisition.
    pub acquire_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget for a single locate/fill/click step.
    pub per_step_ms: u64,
    /// Poll interval inside wait loops.
    pub poll_interval_ms: u64,
    pub navigation_ms: u64,
    /// Bounded wait for a human to complete an interactive login.
    pub auth_ms: u64,
    /// Server-side transcode wait; minutes, not seconds.
    pub processing_ms: u64,
    /// Window for observing a success/failure signal after submit.
    pub verify_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one persisted-session JSON file per platform.
    /// `None` means `~/.crosspub/sessions`.
    pub session_dir: Option<PathBuf>,
    /// Fallback session expiry for platforms without their own setting.
    pub session_expiry_hours: i64,
    /// Where failed workflows drop page snapshots (markup summary plus a
    /// screenshot). `None` disables capture.
    pub diagnostics_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            timeouts: TimeoutConfig::default(),
            store: StoreConfig::default(),
            simulate_only: false,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_address: "127.0.0.1:9222".to_string(),
            headless: false,
            viewport: Viewport::default(),
            user_agent: None,
            profile_dir: PathBuf::from("crosspub_profile"),
            extra_args: vec![],
            acquire_attempts: 3,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            per_step_ms: 10_000,
            poll_interval_ms: 500,
            navigation_ms: 30_000,
            auth_ms: 180_000,
            processing_ms: 300_000,
            verify_ms: 15_000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_dir: None,
            session_expiry_hours: 168,
            diagnostics_dir: None,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
