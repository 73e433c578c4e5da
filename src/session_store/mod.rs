//! Authenticated-session persistence, one JSON record per platform.
//!
//! After a successful login the workflow saves the browser's cookies and
//! local-storage snapshot here; the next run injects them before navigation
//! so a human does not have to re-authenticate. Records are overwritten on
//! every later successful authentication (last-write-wins) and removed on
//! explicit logout or when expiry is detected on load.

use crate::errors::{PublishError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One browser cookie, in the shape the DevTools protocol reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Unix seconds; `None` for session-scoped cookies.
    pub expires: Option<f64>,
    pub http_only: bool,
    pub secure: bool,
}

/// Everything needed to restore an authenticated session on a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub platform: String,
    pub cookies: Vec<CookieRecord>,
    pub local_storage: HashMap<String, String>,
    pub captured_url: String,
    pub saved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn new(
        platform: impl Into<String>,
        cookies: Vec<CookieRecord>,
        local_storage: HashMap<String, String>,
        captured_url: impl Into<String>,
        expiry_hours: i64,
    ) -> Self {
        let saved_at = Utc::now();
        Self {
            platform: platform.into(),
            cookies,
            local_storage,
            captured_url: captured_url.into(),
            saved_at,
            expires_at: saved_at + Duration::hours(expiry_hours),
        }
    }
}

/// A session is trusted while its age is at most `max_age_hours`.
pub fn is_fresh(saved_at: DateTime<Utc>, now: DateTime<Utc>, max_age_hours: i64) -> bool {
    now - saved_at <= Duration::hours(max_age_hours)
}

/// File-backed key-value store keyed by platform name.
///
/// Writes are guarded by a per-platform async lock so concurrent publishes
/// to the same platform cannot interleave mid-serialization. There is no
/// merging of partial states; a save replaces the whole record.
pub struct SessionStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Store rooted at the configured directory, or `~/.crosspub/sessions`.
    pub fn from_config(session_dir: &Option<PathBuf>) -> Self {
        let dir = session_dir.clone().unwrap_or_else(Self::default_dir);
        Self::new(dir)
    }

    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crosspub")
            .join("sessions")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, platform: &str) -> PathBuf {
        // Platform names are registry keys, but sanitize anyway.
        let key: String = platform
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", key))
    }

    async fn lock_for(&self, platform: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(platform.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Overwrite the platform's record.
    pub async fn save(&self, session: &PersistedSession) -> Result<()> {
        let lock = self.lock_for(&session.platform).await;
        let _guard = lock.lock().await;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&session.platform);
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, json)?;
        info!(
            "session_store: 💾 saved {} cookies for '{}' ({})",
            session.cookies.len(),
            session.platform,
            path.display()
        );
        Ok(())
    }

    /// Load the platform's record, removing it when past its own expiry.
    pub async fn load(&self, platform: &str) -> Result<Option<PersistedSession>> {
        let path = self.record_path(platform);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let session: PersistedSession = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "session_store: unreadable record for '{}' ({}), discarding",
                    platform, e
                );
                let _ = std::fs::remove_file(&path);
                return Ok(None);
            }
        };

        if Utc::now() > session.expires_at {
            info!(
                "session_store: 🗑️ record for '{}' expired at {}, removing",
                platform, session.expires_at
            );
            self.clear(platform).await?;
            return Ok(None);
        }

        debug!(
            "session_store: 🍪 loaded {} cookies for '{}'",
            session.cookies.len(),
            platform
        );
        Ok(Some(session))
    }

    /// Whether a stored record exists and is younger than `max_age_hours`.
    pub async fn is_valid(&self, platform: &str, max_age_hours: i64) -> bool {
        let path = self.record_path(platform);
        if !path.exists() {
            return false;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            return false;
        };
        let Ok(session) = serde_json::from_str::<PersistedSession>(&content) else {
            return false;
        };
        is_fresh(session.saved_at, Utc::now(), max_age_hours)
    }

    /// Remove the platform's record so the next run triggers a fresh login.
    pub async fn clear(&self, platform: &str) -> Result<()> {
        let lock = self.lock_for(platform).await;
        let _guard = lock.lock().await;

        let path = self.record_path(platform);
        if path.exists() {
            std::fs::remove_file(&path).map_err(PublishError::IoError)?;
            info!("session_store: cleared record for '{}'", platform);
        }
        Ok(())
    }
}
