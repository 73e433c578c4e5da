use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One video plus its metadata, fanned out to every requested platform.
///
/// Immutable once dispatched; the coordinator owns it for the lifetime of a
/// single publish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub cover_path: Option<PathBuf>,
    pub target_platforms: Vec<String>,
}

impl PublishRequest {
    pub fn new(video_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            video_path: video_path.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            cover_path: None,
            target_platforms: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.target_platforms = platforms;
        self
    }
}

/// Coarse classification of workflow failures, reported to the caller so it
/// can decide which platforms are worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Session,
    AuthenticationTimeout,
    ElementNotFound,
    UploadTimeout,
    Navigation,
    Script,
    Cancelled,
    UnknownPlatform,
    Internal,
}

/// Three-way publish outcome.
///
/// `Unconfirmed` covers the common case where the publish action was invoked
/// but the platform redirected asynchronously before a success signal could
/// be observed. It counts as a success, with a qualifier, and must not be
/// collapsed into a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishOutcome {
    Confirmed,
    Unconfirmed,
    Failed,
}

/// Produced exactly once per platform per `PublishRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub platform: String,
    pub outcome: PublishOutcome,
    pub remote_video_id: Option<String>,
    pub remote_url: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub message: String,
}

impl WorkflowResult {
    pub fn confirmed(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            outcome: PublishOutcome::Confirmed,
            remote_video_id: None,
            remote_url: None,
            error_kind: None,
            message: message.into(),
        }
    }

    pub fn unconfirmed(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            outcome: PublishOutcome::Unconfirmed,
            remote_video_id: None,
            remote_url: None,
            error_kind: None,
            message: message.into(),
        }
    }

    pub fn failed(
        platform: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            outcome: PublishOutcome::Failed,
            remote_video_id: None,
            remote_url: None,
            error_kind: Some(kind),
            message: message.into(),
        }
    }

    pub fn with_remote(mut self, video_id: Option<String>, url: Option<String>) -> Self {
        self.remote_video_id = video_id;
        self.remote_url = url;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.outcome != PublishOutcome::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateStatus {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}

/// Per-platform breakdown plus overall status for one publish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub per_platform: Vec<WorkflowResult>,
    pub success_count: usize,
    pub total_count: usize,
    pub status: AggregateStatus,
}

impl AggregateResult {
    pub fn from_results(per_platform: Vec<WorkflowResult>) -> Self {
        let total_count = per_platform.len();
        let success_count = per_platform.iter().filter(|r| r.succeeded()).count();
        let status = if total_count > 0 && success_count == total_count {
            AggregateStatus::AllSucceeded
        } else if success_count > 0 {
            AggregateStatus::PartialSuccess
        } else {
            AggregateStatus::AllFailed
        };
        Self {
            per_platform,
            success_count,
            total_count,
            status,
        }
    }

    pub fn result_for(&self, platform: &str) -> Option<&WorkflowResult> {
        self.per_platform.iter().find(|r| r.platform == platform)
    }
}

/// Cooperative cancellation flag shared between the caller and in-flight
/// workflows. Checked at every poll boundary; a cancelled run stops issuing
/// browser commands but never tears down a session it did not launch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(platform: &str) -> WorkflowResult {
        WorkflowResult::confirmed(platform, "published")
    }

    fn err(platform: &str) -> WorkflowResult {
        WorkflowResult::failed(platform, ErrorKind::ElementNotFound, "missing submit button")
    }

    #[test]
    fn aggregate_all_succeeded() {
        let agg = AggregateResult::from_results(vec![ok("a"), ok("b")]);
        assert_eq!(agg.status, AggregateStatus::AllSucceeded);
        assert_eq!(agg.success_count, 2);
        assert_eq!(agg.total_count, 2);
    }

    #[test]
    fn aggregate_partial_success() {
        let agg = AggregateResult::from_results(vec![ok("a"), err("b")]);
        assert_eq!(agg.status, AggregateStatus::PartialSuccess);
        assert_eq!(agg.success_count, 1);
        assert_eq!(agg.total_count, 2);
    }

    #[test]
    fn aggregate_all_failed() {
        let agg = AggregateResult::from_results(vec![err("a"), err("b")]);
        assert_eq!(agg.status, AggregateStatus::AllFailed);
        assert_eq!(agg.success_count, 0);
    }

    #[test]
    fn aggregate_empty_is_all_failed() {
        let agg = AggregateResult::from_results(vec![]);
        assert_eq!(agg.status, AggregateStatus::AllFailed);
        assert_eq!(agg.total_count, 0);
    }

    #[test]
    fn unconfirmed_counts_as_success() {
        let agg = AggregateResult::from_results(vec![
            WorkflowResult::unconfirmed("a", "submitted, no confirmation observed"),
            err("b"),
        ]);
        assert_eq!(agg.status, AggregateStatus::PartialSuccess);
        assert_eq!(agg.success_count, 1);
    }

    #[test]
    fn cancel_flag_round_trip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
