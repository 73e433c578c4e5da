pub mod engine;

pub use engine::PublishWorkflow;

use serde::{Deserialize, Serialize};

/// Publish pipeline states, in the order a healthy run visits them.
/// Every state may also jump straight to `Done` on an unrecoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    Authenticating,
    Uploading,
    WaitingForProcessing,
    FillingMetadata,
    Submitting,
    VerifyingResult,
    Done,
}

impl WorkflowState {
    fn order(self) -> u8 {
        match self {
            WorkflowState::Idle => 0,
            WorkflowState::Authenticating => 1,
            WorkflowState::Uploading => 2,
            WorkflowState::WaitingForProcessing => 3,
            WorkflowState::FillingMetadata => 4,
            WorkflowState::Submitting => 5,
            WorkflowState::VerifyingResult => 6,
            WorkflowState::Done => 7,
        }
    }

    /// Legal moves: one step forward, or bailing out to `Done`.
    pub fn can_transition(self, next: WorkflowState) -> bool {
        next == WorkflowState::Done || next.order() == self.order() + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Authenticating => "authenticating",
            WorkflowState::Uploading => "uploading",
            WorkflowState::WaitingForProcessing => "waiting_for_processing",
            WorkflowState::FillingMetadata => "filling_metadata",
            WorkflowState::Submitting => "submitting",
            WorkflowState::VerifyingResult => "verifying_result",
            WorkflowState::Done => "done",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
