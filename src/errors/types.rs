use thiserror::Error;

use crate::types::ErrorKind;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser attach failed: {0}")]
    AttachFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Session unavailable: {0}")]
    Session(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Element not found for role: {0}")]
    ElementNotFound(String),

    #[error("Authentication not completed within {0}ms")]
    AuthenticationTimeout(u64),

    #[error("Upload processing did not complete within {0}ms")]
    UploadTimeout(u64),

    #[error("File upload failed: {0}")]
    UploadFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Publish cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, PublishError>;

// Convert anyhow::Error to PublishError (headless_chrome surfaces anyhow results)
impl From<anyhow::Error> for PublishError {
    fn from(err: anyhow::Error) -> Self {
        PublishError::AnyhowError(err.to_string())
    }
}

impl PublishError {
    /// Map an error onto the coarse kind reported in a `WorkflowResult`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::LaunchFailed(_)
            | PublishError::AttachFailed(_)
            | PublishError::NotConnected
            | PublishError::TabCreationFailed(_)
            | PublishError::NoActiveTab
            | PublishError::Session(_) => ErrorKind::Session,
            PublishError::AuthenticationTimeout(_) => ErrorKind::AuthenticationTimeout,
            PublishError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            PublishError::UploadTimeout(_) | PublishError::UploadFailed(_) => {
                ErrorKind::UploadTimeout
            }
            PublishError::NavigationFailed(_) | PublishError::TimeoutError(_) => {
                ErrorKind::Navigation
            }
            PublishError::JavaScriptFailed(_) => ErrorKind::Script,
            PublishError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Internal,
        }
    }
}
