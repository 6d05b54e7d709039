use thiserror::Error;

/// Failures local to a single interception attempt.
///
/// None of these are retried and none stop the monitor; the orchestrator
/// reports them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    #[error("no launch target for the controller surface")]
    NoLaunchTarget,

    #[error("failed to launch controller surface: {0}")]
    LaunchFailed(String),

    #[error("presentation layer is not connected")]
    PresentationUnreachable,

    #[error("presentation layer call failed: {code}{}", message_suffix(.message))]
    PresentationInvocationFailed {
        code: String,
        message: Option<String>,
    },
}

impl InterceptError {
    pub fn invocation_failed(code: impl Into<String>, message: Option<String>) -> Self {
        Self::PresentationInvocationFailed {
            code: code.into(),
            message,
        }
    }
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default()
}

/// Errors on the framed method channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed channel message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {len} bytes (max: {max} bytes)")]
    MessageTooLarge { len: usize, max: usize },

    #[error("channel closed")]
    Closed,
}

impl ChannelError {
    /// True when the peer closed the stream between messages.
    pub fn is_eof(&self) -> bool {
        match self {
            ChannelError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            ChannelError::Closed => true,
            ChannelError::Json(_) | ChannelError::MessageTooLarge { .. } => false,
        }
    }
}

/// Application error type for startup and configuration.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
