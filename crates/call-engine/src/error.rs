use thiserror::Error;

/// Error types for call center operations
///
/// Not-found conditions (empty dequeue, a removal that matched nothing, a hangup
/// that addressed no container) are not errors: they surface as `Ok(None)`.
///
/// # Examples
///
/// ```
/// use switchboard_call_engine::{CallCenterError, Result};
///
/// fn transfer() -> Result<()> {
///     Err(CallCenterError::validation("Could not transfer unknown call. callId required."))
/// }
///
/// match transfer() {
///     Err(CallCenterError::Validation(msg)) => assert!(msg.contains("callId required")),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum CallCenterError {
    /// A required parameter was missing or malformed
    ///
    /// Raised before any queue or pool mutation; surface to the end user,
    /// do not retry.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The transfer target does not resolve to a known agent
    #[error("No such user: {0}")]
    UnknownAgent(String),

    /// A call or endpoint that must exist for the operation could not be located
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another transfer of the same call is still being processed
    #[error("Transfer already in progress for call {0}")]
    TransferInProgress(String),

    /// Storage backend failures, propagated unchanged
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Record (de)serialization failures inside a storage backend
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Telephony gateway refused or failed to build an instruction
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Configuration validation and parsing errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Queue-level failures not attributable to the backend
    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CallCenterError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_agent<S: Into<String>>(username: S) -> Self {
        Self::UnknownAgent(username.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn gateway<S: Into<String>>(msg: S) -> Self {
        Self::Gateway(msg.into())
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn queue<S: Into<String>>(msg: S) -> Self {
        Self::Queue(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// True for errors raised before any mutation because the request itself was bad
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownAgent(_))
    }
}

/// Result type alias for call center operations
pub type Result<T> = std::result::Result<T, CallCenterError>;
