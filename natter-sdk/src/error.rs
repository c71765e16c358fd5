//! Error taxonomy for the client core.
//!
//! The supervisor dispatches on exactly three classes: retryable connection
//! failures, fatal conditions, and external shutdown. Anything it cannot
//! classify is treated as fatal rather than retried blindly.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Socket refused/reset/closed mid-stream, DNS failure, decode failure.
    #[error("connection: {0}")]
    Connection(#[from] std::io::Error),

    /// The server did not echo a ping within the bounded wait.
    #[error("ping echo timed out after {0:?}")]
    PingTimeout(Duration),

    /// No loop reported any successful I/O for a whole watchdog window.
    #[error("no link activity for {0:?}")]
    WatchdogTimeout(Duration),

    /// The server rejected our token. Retrying cannot succeed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The host application asked us to stop. Not an error.
    #[error("shutdown requested")]
    Shutdown,
}

impl ChatError {
    /// True for failures that a fresh connection can plausibly fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::Connection(_) | ChatError::PingTimeout(_) | ChatError::WatchdogTimeout(_)
        )
    }
}
