//! # Error Types
//!
//! Errors returned across the boundary between a token connector and the
//! orchestration node.

use thiserror::Error;

/// Error returned by the node when it cannot absorb a token event.
///
/// Any of these terminates the connector's event loop: the event stays
/// unacknowledged so the connector redelivers it on the next connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Durable storage rejected the write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The event could not be dispatched to node consumers.
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_error_display() {
        let err = CallbackError::Storage("disk unavailable".to_string());
        assert!(err.to_string().contains("disk unavailable"));
    }
}
