//! Error types for the LAID domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all LAID operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation history ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("{tool_name} timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

/// Violations of the append-only history invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("tool message is missing its tool_call_id")]
    MissingToolCallId,

    #[error("tool message references unknown tool call '{0}'")]
    UnknownToolCall(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 500,
            message: "model crashed".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("model crashed"));
    }

    #[test]
    fn tool_timeout_displays_tool_and_duration() {
        let err = ToolError::Timeout {
            tool_name: "execute_command".into(),
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "execute_command timed out after 30s");
    }

    #[test]
    fn history_error_converts_into_top_level() {
        let err: Error = HistoryError::UnknownToolCall("call_9".into()).into();
        assert!(matches!(err, Error::History(_)));
        assert!(err.to_string().contains("call_9"));
    }
}
