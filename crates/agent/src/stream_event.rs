//! Agent-level streaming events.
//!
//! `AgentStreamEvent` lifts the loop's progress (text fragments, tool
//! activity, terminal outcomes) into events a front end can render while a
//! turn is still running.

use serde::{Deserialize, Serialize};

/// Events emitted by the conversation loop during a turn.
///
/// - `chunk`        partial text from the model
/// - `tool_call`    a validated tool call is about to be dispatched
/// - `tool_result`  tool execution completed
/// - `paused`       the turn stopped on a pause request
/// - `done`         the turn produced its final answer
/// - `error`        the turn was aborted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Partial text from the model.
    Chunk { content: String },

    /// The loop is calling a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },

    /// Tool execution completed.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The turn ended early on a pause request.
    Paused { partial: String },

    /// The turn is complete.
    Done {
        rounds: u32,
        tool_calls_made: usize,
    },

    /// The turn was aborted.
    Error { message: String },
}

impl AgentStreamEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Paused { .. } => "paused",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_chunk() {
        let event = AgentStreamEvent::Chunk {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"chunk""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_tool_result() {
        let event = AgentStreamEvent::ToolResult {
            id: "call_1".into(),
            name: "read_file".into(),
            output: r#"{"error":"File write denied by user"}"#.into(),
            success: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn event_serialization_done() {
        let event = AgentStreamEvent::Done {
            rounds: 2,
            tool_calls_made: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""rounds":2"#));
    }

    #[test]
    fn event_type_names() {
        let events = [
            (AgentStreamEvent::Chunk { content: "x".into() }, "chunk"),
            (
                AgentStreamEvent::ToolCall {
                    id: "a".into(),
                    name: "b".into(),
                    arguments: "{}".into(),
                },
                "tool_call",
            ),
            (AgentStreamEvent::Paused { partial: String::new() }, "paused"),
            (AgentStreamEvent::Error { message: "boom".into() }, "error"),
        ];
        for (event, name) in events {
            assert_eq!(event.event_type(), name);
        }
    }
}
