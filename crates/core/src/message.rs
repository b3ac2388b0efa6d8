//! Message and History domain types.
//!
//! These are the value objects that flow through the loop:
//! user input → `user` message → model response → `assistant` message
//! → tool dispatch → `tool` messages → next model request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HistoryError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID (local only, never sent to the model)
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create an assistant message that carries tool calls.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRecord>,
    ) -> Self {
        let mut message = Self::with_role(Role::Assistant, content.into());
        message.tool_calls = tool_calls;
        message
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut message = Self::with_role(Role::Tool, content.into());
        message.tool_call_id = Some(tool_call_id.into());
        message
    }
}

/// One tool invocation requested by the model.
///
/// During streaming a record is built up from fragments; once the stream
/// ends it is frozen and only [valid](ToolCallRecord::is_valid) records are
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Opaque call ID supplied by the model
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Accumulated JSON argument text
    pub arguments: String,

    /// Call type; always "function" for chat-completions models
    #[serde(rename = "type", default = "default_call_type")]
    pub kind: String,
}

fn default_call_type() -> String {
    "function".into()
}

impl ToolCallRecord {
    /// Create an empty record, as when an aggregation index is first seen.
    pub fn empty() -> Self {
        Self {
            kind: default_call_type(),
            ..Self::default()
        }
    }

    /// Create a complete record.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
            kind: default_call_type(),
        }
    }

    /// A record is dispatchable only once id, name and arguments are all present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.name.is_empty() && !self.arguments.is_empty()
    }
}

/// The append-only message log owned by the conversation loop.
///
/// Messages are never reordered or rewritten once pushed. A `tool` message
/// is only accepted when an earlier `assistant` message requested its call id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) -> Result<(), HistoryError> {
        if message.role == Role::Tool {
            let call_id = message
                .tool_call_id
                .as_deref()
                .ok_or(HistoryError::MissingToolCallId)?;
            if !self.has_requested_call(call_id) {
                return Err(HistoryError::UnknownToolCall(call_id.to_string()));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    fn has_requested_call(&self, call_id: &str) -> bool {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .any(|m| m.tool_calls.iter().any(|tc| tc.id == call_id))
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
