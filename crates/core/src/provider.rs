//! Provider trait: the abstraction over the streaming model transport.
//!
//! A Provider knows how to send the conversation to a chat-completions
//! endpoint and hand back the response as a sequence of [`StreamFrame`]s.
//! Reassembling those frames is the agent's job, not the provider's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// One streaming chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "google/gemma-3-4b")
    pub model: String,

    /// The full conversation history
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Whether to stream the response
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_stream() -> bool {
    true
}

/// A tool definition sent to the model so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A fragment of a tool call as delivered by the stream.
///
/// Every field except `index` may be absent; fragments for the same index
/// belong to the same logical call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Server-assigned position of the call within the response
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A piece of the JSON argument text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// One unit of incrementally delivered response data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamFrame {
    /// A piece of assistant text
    Content { text: String },

    /// A piece of a tool call
    ToolCallDelta(ToolCallDelta),

    /// End of the response
    Done,
}

impl StreamFrame {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }
}

/// The receiving end of a streaming response.
pub type FrameReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<StreamFrame, ProviderError>>;

/// The core Provider trait.
///
/// The conversation loop calls `stream()` without knowing which backend is
/// behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "lm-studio").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response frames.
    ///
    /// An `Err` here means the request never produced a stream; errors
    /// inside the channel mean the stream broke part-way.
    async fn stream(&self, request: ProviderRequest) -> std::result::Result<FrameReceiver, ProviderError>;

    /// List model IDs the server currently offers.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check: can we reach the server?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
