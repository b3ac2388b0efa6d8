//! OpenAI-compatible streaming provider.
//!
//! Talks to any server exposing `/v1/chat/completions` with SSE streaming;
//! LM Studio is the default target. The provider only decodes the wire
//! format into [`StreamFrame`]s. It does not reassemble tool calls.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use laid_core::error::ProviderError;
use laid_core::message::Message;
use laid_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::sse::{SseLineBuffer, SsePayload, parse_payload};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// A streaming client for an OpenAI-compatible chat-completions server.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider for `base_url` (e.g. `http://localhost:1234/v1`).
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create an LM Studio provider (convenience constructor).
    pub fn lm_studio(base_url: impl Into<String>) -> Self {
        Self::new("lm-studio", base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": true,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl laid_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<FrameReceiver, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status == 404 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model or endpoint not found");
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider streaming error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and forward frames
        tokio::spawn(async move {
            pump_frames(response.bytes_stream(), tx, &provider_name).await;
        });

        Ok(rx)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

/// Read an SSE byte stream and forward decoded frames until `[DONE]`, the
/// end of the body, or a transport error.
///
/// Exactly one terminal item is sent: `Done` on a clean end, or
/// `Err(StreamInterrupted)` when the transport fails part-way. Returns early
/// without a terminal item if the receiver is dropped.
pub(crate) async fn pump_frames<S, B, E>(
    mut byte_stream: S,
    tx: mpsc::Sender<std::result::Result<StreamFrame, ProviderError>>,
    provider_name: &str,
) where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut buffer = SseLineBuffer::new();
    let mut skipped = 0usize;

    while let Some(chunk_result) = byte_stream.next().await {
        let bytes = match chunk_result {
            Ok(b) => b,
            Err(e) => {
                warn!(provider = %provider_name, error = %e, "Stream interrupted");
                let _ = tx
                    .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                    .await;
                return;
            }
        };

        for data in buffer.push(bytes.as_ref()) {
            match forward(&data, &tx, provider_name, &mut skipped).await {
                Forward::Continue => {}
                Forward::Finished => {
                    debug!(provider = %provider_name, skipped, "Stream finished");
                    return;
                }
                Forward::ReceiverGone => return,
            }
        }
    }

    if let Some(data) = buffer.finish()
        && !matches!(
            forward(&data, &tx, provider_name, &mut skipped).await,
            Forward::Continue
        )
    {
        return;
    }

    // Stream ended without [DONE]
    debug!(provider = %provider_name, skipped, "Stream body ended without [DONE]");
    let _ = tx.send(Ok(StreamFrame::Done)).await;
}

enum Forward {
    Continue,
    Finished,
    ReceiverGone,
}

async fn forward(
    data: &str,
    tx: &mpsc::Sender<std::result::Result<StreamFrame, ProviderError>>,
    provider_name: &str,
    skipped: &mut usize,
) -> Forward {
    match parse_payload(data) {
        SsePayload::Done => {
            if tx.send(Ok(StreamFrame::Done)).await.is_err() {
                return Forward::ReceiverGone;
            }
            Forward::Finished
        }
        SsePayload::Frames(frames) => {
            for frame in frames {
                if tx.send(Ok(frame)).await.is_err() {
                    return Forward::ReceiverGone;
                }
            }
            Forward::Continue
        }
        SsePayload::Malformed(error) => {
            *skipped += 1;
            trace!(
                provider = %provider_name,
                data = %data,
                error = %error,
                "Ignoring unparseable SSE chunk"
            );
            Forward::Continue
        }
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}
