//! Shared test doubles for dispatcher and loop tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use laid_core::error::{ProviderError, ToolError};
use laid_core::provider::{
    FrameReceiver, Provider, ProviderRequest, StreamFrame, ToolCallDelta,
};
use laid_core::{ApprovalGate, ApprovalRequest, Tool};
use serde_json::json;

type Script = Vec<Result<StreamFrame, ProviderError>>;

/// A provider that replays one scripted frame sequence per `stream` call.
///
/// Every request is recorded. Running out of scripts is an error, not a
/// panic, so a runaway loop shows up as a failed turn.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: ProviderRequest) -> Result<FrameReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::StreamInterrupted("no more scripted responses".into()))?;

        let (tx, rx) = tokio::sync::mpsc::channel(script.len().max(1));
        for item in script {
            tx.try_send(item).unwrap();
        }
        Ok(rx)
    }
}

/// A plain answer streamed in two pieces.
pub fn text_response(text: &str) -> Script {
    let split = text.len() / 2;
    let split = (split..=text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len());
    let (head, tail) = text.split_at(split);
    let mut frames: Script = [head, tail]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| Ok(StreamFrame::content(part)))
        .collect();
    frames.push(Ok(StreamFrame::Done));
    frames
}

/// Optional text followed by tool calls, each with its arguments split
/// across two deltas.
pub fn tool_call_response(text: &str, calls: &[(&str, &str, &str)]) -> Script {
    let mut frames: Script = Vec::new();
    if !text.is_empty() {
        frames.push(Ok(StreamFrame::content(text)));
    }
    for (index, (id, name, arguments)) in calls.iter().enumerate() {
        let index = index as u32;
        let split = arguments.len() / 2;
        let (head, tail) = arguments.split_at(split);
        frames.push(Ok(StreamFrame::ToolCallDelta(ToolCallDelta {
            index,
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments: Some(head.to_string()),
        })));
        frames.push(Ok(StreamFrame::ToolCallDelta(ToolCallDelta {
            index,
            arguments: Some(tail.to_string()),
            ..ToolCallDelta::default()
        })));
    }
    frames.push(Ok(StreamFrame::Done));
    frames
}

/// Approval gate that answers from a script and records every prompt.
/// Once the script runs out it refuses.
pub struct ScriptedGate {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGate {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ApprovalGate for ScriptedGate {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Counts invocations; returns `{"ok": true, "call": n}`.
pub struct CountingTool {
    name: String,
    required: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl CountingTool {
    pub fn new(name: &str, required: &[&str]) -> Self {
        Self {
            name: name.into(),
            required: required.iter().map(|s| s.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Counts how often it runs"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}, "required": self.required})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({"ok": true, "call": n}))
    }
}

/// Writes a real file, behind approval.
pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "Write content to a file (requires user approval)"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "filepath": {"type": "string"},
                "content": {"type": "string"}
            },
            "required": ["filepath", "content"]
        })
    }
    fn approval(&self, arguments: &serde_json::Value) -> Option<ApprovalRequest> {
        let path = arguments["filepath"].as_str().unwrap_or_default();
        Some(ApprovalRequest::new(
            "File write",
            format!("Write to file {path}?"),
        ))
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let path = PathBuf::from(arguments["filepath"].as_str().unwrap_or_default());
        let content = arguments["content"].as_str().unwrap_or_default();
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;
        Ok(json!({"success": true, "message": format!("File written to {}", path.display())}))
    }
}

/// Always fails with `ExecutionFailed`.
pub struct FailingTool {
    name: String,
    reason: String,
}

impl FailingTool {
    pub fn new(name: &str, reason: &str) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: self.reason.clone(),
        })
    }
}

pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "explode"
    }
    fn description(&self) -> &str {
        "Panics"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        panic!("kaboom");
    }
}

/// Sleeps for a minute.
pub struct SleepyTool;

#[async_trait]
impl Tool for SleepyTool {
    fn name(&self) -> &str {
        "sleepy"
    }
    fn description(&self) -> &str {
        "Takes too long"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(json!({}))
    }
}
