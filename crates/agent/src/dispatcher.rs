//! Validates and runs one tool call.
//!
//! [`ToolDispatcher::execute`] never fails: every problem (bad arguments,
//! unknown tool, missing parameters, a refused approval, a tool error, a
//! panic, a timeout) comes back as a [`ToolResult::Error`] the model can
//! read and react to.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use laid_core::{
    ApprovalGate, ToolCallRecord, ToolDefinition, ToolError, ToolRegistry, ToolResult,
};
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    gate: Arc<dyn ApprovalGate>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, gate: Arc<dyn ApprovalGate>) -> Self {
        Self {
            registry,
            gate,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each tool execution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The tool schemas sent with every request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Run one validated call and normalize its outcome.
    pub async fn execute(&self, call: &ToolCallRecord) -> ToolResult {
        let start = Instant::now();
        let result = self.run(call).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match result.error_message() {
            None => info!(
                tool = %call.name,
                call_id = %call.id,
                duration_ms,
                "Tool executed"
            ),
            Some(error) => warn!(
                tool = %call.name,
                call_id = %call.id,
                duration_ms,
                error,
                "Tool call failed"
            ),
        }
        result
    }

    async fn run(&self, call: &ToolCallRecord) -> ToolResult {
        let arguments: serde_json::Value = match serde_json::from_str(&call.arguments) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) | Err(_) => return ToolResult::error("invalid arguments"),
        };

        let Some(tool) = self.registry.get(&call.name) else {
            return ToolResult::error(format!("unknown function: {}", call.name));
        };

        let missing: Vec<String> = tool
            .required_parameters()
            .into_iter()
            .filter(|key| arguments.get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return ToolResult::error(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            ));
        }

        if let Some(request) = tool.approval(&arguments) {
            debug!(tool = %call.name, action = %request.action, "Requesting approval");
            if !self.gate.confirm(&request.prompt) {
                return ToolResult::error(request.denial_message());
            }
        }

        let execution = std::panic::AssertUnwindSafe(tool.execute(arguments)).catch_unwind();
        match tokio::time::timeout(self.timeout, execution).await {
            Err(_) => ToolResult::error(
                ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: self.timeout.as_secs(),
                }
                .to_string(),
            ),
            Ok(Err(panic)) => {
                ToolResult::error(format!("tool panicked: {}", panic_message(&panic)))
            }
            Ok(Ok(Err(e))) => ToolResult::error(e.to_string()),
            Ok(Ok(Ok(payload))) => ToolResult::success(payload),
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
