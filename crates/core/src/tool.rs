//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools give the model the ability to act: run commands, touch files, look
//! things up. Concrete tools are supplied by the embedding application; this
//! module only defines the contract and the registry the loop dispatches
//! through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::approval::ApprovalRequest;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The outcome of one tool call, as fed back to the model.
///
/// Serializes untagged: a success is the tool's payload verbatim, an error
/// is `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Error { error: String },
    Success(serde_json::Value),
}

impl ToolResult {
    pub fn success(payload: serde_json::Value) -> Self {
        Self::Success(payload)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The error message, if this is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::Success(_) => None,
        }
    }

    /// JSON text stored as the `tool` message content.
    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"error":"unserializable tool result: {e}"}}"#)
        })
    }
}

/// The core Tool trait.
///
/// Each tool is registered in the [`ToolRegistry`] under its name. The
/// dispatcher validates arguments against [`required_parameters`] and asks
/// for human approval when [`approval`] returns a request, before calling
/// [`execute`].
///
/// [`required_parameters`]: Tool::required_parameters
/// [`approval`]: Tool::approval
/// [`execute`]: Tool::execute
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Keys that must be present in the arguments object.
    ///
    /// Defaults to the schema's `required` array.
    fn required_parameters(&self) -> Vec<String> {
        self.parameters_schema()["required"]
            .as_array()
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| k.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Side-effecting tools return the confirmation to ask for.
    fn approval(&self, _arguments: &serde_json::Value) -> Option<ApprovalRequest> {
        None
    }

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name so requests are stable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
