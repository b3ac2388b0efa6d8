//! # LAID Core
//!
//! Domain types, traits, and error definitions for the LAID local agent loop.
//! This crate has **no transport or UI dependencies**: it defines the model
//! that the provider, agent and CLI crates implement against.
//!
//! ## Seams
//!
//! Every collaborator of the conversation loop is a trait here:
//! - [`Provider`]: the streaming model transport
//! - [`Tool`]: one named capability with a JSON schema
//! - [`ApprovalGate`]: human confirmation for side-effecting tools
//!
//! Implementations live in their respective crates (or in the embedding
//! application, for tools).

pub mod approval;
pub mod error;
pub mod message;
pub mod pause;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use approval::{ApprovalGate, ApprovalRequest, AutoApprove, DenyAll};
pub use error::{Error, HistoryError, ProviderError, ToolError};
pub use message::{History, Message, Role, ToolCallRecord};
pub use pause::PauseSignal;
pub use provider::{
    FrameReceiver, Provider, ProviderRequest, StreamFrame, ToolCallDelta, ToolDefinition,
};
pub use tool::{Tool, ToolRegistry, ToolResult};
