//! Model transport implementations for LAID.
//!
//! All providers implement the `laid_core::Provider` trait and deliver the
//! response as raw [`StreamFrame`](laid_core::StreamFrame)s; reassembly
//! happens in the agent crate.

pub mod openai_compat;
pub mod sse;

pub use openai_compat::OpenAiCompatProvider;
pub use sse::{SseLineBuffer, SsePayload, parse_payload};
