//! The LAID agent loop.
//!
//! The loop follows a **stream → dispatch → continue** cycle:
//!
//! 1. **Receive** user input (or a command like `/mode act`)
//! 2. **Stream** the model response, showing text as it arrives
//! 3. **Aggregate** fragmented tool-call deltas into complete records
//! 4. **If tool calls**: validate, approve, execute, append results, go to 2
//! 5. **If text only**: the turn is done
//!
//! The cycle ends when the model answers without valid tool calls, when a
//! pause is requested, or when the per-turn request cap is reached.

pub mod aggregator;
pub mod command;
pub mod conversation;
pub mod dispatcher;
pub mod modes;
pub mod prompt;
pub mod sink;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use aggregator::{Aggregated, StreamAggregator, aggregate};
pub use command::Command;
pub use conversation::{CommandReply, ConversationLoop, INTERRUPTED_BY_PAUSE, TurnOutcome};
pub use dispatcher::ToolDispatcher;
pub use modes::ModeCatalog;
pub use prompt::{DEFAULT_INSTRUCTIONS, HostInfo, build_system_prompt};
pub use sink::{EventSink, NullSink};
pub use stream_event::AgentStreamEvent;
