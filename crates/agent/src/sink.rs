//! Where loop events go.

use tokio::sync::mpsc;

use crate::stream_event::AgentStreamEvent;

/// Receives [`AgentStreamEvent`]s as the loop produces them.
///
/// `emit` is called inline from the loop, so implementations should return
/// quickly.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AgentStreamEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AgentStreamEvent) {}
}

/// Forwards events to a channel; a closed receiver is ignored.
impl EventSink for mpsc::UnboundedSender<AgentStreamEvent> {
    fn emit(&self, event: AgentStreamEvent) {
        let _ = self.send(event);
    }
}
