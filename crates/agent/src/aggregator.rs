//! Reassembles one streamed model response.
//!
//! Text fragments are concatenated and forwarded for live display. Tool-call
//! fragments are merged per aggregation index into [`ToolCallRecord`]s:
//!
//! - the first delta for an index creates an empty record;
//! - `arguments` fragments are appended in arrival order;
//! - `id` and `name` are overwritten only by non-empty values.
//!
//! When the stream ends the records are frozen, ordered by index, and the
//! invalid ones (missing id, name or arguments) are dropped.

use std::collections::BTreeMap;

use laid_core::provider::{FrameReceiver, StreamFrame, ToolCallDelta};
use laid_core::{PauseSignal, ProviderError, ToolCallRecord};
use tracing::{debug, trace};

use crate::sink::EventSink;
use crate::stream_event::AgentStreamEvent;

/// Incremental state for one streaming response.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    text: String,
    calls: BTreeMap<u32, ToolCallRecord>,
}

/// The frozen result of one streaming response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregated {
    /// Concatenated assistant text
    pub text: String,

    /// Valid tool calls, ordered by aggregation index
    pub tool_calls: Vec<ToolCallRecord>,

    /// Records discarded as incomplete
    pub dropped: usize,

    /// Consumption stopped on a pause request
    pub interrupted: bool,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_content(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Merge one tool-call fragment into the record for its index.
    pub fn push_delta(&mut self, delta: ToolCallDelta) {
        let record = self
            .calls
            .entry(delta.index)
            .or_insert_with(ToolCallRecord::empty);

        if let Some(arguments) = delta.arguments {
            record.arguments.push_str(&arguments);
        }
        if let Some(name) = delta.name
            && !name.is_empty()
        {
            record.name = name;
        }
        if let Some(id) = delta.id
            && !id.is_empty()
        {
            record.id = id;
        }
    }

    /// Apply a frame. Returns `false` once the end marker is seen.
    pub fn push(&mut self, frame: StreamFrame) -> bool {
        match frame {
            StreamFrame::Content { text } => {
                self.push_content(&text);
                true
            }
            StreamFrame::ToolCallDelta(delta) => {
                self.push_delta(delta);
                true
            }
            StreamFrame::Done => false,
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Freeze the response, keeping only valid records in index order.
    pub fn finish(self) -> Aggregated {
        let total = self.calls.len();
        let tool_calls: Vec<ToolCallRecord> = self
            .calls
            .into_values()
            .filter(ToolCallRecord::is_valid)
            .collect();
        let dropped = total - tool_calls.len();

        if dropped > 0 {
            debug!(dropped, kept = tool_calls.len(), "Dropped incomplete tool calls");
        }

        Aggregated {
            text: self.text,
            tool_calls,
            dropped,
            interrupted: false,
        }
    }
}

/// Drain a frame channel into an [`Aggregated`] response.
///
/// Each content fragment is emitted as a `chunk` event before the next frame
/// is read. The pause flag is checked at every content fragment; once set,
/// that fragment and all later content are discarded, but tool-call deltas
/// keep being read until the end marker so a call split around the pause is
/// still finalized.
///
/// A channel that closes without an end marker counts as a normal end. An
/// error item aborts aggregation and is returned as-is.
pub async fn aggregate(
    mut frames: FrameReceiver,
    pause: &PauseSignal,
    sink: &dyn EventSink,
) -> Result<Aggregated, ProviderError> {
    let mut aggregator = StreamAggregator::new();
    let mut interrupted = false;

    while let Some(item) = frames.recv().await {
        let frame = item?;

        if let StreamFrame::Content { text } = &frame {
            if !interrupted && pause.is_requested() {
                trace!("Pause observed mid-stream");
                interrupted = true;
            }
            if interrupted {
                continue;
            }
            sink.emit(AgentStreamEvent::Chunk {
                content: text.clone(),
            });
        }

        if !aggregator.push(frame) {
            break;
        }
    }

    let mut aggregated = aggregator.finish();
    aggregated.interrupted = interrupted;
    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use tokio::sync::mpsc;

    fn delta(index: u32, id: Option<&str>, name: Option<&str>, args: Option<&str>) -> ToolCallDelta {
        ToolCallDelta {
            index,
            id: id.map(String::from),
            name: name.map(String::from),
            arguments: args.map(String::from),
        }
    }

    fn channel(items: Vec<Result<StreamFrame, ProviderError>>) -> FrameReceiver {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            tx.try_send(item).unwrap();
        }
        rx
    }

    #[test]
    fn fragments_for_one_index_concatenate() {
        let mut agg = StreamAggregator::new();
        agg.push_delta(delta(0, Some("a"), Some("read_file"), None));
        agg.push_delta(delta(0, None, None, Some(r#"{"filepath""#)));
        agg.push_delta(delta(0, None, None, Some(r#":"x"}"#)));

        let result = agg.finish();
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].id, "a");
        assert_eq!(result.tool_calls[0].name, "read_file");
        assert_eq!(result.tool_calls[0].arguments, r#"{"filepath":"x"}"#);
        assert_eq!(result.tool_calls[0].kind, "function");
        assert_eq!(result.dropped, 0);
    }

    #[test]
    fn last_non_empty_name_and_id_win() {
        let mut agg = StreamAggregator::new();
        agg.push_delta(delta(0, Some("first"), Some("read"), Some("{")));
        agg.push_delta(delta(0, Some(""), Some(""), Some("}")));
        agg.push_delta(delta(0, Some("second"), Some("read_file"), None));

        let result = agg.finish();
        let record = &result.tool_calls[0];
        assert_eq!(record.id, "second");
        assert_eq!(record.name, "read_file");
        assert_eq!(record.arguments, "{}");
    }

    #[test]
    fn records_ordered_by_index_not_arrival() {
        let mut agg = StreamAggregator::new();
        agg.push_delta(delta(5, Some("c"), Some("run_command"), Some("{}")));
        agg.push_delta(delta(0, Some("a"), Some("read_file"), Some("{}")));
        agg.push_delta(delta(2, Some("b"), Some("write_file"), Some("{}")));

        let ids: Vec<_> = agg.finish().tool_calls.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn incomplete_records_are_dropped() {
        let mut agg = StreamAggregator::new();
        // No id
        agg.push_delta(delta(0, None, Some("write_file"), Some("{}")));
        // No name
        agg.push_delta(delta(1, Some("b"), None, Some("{}")));
        // No arguments
        agg.push_delta(delta(2, Some("c"), Some("read_file"), None));
        // Complete
        agg.push_delta(delta(3, Some("d"), Some("read_file"), Some("{}")));

        let result = agg.finish();
        assert_eq!(result.dropped, 3);
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].id, "d");
    }

    #[test]
    fn text_accumulates_and_done_stops() {
        let mut agg = StreamAggregator::new();
        assert!(agg.push(StreamFrame::content("Hel")));
        assert!(agg.push(StreamFrame::content("lo")));
        assert_eq!(agg.text(), "Hello");
        assert!(!agg.push(StreamFrame::Done));
    }

    #[tokio::test]
    async fn aggregate_emits_chunks_and_stops_at_done() {
        let rx = channel(vec![
            Ok(StreamFrame::content("Hi ")),
            Ok(StreamFrame::content("there")),
            Ok(StreamFrame::Done),
            Ok(StreamFrame::content("ignored")),
        ]);
        let (tx, mut events) = mpsc::unbounded_channel();

        let result = aggregate(rx, &PauseSignal::new(), &tx).await.unwrap();
        assert_eq!(result.text, "Hi there");
        assert!(!result.interrupted);

        let mut chunks = Vec::new();
        while let Ok(AgentStreamEvent::Chunk { content }) = events.try_recv() {
            chunks.push(content);
        }
        assert_eq!(chunks, ["Hi ", "there"]);
    }

    #[tokio::test]
    async fn aggregate_treats_closed_channel_as_end() {
        let rx = channel(vec![
            Ok(StreamFrame::content("partial")),
            Ok(StreamFrame::ToolCallDelta(delta(0, Some("a"), Some("read_file"), Some("{}")))),
        ]);
        let result = aggregate(rx, &PauseSignal::new(), &NullSink).await.unwrap();
        assert_eq!(result.text, "partial");
        assert_eq!(result.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn aggregate_propagates_stream_error() {
        let rx = channel(vec![
            Ok(StreamFrame::content("a")),
            Err(ProviderError::StreamInterrupted("reset".into())),
        ]);
        let err = aggregate(rx, &PauseSignal::new(), &NullSink).await.unwrap_err();
        assert!(matches!(err, ProviderError::StreamInterrupted(_)));
    }

    /// Requests a pause as soon as the first chunk is displayed.
    struct PauseOnFirstChunk(PauseSignal);

    impl EventSink for PauseOnFirstChunk {
        fn emit(&self, event: AgentStreamEvent) {
            if matches!(event, AgentStreamEvent::Chunk { .. }) {
                self.0.request();
            }
        }
    }

    #[tokio::test]
    async fn pause_stops_content_but_keeps_buffered_calls() {
        let rx = channel(vec![
            Ok(StreamFrame::content("Working")),
            Ok(StreamFrame::ToolCallDelta(delta(0, Some("a"), Some("read_file"), Some("{}")))),
            Ok(StreamFrame::content(" more")),
            Ok(StreamFrame::Done),
        ]);

        let pause = PauseSignal::new();
        let sink = PauseOnFirstChunk(pause.clone());
        let result = aggregate(rx, &pause, &sink).await.unwrap();

        assert!(result.interrupted);
        assert_eq!(result.text, "Working");
        assert_eq!(result.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn deltas_after_pause_complete_the_call() {
        let rx = channel(vec![
            Ok(StreamFrame::content("Reading")),
            Ok(StreamFrame::ToolCallDelta(delta(0, Some("a"), Some("read_file"), None))),
            Ok(StreamFrame::content(" now")),
            Ok(StreamFrame::ToolCallDelta(delta(0, None, None, Some(r#"{"filepath":"x"}"#)))),
            Ok(StreamFrame::content(" and more")),
            Ok(StreamFrame::Done),
        ]);

        let pause = PauseSignal::new();
        let sink = PauseOnFirstChunk(pause.clone());
        let result = aggregate(rx, &pause, &sink).await.unwrap();

        assert!(result.interrupted);
        assert_eq!(result.text, "Reading");
        assert_eq!(result.dropped, 0);
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].id, "a");
        assert_eq!(result.tool_calls[0].arguments, r#"{"filepath":"x"}"#);
    }
}
