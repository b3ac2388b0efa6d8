//! The conversation loop.
//!
//! One call to [`ConversationLoop::turn`] takes user input to a terminal
//! outcome:
//!
//! 1. Append the `user` message (with the active mode's text prepended).
//! 2. Stream a model response and aggregate it.
//! 3. No valid tool calls: append the `assistant` message and return it.
//! 4. Otherwise append the `assistant` message carrying the calls, run each
//!    call in order (one `tool` message per call), append an empty `user`
//!    message and go back to step 2.
//!
//! The loop is iterative and capped at `max_tool_rounds` model requests per
//! turn. A pause request ends the turn at the next content fragment or
//! before the next tool call.

use std::sync::Arc;

use laid_core::{
    Error, History, Message, PauseSignal, Provider, ProviderRequest, ToolCallRecord, ToolResult,
};
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregated, aggregate};
use crate::command::Command;
use crate::dispatcher::ToolDispatcher;
use crate::modes::ModeCatalog;
use crate::sink::{EventSink, NullSink};
use crate::stream_event::AgentStreamEvent;

/// Tool result recorded for calls skipped because of a pause.
pub const INTERRUPTED_BY_PAUSE: &str = "tool call interrupted by user pause";

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model answered without calling tools.
    Answer(String),

    /// A pause request stopped the turn; `partial` is the text streamed so far.
    Paused { partial: String },

    /// The model kept calling tools until the request cap was hit.
    RoundLimit { rounds: u32 },

    /// The input was a command; no model request was made.
    Handled(CommandReply),
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    ModeSet(String),
    ModeCleared,
    UnknownMode {
        requested: String,
        available: Vec<String>,
    },
    ModeStatus {
        active: Option<String>,
        available: Vec<String>,
    },
    /// Model switching belongs to the caller, who owns the configuration.
    SwitchModel { selector: Option<String> },
    PauseAcknowledged,
}

/// Owns one conversation: its history, mode and pause state.
pub struct ConversationLoop {
    /// The model transport
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per model response
    max_tokens: Option<u32>,

    /// Validates and runs tool calls
    dispatcher: ToolDispatcher,

    /// Append-only message log, starting with the system prompt
    history: History,

    /// Shared with whoever may interrupt the turn
    pause: PauseSignal,

    /// Available modes
    modes: ModeCatalog,

    /// The mode prepended to user input, if any
    active_mode: Option<String>,

    /// Maximum model requests per turn
    max_tool_rounds: u32,

    /// Receives progress events
    sink: Arc<dyn EventSink>,
}

impl ConversationLoop {
    /// Create a loop whose history starts with `system_prompt`.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        dispatcher: ToolDispatcher,
        system_prompt: impl Into<String>,
    ) -> Self {
        let mut history = History::new();
        // Only tool messages can be rejected
        let _ = history.push(Message::system(system_prompt));

        Self {
            provider,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
            dispatcher,
            history,
            pause: PauseSignal::new(),
            modes: ModeCatalog::builtin(),
            active_mode: None,
            max_tool_rounds: 25,
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of model requests per turn.
    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max.max(1);
        self
    }

    pub fn with_modes(mut self, modes: ModeCatalog) -> Self {
        self.modes = modes;
        self
    }

    /// Route progress events to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a pause signal created elsewhere (e.g. before a signal handler
    /// was installed).
    pub fn with_pause_signal(mut self, pause: PauseSignal) -> Self {
        self.pause = pause;
        self
    }

    /// Use `model` for all subsequent requests.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        info!(model = %self.model, "Model switched");
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// A handle that can request a pause from another task.
    pub fn pause_handle(&self) -> PauseSignal {
        self.pause.clone()
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }

    pub fn modes(&self) -> &ModeCatalog {
        &self.modes
    }

    /// Process one line of user input.
    ///
    /// Errors mean the turn was aborted by the transport; everything
    /// appended before the failure stays in the history.
    pub async fn turn(&mut self, input: &str) -> Result<TurnOutcome, Error> {
        if let Some(command) = Command::parse(input) {
            return Ok(TurnOutcome::Handled(self.handle_command(command)));
        }

        if self.pause.clear() {
            debug!("Cleared pause from previous turn");
        }

        let content = match self.active_mode_prompt() {
            Some(prompt) if !input.trim().is_empty() => format!("{prompt}{input}"),
            _ => input.to_string(),
        };
        self.history.push(Message::user(content))?;

        info!(
            model = %self.model,
            messages = self.history.len(),
            mode = self.active_mode.as_deref().unwrap_or("none"),
            "Processing turn"
        );

        let mut rounds = 0u32;
        let mut tool_calls_made = 0usize;

        loop {
            rounds += 1;
            debug!(round = rounds, "Requesting model response");

            let aggregated = match self.stream_response().await {
                Ok(aggregated) => aggregated,
                Err(e) => {
                    warn!(error = %e, round = rounds, "Turn aborted");
                    self.sink.emit(AgentStreamEvent::Error {
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            };

            let Aggregated {
                text,
                tool_calls,
                interrupted,
                ..
            } = aggregated;

            if tool_calls.is_empty() {
                self.history.push(Message::assistant(text.clone()))?;

                if interrupted {
                    self.sink.emit(AgentStreamEvent::Paused {
                        partial: text.clone(),
                    });
                    return Ok(TurnOutcome::Paused { partial: text });
                }

                self.sink.emit(AgentStreamEvent::Done {
                    rounds,
                    tool_calls_made,
                });
                return Ok(TurnOutcome::Answer(text));
            }

            self.history.push(Message::assistant_with_tool_calls(
                text.clone(),
                tool_calls.clone(),
            ))?;
            tool_calls_made += self.dispatch_all(&tool_calls).await?;

            if self.pause.is_requested() {
                info!(round = rounds, "Turn paused");
                self.sink.emit(AgentStreamEvent::Paused {
                    partial: text.clone(),
                });
                return Ok(TurnOutcome::Paused { partial: text });
            }

            if rounds >= self.max_tool_rounds {
                warn!(rounds, "Max tool rounds reached, ending turn");
                self.sink.emit(AgentStreamEvent::Error {
                    message: format!("stopped after {rounds} tool rounds"),
                });
                return Ok(TurnOutcome::RoundLimit { rounds });
            }

            // Continuations carry empty input, never the mode text
            self.history.push(Message::user(String::new()))?;
        }
    }

    async fn stream_response(&self) -> Result<Aggregated, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.history.messages().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.dispatcher.definitions(),
            stream: true,
        };

        let frames = self.provider.stream(request).await?;
        let aggregated = aggregate(frames, &self.pause, self.sink.as_ref()).await?;

        debug!(
            chars = aggregated.text.len(),
            tool_calls = aggregated.tool_calls.len(),
            dropped = aggregated.dropped,
            interrupted = aggregated.interrupted,
            "Response aggregated"
        );
        Ok(aggregated)
    }

    /// Run calls strictly in order, one `tool` message each. Once a pause
    /// is requested the remaining calls are recorded as interrupted.
    /// Returns how many calls were actually dispatched.
    async fn dispatch_all(&mut self, calls: &[ToolCallRecord]) -> Result<usize, Error> {
        let mut dispatched = 0;

        for call in calls {
            let result = if self.pause.is_requested() {
                ToolResult::error(INTERRUPTED_BY_PAUSE)
            } else {
                self.sink.emit(AgentStreamEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });
                dispatched += 1;
                self.dispatcher.execute(call).await
            };

            let output = result.to_content();
            self.sink.emit(AgentStreamEvent::ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: output.clone(),
                success: !result.is_error(),
            });
            self.history
                .push(Message::tool_result(call.id.clone(), output))?;
        }

        Ok(dispatched)
    }

    fn active_mode_prompt(&self) -> Option<&str> {
        self.active_mode
            .as_deref()
            .and_then(|name| self.modes.get(name))
    }

    fn handle_command(&mut self, command: Command) -> CommandReply {
        match command {
            Command::SetMode(name) => {
                if self.modes.contains(&name) {
                    info!(mode = %name, "Mode set");
                    self.active_mode = Some(name.clone());
                    CommandReply::ModeSet(name)
                } else {
                    CommandReply::UnknownMode {
                        requested: name,
                        available: self.modes.names(),
                    }
                }
            }
            Command::ClearMode => {
                self.active_mode = None;
                CommandReply::ModeCleared
            }
            Command::ModeStatus => CommandReply::ModeStatus {
                active: self.active_mode.clone(),
                available: self.modes.names(),
            },
            Command::SwitchModel(selector) => CommandReply::SwitchModel { selector },
            Command::Pause => CommandReply::PauseAcknowledged,
        }
    }
}
