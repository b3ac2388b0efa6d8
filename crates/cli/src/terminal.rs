//! Terminal front end: line input, approval prompts and live rendering.
//!
//! Everything reads the process-wide std stdin, one line at a time and only
//! when asked, so an approval prompt never races the chat prompt for input.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use laid_agent::{AgentStreamEvent, EventSink};
use laid_core::ApprovalGate;

/// Read one line from stdin without blocking the runtime.
///
/// `Ok(None)` means EOF.
pub async fn read_line() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        Ok((n > 0).then_some(line))
    })
    .await
    .map_err(io::Error::other)?
}

/// Answers approval prompts from the keyboard.
#[derive(Debug, Default)]
pub struct TerminalApproval;

impl TerminalApproval {
    fn ask(prompt: &str) -> io::Result<bool> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        write!(out, "⚠️  {prompt} (y/n): ")?;
        out.flush()?;
        drop(out);

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

impl ApprovalGate for TerminalApproval {
    fn confirm(&self, prompt: &str) -> bool {
        let asked = tokio::task::block_in_place(|| Self::ask(prompt));
        asked.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Approval prompt failed, denying");
            false
        })
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints loop events as they happen.
///
/// Model text streams to stdout; tool activity and status go to stderr.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    /// A text line is open on stdout
    mid_line: AtomicBool,
}

impl TerminalRenderer {
    fn end_line(&self) {
        if self.mid_line.swap(false, Ordering::Relaxed) {
            println!();
        }
    }
}

impl EventSink for TerminalRenderer {
    fn emit(&self, event: AgentStreamEvent) {
        match event {
            AgentStreamEvent::Chunk { content } => {
                print!("{content}");
                let _ = io::stdout().flush();
                self.mid_line.store(!content.ends_with('\n'), Ordering::Relaxed);
            }
            AgentStreamEvent::ToolCall { name, arguments, .. } => {
                self.end_line();
                eprintln!("🔧 {name} {arguments}");
            }
            AgentStreamEvent::ToolResult { name, output, success, .. } => {
                if success {
                    eprintln!("   ✅ {name} done");
                } else {
                    eprintln!("   ❌ {name}: {}", error_text(&output));
                }
            }
            AgentStreamEvent::Paused { .. } => {
                self.end_line();
                eprintln!("⏸️  Paused. Type guidance to continue.");
            }
            AgentStreamEvent::Done { .. } | AgentStreamEvent::Error { .. } => self.end_line(),
        }
    }
}

/// The message inside an `{"error": ...}` tool result.
fn error_text(output: &str) -> String {
    serde_json::from_str::<serde_json::Value>(output)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or_else(|| output.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_answers() {
        for answer in ["y", "Y\n", " yes ", "YES\r\n"] {
            assert!(is_yes(answer), "{answer:?}");
        }
        for answer in ["", "n", "no", "yep", "\n"] {
            assert!(!is_yes(answer), "{answer:?}");
        }
    }

    #[test]
    fn error_text_extracts_message() {
        assert_eq!(error_text(r#"{"error":"File write denied by user"}"#), "File write denied by user");
        assert_eq!(error_text("not json"), "not json");
    }
}
