//! System prompt construction.
//!
//! The first history entry is the configured instructions (or the built-in
//! default) followed by one line describing the host, so the model knows
//! which shell syntax and paths to use.

use std::path::Path;

/// Fallback instructions when none are configured.
pub const DEFAULT_INSTRUCTIONS: &str = "You are LAID, a local development assistant running \
on the user's machine. Use the available tools to inspect files, run commands and make \
changes when the task needs it, one step at a time. Side-effecting tools ask the user for \
approval; if a request is denied, do not retry it, explain what you needed instead. Keep \
answers short and concrete.";

/// Where the agent is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub shell: String,
    pub cwd: String,
}

impl HostInfo {
    /// Describe the current process environment.
    pub fn detect() -> Self {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| ".".into());

        Self {
            os: os_name().to_string(),
            shell: detect_shell(),
            cwd,
        }
    }

    /// `System: <os>, Shell: <shell>, Current directory: <cwd>`
    pub fn describe(&self) -> String {
        format!(
            "System: {}, Shell: {}, Current directory: {}",
            self.os, self.shell, self.cwd
        )
    }
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "macOS",
        "linux" => "Linux",
        other => other,
    }
}

fn detect_shell() -> String {
    #[cfg(target_os = "windows")]
    {
        std::env::var("COMSPEC")
            .ok()
            .and_then(|p| file_name(&p))
            .unwrap_or_else(|| "cmd.exe".into())
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("SHELL")
            .ok()
            .and_then(|p| file_name(&p))
            .unwrap_or_else(|| "sh".into())
    }
}

fn file_name(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

/// Instructions, a newline, then the host line.
pub fn build_system_prompt(instructions: Option<&str>, host: &HostInfo) -> String {
    let instructions = instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTIONS);
    format!("{instructions}\n{}", host.describe())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostInfo {
        HostInfo {
            os: "Linux".into(),
            shell: "bash".into(),
            cwd: "/home/dev/project".into(),
        }
    }

    #[test]
    fn host_line_format() {
        assert_eq!(
            host().describe(),
            "System: Linux, Shell: bash, Current directory: /home/dev/project"
        );
    }

    #[test]
    fn custom_instructions_come_first() {
        let prompt = build_system_prompt(Some("Be brief."), &host());
        assert_eq!(
            prompt,
            "Be brief.\nSystem: Linux, Shell: bash, Current directory: /home/dev/project"
        );
    }

    #[test]
    fn blank_instructions_fall_back_to_default() {
        let prompt = build_system_prompt(Some("   "), &host());
        assert!(prompt.starts_with(DEFAULT_INSTRUCTIONS));
        let prompt = build_system_prompt(None, &host());
        assert!(prompt.starts_with("You are LAID"));
    }

    #[test]
    fn detect_fills_every_field() {
        let info = HostInfo::detect();
        assert!(!info.os.is_empty());
        assert!(!info.shell.is_empty());
        assert!(!info.cwd.is_empty());
    }
}
