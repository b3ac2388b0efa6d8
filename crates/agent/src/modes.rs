//! Named instruction overlays.
//!
//! A mode is a block of instruction text prepended verbatim to each user
//! message while it is active. Three modes are built in; configuration can
//! add more or replace a built-in by reusing its name.

use std::collections::BTreeMap;

const PLANNING_PROMPT: &str = "
You are a Planning agent. Before anything is changed, study the request and the
project with the read-only tools available to you. Then write a step-by-step
plan to `Plan.md`: the goal, the files involved, each step with the command or
edit it needs, and how to verify the result. Do not modify any other file.
";

const LOG_ATTEMPTS_PROMPT: &str = "
You are a Logging agent. Work on the request as usual, but record every attempt
in `Attempts.md`: what you tried, the exact command or edit, what happened, and
whether it worked. Append to the log after each attempt and never rewrite
earlier entries, so the history of failed approaches is preserved.
";

const ACT_PROMPT: &str = "
You are an Action agent. Your task is to execute the plan outlined in `Plan.md`.
Read the plan file and execute each step systematically using the available tools.
For each step you complete, update your progress and document any issues or modifications needed.
Focus on practical implementation and use the appropriate tools for file operations, command execution, etc.
";

/// The modes a conversation can switch between.
#[derive(Debug, Clone)]
pub struct ModeCatalog {
    modes: BTreeMap<String, String>,
}

impl ModeCatalog {
    /// `planning`, `log_attempts` and `act`.
    pub fn builtin() -> Self {
        let modes = [
            ("planning", PLANNING_PROMPT),
            ("log_attempts", LOG_ATTEMPTS_PROMPT),
            ("act", ACT_PROMPT),
        ]
        .into_iter()
        .map(|(name, prompt)| (name.to_string(), prompt.to_string()))
        .collect();
        Self { modes }
    }

    /// Built-ins plus configured modes; configured text wins on a name clash.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut catalog = Self::builtin();
        for (name, prompt) in overrides {
            catalog.modes.insert(name.clone(), prompt.clone());
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.modes.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Mode names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
