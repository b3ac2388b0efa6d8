//! Slash commands recognized before input reaches the model.
//!
//! Anything that is not one of these commands (including unknown `/words`)
//! is ordinary user input.

/// A parsed in-chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/mode <name>`
    SetMode(String),

    /// `/mode off`, `/mode none`, `/mode clear`
    ClearMode,

    /// `/mode` on its own
    ModeStatus,

    /// `/switch_model [selector]`
    SwitchModel(Option<String>),

    /// `/pause`
    Pause,
}

impl Command {
    /// Parse a line of input. Returns `None` for ordinary input.
    pub fn parse(input: &str) -> Option<Self> {
        let mut words = input.split_whitespace();
        let head = words.next()?;
        let arg = words.next();

        match head {
            "/mode" => Some(match arg {
                None => Self::ModeStatus,
                Some("off" | "none" | "clear") => Self::ClearMode,
                Some(name) => Self::SetMode(name.to_string()),
            }),
            "/switch_model" => Some(Self::SwitchModel(arg.map(String::from))),
            "/pause" => Some(Self::Pause),
            _ => None,
        }
    }
}
