use std::fmt;

/// A command in the GUI-to-engine direction.
///
/// `Display` renders the exact wire form, without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: String },
    Position { fen: String },
    Go { movetime_ms: u64 },
    Stop,
    Quit,
}

impl UciCommand {
    #[must_use]
    pub fn position(fen: &str) -> Self {
        UciCommand::Position {
            fen: fen.trim().to_string(),
        }
    }

    #[must_use]
    pub fn go_movetime(movetime_ms: u64) -> Self {
        UciCommand::Go { movetime_ms }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::UciNewGame => write!(f, "ucinewgame"),
            UciCommand::SetOption { name, value } => {
                write!(f, "setoption name {name} value {value}")
            }
            UciCommand::Position { fen } => write!(f, "position fen {fen}"),
            UciCommand::Go { movetime_ms } => write!(f, "go movetime {movetime_ms}"),
            UciCommand::Stop => write!(f, "stop"),
            UciCommand::Quit => write!(f, "quit"),
        }
    }
}
