//! Universal Chess Interface (UCI) wire layer, engine-client side.
//!
//! Formats the commands sent to an engine subprocess and parses the lines it
//! answers with.

pub mod command;
pub mod options;
pub mod response;

pub use command::UciCommand;
pub use options::{EngineOption, EngineOptions};
pub use response::{
    is_readyok, is_uciok, parse_bestmove, parse_id, parse_info_score, BestMove, BestMoveLine,
    InfoScore, Score, ScoreKind,
};

/// FEN of the standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
