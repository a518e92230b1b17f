//! Game position rebuilt from a scraped move list.
//!
//! The page only shows moves in SAN, so the position is replayed from the
//! start every time it is needed.

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    /// The move list was empty
    NoMoves,
    /// Every scraped move failed to parse or was illegal
    AllFailed,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::NoMoves => write!(f, "No moves found to update board."),
            ReplayError::AllFailed => {
                write!(f, "All scraped moves failed to parse. Board not updated.")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Strip a leading move number such as `1.`, `1...` or `12. ` from a scraped token.
#[must_use]
pub fn clean_move_token(token: &str) -> &str {
    let token = token.trim();
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return token;
    }
    token
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches('.')
        .trim()
}

/// Replay `moves` from the standard start position.
///
/// Moves that do not parse or are illegal in the current position are skipped
/// and logged at debug level. Returns the position and the number of moves
/// that were applied.
pub fn replay_moves<S: AsRef<str>>(
    moves: &[S],
    logger: &Logger,
) -> Result<(Chess, usize), ReplayError> {
    let mut position = Chess::default();
    if moves.is_empty() {
        logger.user(&ReplayError::NoMoves.to_string());
        return Err(ReplayError::NoMoves);
    }

    let mut applied = 0;
    for raw in moves {
        let raw = raw.as_ref();
        let cleaned = clean_move_token(raw);
        if cleaned.is_empty() {
            continue;
        }
        match parse_san(&position, cleaned) {
            Ok(mv) => {
                position.play_unchecked(&mv);
                applied += 1;
            }
            Err(e) => logger.debug(&format!(
                "Error parsing move '{raw}' (cleaned: '{cleaned}'): {e}. Board may be out of sync."
            )),
        }
    }

    if applied == 0 {
        logger.user(&ReplayError::AllFailed.to_string());
        return Err(ReplayError::AllFailed);
    }
    logger.debug(&format!("Internal board updated with {applied} moves."));
    Ok((position, applied))
}

fn parse_san(position: &Chess, san: &str) -> Result<Move, String> {
    let san = SanPlus::from_ascii(san.as_bytes()).map_err(|e| e.to_string())?;
    san.san.to_move(position).map_err(|e| e.to_string())
}

/// FEN of `position`, with an en passant square only when a capture is legal.
#[must_use]
pub fn fen_of(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

/// Parse a FEN into a playable position.
pub fn position_from_fen(fen: &str) -> Option<Chess> {
    Fen::from_ascii(fen.trim().as_bytes())
        .ok()?
        .into_position(CastlingMode::Standard)
        .ok()
}

/// The legal move for a UCI move string in `position`, if there is one.
#[must_use]
pub fn legal_uci_move(position: &Chess, uci: &str) -> Option<Move> {
    let uci = uci.parse::<UciMove>().ok()?;
    uci.to_move(position).ok()
}

/// SAN of a legal `mv` in `position`.
#[must_use]
pub fn san_of(position: &Chess, mv: &Move) -> String {
    San::from_move(position, mv).to_string()
}
