//! Parsing of engine-to-GUI lines.
//!
//! Engines interleave free-form diagnostics with protocol output, so sentinels
//! are matched by substring and everything else is parsed token by token.

use std::fmt;

/// Evaluation reported in an `info` line.
///
/// Always from the point of view of the side to move in the searched position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    Centipawns(i32),
    /// Positive: side to move mates in N. Negative: side to move is mated in |N|.
    Mate(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Centipawn,
    MateInN,
    Absent,
}

impl Score {
    #[must_use]
    pub fn kind(&self) -> ScoreKind {
        match self {
            Score::Centipawns(_) => ScoreKind::Centipawn,
            Score::Mate(_) => ScoreKind::MateInN,
        }
    }

    #[must_use]
    pub fn value(&self) -> i32 {
        match self {
            Score::Centipawns(v) | Score::Mate(v) => *v,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "cp {cp}"),
            Score::Mate(n) => write!(f, "mate {n}"),
        }
    }
}

/// The move token of a `bestmove` line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BestMove {
    Move(String),
    /// `(none)`: the position has no legal move (checkmate or stalemate).
    NoMove,
}

impl BestMove {
    #[must_use]
    pub fn as_move(&self) -> Option<&str> {
        match self {
            BestMove::Move(mv) => Some(mv),
            BestMove::NoMove => None,
        }
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestMove::Move(mv) => write!(f, "{mv}"),
            BestMove::NoMove => write!(f, "(none)"),
        }
    }
}

/// Score data extracted from one `info` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoScore {
    pub score: Score,
    pub depth: Option<u32>,
}

#[inline]
#[must_use]
pub fn is_uciok(line: &str) -> bool {
    line.contains("uciok")
}

#[inline]
#[must_use]
pub fn is_readyok(line: &str) -> bool {
    line.contains("readyok")
}

/// Extract the score (and depth, when present) from an `info` line.
///
/// Returns `None` for lines that are not `info` lines or carry no
/// `score cp <N>` / `score mate <N>` pair.
#[must_use]
pub fn parse_info_score(line: &str) -> Option<InfoScore> {
    let line = line.trim_start();
    if !line.starts_with("info") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut score = None;
    let mut depth = None;

    let mut i = 1;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                depth = tokens.get(i + 1).and_then(|v| v.parse::<u32>().ok());
                i += 2;
            }
            "score" => {
                let value = tokens.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                score = match (tokens.get(i + 1), value) {
                    (Some(&"cp"), Some(v)) => Some(Score::Centipawns(v)),
                    (Some(&"mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => score,
                };
                i += 3;
            }
            // Everything after `pv` / `string` is free text.
            "pv" | "string" => break,
            _ => i += 1,
        }
    }

    score.map(|score| InfoScore { score, depth })
}

/// Outcome of parsing a line that starts with `bestmove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMoveLine {
    Found(BestMove),
    /// A `bestmove` line without a move token.
    Malformed,
}

/// Parse a `bestmove <move> [ponder <move>]` line. Only the move token is used.
///
/// `(none)` and the null move `0000` both mean there is no legal move.
#[must_use]
pub fn parse_bestmove(line: &str) -> Option<BestMoveLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }

    let parsed = match tokens.next() {
        Some("(none)") | Some("0000") => BestMoveLine::Found(BestMove::NoMove),
        Some(mv) => BestMoveLine::Found(BestMove::Move(mv.to_string())),
        None => BestMoveLine::Malformed,
    };
    Some(parsed)
}

/// The `id name` / `id author` payload of an identification line.
#[must_use]
pub fn parse_id(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim().strip_prefix("id ")?;
    let (key, value) = rest.split_once(' ')?;
    match key {
        "name" | "author" => Some((key, value.trim())),
        _ => None,
    }
}
