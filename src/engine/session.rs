//! One position-evaluation cycle against a ready engine.
//!
//! `ucinewgame` + `isready` resync, `position fen`, `go movetime`, then read
//! `info` lines until `bestmove`. Only the latest score is kept.

use std::fmt;
use std::time::Duration;

use shakmaty::fen::Fen;

use super::error::SessionError;
use super::handshake::{wait_for, Wait};
use super::process::{EngineIo, ReadOutcome};
use crate::logging::Logger;
use crate::timer::Deadline;
use crate::uci::{
    is_readyok, parse_bestmove, parse_info_score, BestMove, BestMoveLine, InfoScore, Score,
    ScoreKind, UciCommand,
};

/// Bound on the `readyok` wait before each search.
pub const DEFAULT_RESYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time allowed on top of `movetime` before a search is abandoned.
pub const DEFAULT_SEARCH_GRACE: Duration = Duration::from_secs(10);

fn check_fen(fen: &str) -> Result<(), SessionError> {
    let fen = fen.trim();
    let single_line = !fen.chars().any(char::is_control);
    if single_line && Fen::from_ascii(fen.as_bytes()).is_ok() {
        return Ok(());
    }
    Err(SessionError::InvalidFen {
        fen: fen.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub resync_timeout: Duration,
    pub search_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            resync_timeout: DEFAULT_RESYNC_TIMEOUT,
            search_grace: DEFAULT_SEARCH_GRACE,
        }
    }
}

impl SessionConfig {
    /// Total wait for `bestmove` after `go movetime <movetime_ms>`.
    #[must_use]
    pub fn search_budget(&self, movetime_ms: u64) -> Duration {
        Duration::from_millis(movetime_ms).saturating_add(self.search_grace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Resyncing,
    PositionSet,
    Searching,
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Resyncing => "resyncing",
            SessionPhase::PositionSet => "position set",
            SessionPhase::Searching => "searching",
            SessionPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Answer to one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: BestMove,
    /// Last score reported before `bestmove`, from the side to move's view
    pub score: Option<Score>,
    /// Depth of the `info` line that carried `score`
    pub depth: Option<u32>,
}

impl SearchResult {
    #[must_use]
    pub fn score_kind(&self) -> ScoreKind {
        self.score.map_or(ScoreKind::Absent, |s| s.kind())
    }

    /// Raw centipawns or signed mate distance.
    #[must_use]
    pub fn score_value(&self) -> Option<i32> {
        self.score.map(|s| s.value())
    }

    #[must_use]
    pub fn is_mate(&self) -> bool {
        self.score_kind() == ScoreKind::MateInN
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.best_move)?;
        if let Some(score) = self.score {
            write!(f, " ({score}")?;
            if let Some(depth) = self.depth {
                write!(f, ", depth {depth}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Drives a single search on an engine that has completed the handshake.
pub struct SearchSession<'a, E: EngineIo + ?Sized> {
    io: &'a mut E,
    config: SessionConfig,
    logger: &'a Logger,
    phase: SessionPhase,
    latest: Option<InfoScore>,
}

impl<'a, E: EngineIo + ?Sized> SearchSession<'a, E> {
    pub fn new(io: &'a mut E, config: SessionConfig, logger: &'a Logger) -> Self {
        SearchSession {
            io,
            config,
            logger,
            phase: SessionPhase::Resyncing,
            latest: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn enter(&mut self, phase: SessionPhase) {
        self.logger
            .debug(&format!("Search: {} -> {}", self.phase, phase));
        self.phase = phase;
    }

    /// Evaluate `fen` for `movetime_ms` and return the engine's answer.
    ///
    /// A FEN that does not parse, or that would span more than one wire line,
    /// is rejected before any command is sent.
    pub fn run(mut self, fen: &str, movetime_ms: u64) -> Result<SearchResult, SessionError> {
        check_fen(fen)?;
        self.resync()?;

        self.io.send(&UciCommand::position(fen))?;
        self.enter(SessionPhase::PositionSet);

        self.io.send(&UciCommand::go_movetime(movetime_ms))?;
        self.enter(SessionPhase::Searching);

        let result = self.search(movetime_ms);
        self.enter(SessionPhase::Done);
        result
    }

    fn resync(&mut self) -> Result<(), SessionError> {
        self.io.send(&UciCommand::UciNewGame)?;
        self.io.send(&UciCommand::IsReady)?;

        let deadline = Deadline::after(self.config.resync_timeout);
        match wait_for(&mut *self.io, &deadline, is_readyok, |_| {}) {
            Wait::Found => Ok(()),
            Wait::TimedOut => {
                self.logger
                    .debug("Engine not ready for new game. Aborting search.");
                Err(SessionError::NotReady)
            }
            Wait::Closed => Err(SessionError::Terminated),
        }
    }

    fn search(&mut self, movetime_ms: u64) -> Result<SearchResult, SessionError> {
        let deadline = Deadline::after(self.config.search_budget(movetime_ms));

        loop {
            let line = match self.io.read_line(&deadline) {
                ReadOutcome::Line(line) => line,
                ReadOutcome::TimedOut => return Err(self.timed_out(&deadline)),
                ReadOutcome::Closed => {
                    self.logger
                        .debug("Engine stream ended while waiting for bestmove");
                    return Err(SessionError::Terminated);
                }
            };

            match parse_bestmove(&line) {
                Some(BestMoveLine::Found(best_move)) => {
                    return Ok(SearchResult {
                        best_move,
                        score: self.latest.map(|info| info.score),
                        depth: self.latest.and_then(|info| info.depth),
                    });
                }
                Some(BestMoveLine::Malformed) => return Err(SessionError::Malformed { line }),
                None => {}
            }

            if let Some(info) = parse_info_score(&line) {
                self.latest = Some(info);
            }
        }
    }

    fn timed_out(&mut self, deadline: &Deadline) -> SessionError {
        let waited = deadline.elapsed();
        self.logger.debug(&format!(
            "Timeout ({:.1}s) waiting for bestmove from engine",
            waited.as_secs_f64()
        ));
        // The engine may ignore `stop`; its late `bestmove` is skipped by the next resync.
        if self.io.send(&UciCommand::Stop).is_err() {
            return SessionError::Terminated;
        }
        SessionError::Timeout {
            score: self.latest.map(|info| info.score),
            waited,
        }
    }
}
