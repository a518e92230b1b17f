//! Error types for engine process management and the UCI exchange.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::uci::Score;

/// Raw OS error for "exec format error" on Unix.
const ENOEXEC: i32 = 8;
/// `ERROR_BAD_EXE_FORMAT` on Windows.
const ERROR_BAD_EXE_FORMAT: i32 = 193;

/// Error type for engine launch failures
#[derive(Debug)]
pub enum LaunchError {
    /// The executable path does not resolve
    ExecutableNotFound { path: PathBuf },
    /// The OS rejected the binary format (wrong architecture or OS)
    IncompatibleBinary { path: PathBuf },
    /// Any other OS-level spawn failure
    Spawn { path: PathBuf, source: io::Error },
}

impl LaunchError {
    /// Classify an error returned by `Command::spawn`.
    #[must_use]
    pub fn from_spawn(path: PathBuf, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            return LaunchError::ExecutableNotFound { path };
        }
        match err.raw_os_error() {
            Some(code) if cfg!(unix) && code == ENOEXEC => {
                LaunchError::IncompatibleBinary { path }
            }
            Some(code) if cfg!(windows) && code == ERROR_BAD_EXE_FORMAT => {
                LaunchError::IncompatibleBinary { path }
            }
            _ => LaunchError::Spawn { path, source: err },
        }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::ExecutableNotFound { path } => {
                write!(f, "engine executable not found at {}", path.display())
            }
            LaunchError::IncompatibleBinary { path } => write!(
                f,
                "engine executable {} is not compatible with this OS or architecture",
                path.display()
            ),
            LaunchError::Spawn { path, source } => {
                write!(f, "failed to start engine {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Writing to the engine's stdin failed; the engine is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeClosed;

impl fmt::Display for PipeClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine stdin pipe is closed")
    }
}

impl std::error::Error for PipeClosed {}

/// Which handshake step was in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Uci,
    IsReady,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStage::Uci => write!(f, "uciok"),
            HandshakeStage::IsReady => write!(f, "readyok"),
        }
    }
}

/// Error type for the startup handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The sentinel did not arrive in time
    Timeout {
        stage: HandshakeStage,
        waited: Duration,
    },
    /// The engine exited before sending the sentinel
    EngineDied { stage: HandshakeStage },
    /// A command could not be written
    PipeClosed,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Timeout { stage, waited } => write!(
                f,
                "timed out after {:.1}s waiting for '{stage}'",
                waited.as_secs_f64()
            ),
            HandshakeError::EngineDied { stage } => {
                write!(f, "engine terminated while waiting for '{stage}'")
            }
            HandshakeError::PipeClosed => write!(f, "engine stdin closed during handshake"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<PipeClosed> for HandshakeError {
    fn from(_: PipeClosed) -> Self {
        HandshakeError::PipeClosed
    }
}

/// Error type for a single search cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No `readyok` after `ucinewgame`/`isready`; the engine is presumed alive
    NotReady,
    /// No `bestmove` within the budget; carries the last score seen
    Timeout {
        score: Option<Score>,
        waited: Duration,
    },
    /// The engine exited or its pipes broke; the handle is dead
    Terminated,
    /// A `bestmove` line without a move token
    Malformed { line: String },
    /// The position was rejected before anything was sent
    InvalidFen { fen: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotReady => write!(f, "engine not ready for a new search"),
            SessionError::Timeout { waited, .. } => write!(
                f,
                "timed out after {:.1}s waiting for 'bestmove'",
                waited.as_secs_f64()
            ),
            SessionError::Terminated => write!(f, "engine terminated during search"),
            SessionError::Malformed { line } => write!(f, "malformed engine reply '{line}'"),
            SessionError::InvalidFen { fen } => write!(f, "invalid FEN {fen:?}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<PipeClosed> for SessionError {
    fn from(_: PipeClosed) -> Self {
        SessionError::Terminated
    }
}

/// Why no engine could be used for a request.
#[derive(Debug)]
pub enum UnavailableReason {
    Launch(LaunchError),
    Handshake(HandshakeError),
    /// The engine died during the search; the next request restarts it
    Terminated,
    /// `shutdown` was called
    ShutDown,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Launch(e) => write!(f, "{e}"),
            UnavailableReason::Handshake(e) => write!(f, "handshake failed: {e}"),
            UnavailableReason::Terminated => write!(f, "engine terminated unexpectedly"),
            UnavailableReason::ShutDown => write!(f, "engine has been shut down"),
        }
    }
}

/// Error returned to consumers of the engine supervisor
#[derive(Debug)]
pub enum EngineError {
    /// No live engine could serve the request
    Unavailable(UnavailableReason),
    /// The engine did not acknowledge the resync; a later request may succeed
    NotReady,
    /// The search ran out of time; carries the last score seen
    SearchTimeout { score: Option<Score> },
    /// The engine answered with something unusable
    InvalidResponse(String),
    /// The requested position is not a single-line FEN
    InvalidFen(String),
}

impl EngineError {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Unavailable(reason) => write!(f, "engine unavailable: {reason}"),
            EngineError::NotReady => write!(f, "engine not ready"),
            EngineError::SearchTimeout { score: Some(score) } => {
                write!(f, "search timed out (last score {score})")
            }
            EngineError::SearchTimeout { score: None } => write!(f, "search timed out"),
            EngineError::InvalidResponse(line) => write!(f, "invalid engine response '{line}'"),
            EngineError::InvalidFen(fen) => write!(f, "invalid FEN {fen:?}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Unavailable(UnavailableReason::Launch(e)) => Some(e),
            EngineError::Unavailable(UnavailableReason::Handshake(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<LaunchError> for EngineError {
    fn from(e: LaunchError) -> Self {
        EngineError::Unavailable(UnavailableReason::Launch(e))
    }
}

impl From<HandshakeError> for EngineError {
    fn from(e: HandshakeError) -> Self {
        EngineError::Unavailable(UnavailableReason::Handshake(e))
    }
}

impl From<PipeClosed> for EngineError {
    fn from(_: PipeClosed) -> Self {
        EngineError::Unavailable(UnavailableReason::Terminated)
    }
}

impl From<SessionError> for EngineError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotReady => EngineError::NotReady,
            SessionError::Timeout { score, .. } => EngineError::SearchTimeout { score },
            SessionError::Terminated => EngineError::Unavailable(UnavailableReason::Terminated),
            SessionError::Malformed { line } => EngineError::InvalidResponse(line),
            SessionError::InvalidFen { fen } => EngineError::InvalidFen(fen),
        }
    }
}
