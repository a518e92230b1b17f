//! Engine supervisor: the single entry point consumers use.
//!
//! Starts the engine lazily, restarts it at most once per request when it has
//! died, serializes searches, and guarantees the process is cleaned up.

use std::time::Duration;

use parking_lot::Mutex;

use super::error::{EngineError, SessionError, UnavailableReason};
use super::handshake::{self, EngineIdentity, HandshakeConfig};
use super::process::{EngineHandle, EngineSpec, EngineState, DEFAULT_QUIT_GRACE};
use super::session::{SearchResult, SearchSession, SessionConfig};
use crate::logging::Logger;
use crate::uci::EngineOptions;

/// Configuration for an [`EngineSupervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub engine: EngineSpec,
    pub handshake: HandshakeConfig,
    pub session: SessionConfig,
    /// Wait after `quit` before the process is killed
    pub quit_grace: Duration,
}

impl SupervisorConfig {
    pub fn new(engine: EngineSpec) -> Self {
        SupervisorConfig {
            engine,
            handshake: HandshakeConfig::default(),
            session: SessionConfig::default(),
            quit_grace: DEFAULT_QUIT_GRACE,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.handshake.options = options;
        self
    }
}

/// Anything that can answer "best move and evaluation for this position".
pub trait MoveOracle {
    fn best_move_and_eval(&self, fen: &str, movetime_ms: u64)
        -> Result<SearchResult, EngineError>;
}

#[derive(Default)]
struct Inner {
    handle: Option<EngineHandle>,
    identity: Option<EngineIdentity>,
    spawn_attempts: u32,
    shut_down: bool,
}

/// Owns the engine process exclusively.
///
/// All methods take `&self`; searches are mutually exclusive behind an
/// internal lock, so the supervisor can be shared between a GUI thread and an
/// auto-play thread.
pub struct EngineSupervisor {
    config: SupervisorConfig,
    logger: Logger,
    inner: Mutex<Inner>,
}

impl EngineSupervisor {
    /// Create a supervisor. No process is started until the first request.
    pub fn new(config: SupervisorConfig, logger: Logger) -> Self {
        EngineSupervisor {
            config,
            logger,
            inner: Mutex::new(Inner::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start the engine now instead of on the first request.
    pub fn ensure_started(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        self.live_handle(&mut inner).map(|_| ())
    }

    /// Search `fen` for `movetime_ms` and return the best move and last score.
    ///
    /// Blocks for up to `movetime_ms` plus the configured grace period.
    pub fn best_move_and_eval(
        &self,
        fen: &str,
        movetime_ms: u64,
    ) -> Result<SearchResult, EngineError> {
        let mut inner = self.inner.lock();
        let handle = self.live_handle(&mut inner)?;

        handle.set_state(EngineState::Busy);
        let outcome =
            SearchSession::new(handle, self.config.session, &self.logger).run(fen, movetime_ms);

        match outcome {
            Ok(result) => {
                handle.set_state(EngineState::Ready);
                self.logger.debug(&format!("Engine answered {result}"));
                Ok(result)
            }
            Err(SessionError::Terminated) => {
                if let Some(mut dead) = inner.handle.take() {
                    dead.terminate(self.config.quit_grace);
                }
                self.logger
                    .user("Engine stopped responding; it will be restarted on the next request.");
                Err(EngineError::from(SessionError::Terminated))
            }
            Err(e) => {
                handle.set_state(EngineState::Ready);
                self.logger.user(&format!("Engine search failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Terminate the engine. Idempotent; later requests fail as unavailable.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shut_down = true;
        if let Some(mut handle) = inner.handle.take() {
            handle.terminate(self.config.quit_grace);
            self.logger.debug("Chess engine stopped.");
        }
    }

    /// Current lifecycle state. Reports `Busy` while a request holds the engine.
    #[must_use]
    pub fn state(&self) -> EngineState {
        let Some(mut guard) = self.inner.try_lock() else {
            return EngineState::Busy;
        };
        let inner = &mut *guard;
        match inner.handle.as_mut() {
            Some(handle) => {
                handle.is_alive();
                handle.state()
            }
            None if inner.spawn_attempts == 0 && !inner.shut_down => EngineState::NotStarted,
            None => EngineState::Dead,
        }
    }

    /// Identity reported by the most recent successful handshake.
    #[must_use]
    pub fn identity(&self) -> Option<EngineIdentity> {
        self.inner.lock().identity.clone()
    }

    /// Number of spawn-and-handshake attempts made so far.
    #[must_use]
    pub fn spawn_attempts(&self) -> u32 {
        self.inner.lock().spawn_attempts
    }

    /// Return the live handle, making exactly one start attempt if there is none.
    fn live_handle<'i>(&self, inner: &'i mut Inner) -> Result<&'i mut EngineHandle, EngineError> {
        if inner.shut_down {
            return Err(EngineError::Unavailable(UnavailableReason::ShutDown));
        }

        let alive = inner.handle.as_mut().is_some_and(EngineHandle::is_alive);
        if alive {
            return inner
                .handle
                .as_mut()
                .ok_or(EngineError::Unavailable(UnavailableReason::Terminated));
        }

        if let Some(mut dead) = inner.handle.take() {
            self.logger.debug("Engine not running. Attempting restart...");
            dead.terminate(self.config.quit_grace);
        }

        inner.spawn_attempts += 1;
        match self.launch() {
            Ok((handle, identity)) => {
                inner.identity = Some(identity);
                Ok(inner.handle.insert(handle))
            }
            Err(e) => {
                self.logger.user(&format!("Could not start chess engine: {e}"));
                Err(e)
            }
        }
    }

    fn launch(&self) -> Result<(EngineHandle, EngineIdentity), EngineError> {
        let mut handle = EngineHandle::start(&self.config.engine, self.logger.clone())?;

        match handshake::initialize(&mut handle, &self.config.handshake, &self.logger) {
            Ok(identity) => {
                handle.set_state(EngineState::Ready);
                self.logger.debug("Chess engine started and UCI initialized.");
                Ok((handle, identity))
            }
            Err(e) => {
                handle.terminate(self.config.quit_grace);
                Err(e.into())
            }
        }
    }
}

impl MoveOracle for EngineSupervisor {
    fn best_move_and_eval(
        &self,
        fen: &str,
        movetime_ms: u64,
    ) -> Result<SearchResult, EngineError> {
        EngineSupervisor::best_move_and_eval(self, fen, movetime_ms)
    }
}

impl Drop for EngineSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::LaunchError;
    use crate::logging::{self, LogLevel};

    fn missing_engine() -> SupervisorConfig {
        SupervisorConfig::new(EngineSpec::new("/no/such/dir/engine-binary"))
    }

    #[test]
    fn test_lazy_start() {
        let supervisor = EngineSupervisor::new(missing_engine(), Logger::silent());
        assert_eq!(supervisor.state(), EngineState::NotStarted);
        assert_eq!(supervisor.spawn_attempts(), 0);
    }

    #[test]
    fn test_missing_engine_fails_with_one_attempt_per_call() {
        let (logger, messages) = logging::capture();
        let supervisor = EngineSupervisor::new(missing_engine(), logger);

        let err = supervisor.best_move_and_eval("8/8/8/8/8/8/8/8 w - - 0 1", 100).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unavailable(UnavailableReason::Launch(
                LaunchError::ExecutableNotFound { .. }
            ))
        ));
        assert_eq!(supervisor.spawn_attempts(), 1);
        assert_eq!(supervisor.state(), EngineState::Dead);

        assert!(supervisor.best_move_and_eval("8/8/8/8/8/8/8/8 w - - 0 1", 100).is_err());
        assert_eq!(supervisor.spawn_attempts(), 2);

        assert!(messages
            .lock()
            .iter()
            .any(|(msg, level)| *level == LogLevel::User && msg.contains("not found")));
    }

    #[test]
    fn test_shutdown_is_idempotent_and_final() {
        let supervisor = EngineSupervisor::new(missing_engine(), Logger::silent());
        supervisor.shutdown();
        supervisor.shutdown();

        let err = supervisor.best_move_and_eval("8/8/8/8/8/8/8/8 w - - 0 1", 100).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Unavailable(UnavailableReason::ShutDown)
        ));
        assert_eq!(supervisor.spawn_attempts(), 0);
        assert_eq!(supervisor.state(), EngineState::Dead);
    }

    #[test]
    fn test_state_tracks_lock_and_attempts() {
        let supervisor = EngineSupervisor::new(missing_engine(), Logger::silent());
        {
            let _held = supervisor.inner.lock();
            assert_eq!(supervisor.state(), EngineState::Busy);
        }
        assert_eq!(supervisor.state(), EngineState::NotStarted);

        assert!(supervisor.ensure_started().is_err());
        assert_eq!(supervisor.state(), EngineState::Dead);
    }

    #[test]
    fn test_config_with_options() {
        let config = missing_engine().with_options(EngineOptions::empty().with("Hash", 16));
        assert_eq!(config.handshake.options.get("Hash"), Some("16"));
        assert_eq!(config.session.search_grace, Duration::from_secs(10));
    }
}
