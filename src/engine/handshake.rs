//! UCI startup handshake.
//!
//! `uci` -> `uciok`, then `isready` -> `readyok`, then the configured options.
//! Unrelated lines (banners, `option` lists, diagnostics) are read and
//! discarded while scanning for each sentinel.

use std::time::Duration;

use super::error::{HandshakeError, HandshakeStage};
use super::process::{EngineIo, ReadOutcome};
use crate::logging::Logger;
use crate::timer::Deadline;
use crate::uci::{is_readyok, is_uciok, parse_id, EngineOptions, UciCommand};

/// Bound on each handshake step.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    pub timeout: Duration,
    pub options: EngineOptions,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        HandshakeConfig {
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            options: EngineOptions::default(),
        }
    }
}

/// What the engine reported about itself during `uci`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// How a scan for a sentinel line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    Found,
    TimedOut,
    Closed,
}

/// Read lines until `is_sentinel` matches, the deadline passes or the engine dies.
///
/// Every line before the sentinel is handed to `on_line`.
pub(crate) fn wait_for<E, P, F>(io: &mut E, deadline: &Deadline, is_sentinel: P, mut on_line: F) -> Wait
where
    E: EngineIo + ?Sized,
    P: Fn(&str) -> bool,
    F: FnMut(&str),
{
    loop {
        match io.read_line(deadline) {
            ReadOutcome::Line(line) if is_sentinel(&line) => return Wait::Found,
            ReadOutcome::Line(line) => on_line(&line),
            ReadOutcome::TimedOut => return Wait::TimedOut,
            ReadOutcome::Closed => return Wait::Closed,
        }
    }
}

/// Bring a freshly spawned engine into a ready-to-search state.
pub fn initialize<E>(
    io: &mut E,
    config: &HandshakeConfig,
    logger: &Logger,
) -> Result<EngineIdentity, HandshakeError>
where
    E: EngineIo + ?Sized,
{
    let mut identity = EngineIdentity::default();

    io.send(&UciCommand::Uci)?;
    let deadline = Deadline::after(config.timeout);
    let outcome = wait_for(io, &deadline, is_uciok, |line| match parse_id(line) {
        Some(("name", name)) => identity.name = Some(name.to_string()),
        Some(("author", author)) => identity.author = Some(author.to_string()),
        _ => {}
    });
    check(outcome, HandshakeStage::Uci, &deadline, logger)?;

    io.send(&UciCommand::IsReady)?;
    let deadline = Deadline::after(config.timeout);
    let outcome = wait_for(io, &deadline, is_readyok, |_| {});
    check(outcome, HandshakeStage::IsReady, &deadline, logger)?;

    for option in config.options.iter() {
        io.send(&option.to_command())?;
    }

    match &identity.name {
        Some(name) => logger.debug(&format!("UCI initialized ({name})")),
        None => logger.debug("UCI initialized"),
    }
    Ok(identity)
}

fn check(
    outcome: Wait,
    stage: HandshakeStage,
    deadline: &Deadline,
    logger: &Logger,
) -> Result<(), HandshakeError> {
    let err = match outcome {
        Wait::Found => return Ok(()),
        Wait::TimedOut => HandshakeError::Timeout {
            stage,
            waited: deadline.elapsed(),
        },
        Wait::Closed => HandshakeError::EngineDied { stage },
    };
    logger.debug(&format!("Handshake failed: {err}"));
    Err(err)
}
