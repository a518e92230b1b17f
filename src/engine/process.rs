//! Engine subprocess ownership and raw line transport.
//!
//! Stdout and stderr are drained by background threads so that reads can be
//! bounded by a [`Deadline`] instead of blocking forever on a hung engine.

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::error::{LaunchError, PipeClosed};
use crate::logging::Logger;
use crate::timer::Deadline;
use crate::uci::UciCommand;

/// Grace period for a natural exit after `quit` before the process is killed.
pub const DEFAULT_QUIT_GRACE: Duration = Duration::from_millis(1500);

/// Settle window for an exit status after stdout ends, and for reader threads
/// to finish after the process is reaped.
const EXIT_SETTLE: Duration = Duration::from_millis(500);

/// Poll interval while waiting for the process to exit
const EXIT_POLL: Duration = Duration::from_millis(10);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Lifecycle of an engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Starting,
    Ready,
    Busy,
    Dead,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::NotStarted => "not started",
            EngineState::Starting => "starting",
            EngineState::Ready => "ready",
            EngineState::Busy => "busy",
            EngineState::Dead => "dead",
        };
        write!(f, "{name}")
    }
}

/// Executable and arguments used to launch an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineSpec {
    pub path: PathBuf,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<String>,
}

impl EngineSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EngineSpec {
            path: path.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of a bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One line, with the trailing newline and surrounding whitespace removed
    Line(String),
    /// The deadline passed with no line available; the engine may still be alive
    TimedOut,
    /// Stdout is exhausted and the process is gone
    Closed,
}

/// Line-oriented, deadline-bounded access to an engine.
///
/// Implemented by [`EngineHandle`] for real subprocesses; the handshake and
/// search logic only depend on this trait.
pub trait EngineIo {
    /// Write `line` plus a newline and flush.
    fn send_line(&mut self, line: &str) -> Result<(), PipeClosed>;

    /// Wait for the next line until `deadline`.
    fn read_line(&mut self, deadline: &Deadline) -> ReadOutcome;

    fn send(&mut self, command: &UciCommand) -> Result<(), PipeClosed> {
        self.send_line(&command.to_string())
    }
}

/// One live engine process and its pipes.
pub struct EngineHandle {
    path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
    state: EngineState,
    reaped: bool,
    logger: Logger,
}

impl EngineHandle {
    /// Spawn the engine with piped stdio and start draining its output.
    ///
    /// The returned handle is in the `Starting` state; the UCI handshake has
    /// not been performed yet.
    pub fn start(spec: &EngineSpec, logger: Logger) -> Result<Self, LaunchError> {
        logger.debug(&format!("Starting chess engine: {}", spec.path.display()));

        let mut command = Command::new(&spec.path);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command
            .spawn()
            .map_err(|e| LaunchError::from_spawn(spec.path.clone(), e))?;

        match Self::attach(&mut child, &spec.path, &logger) {
            Ok((stdin, lines, readers)) => Ok(EngineHandle {
                path: spec.path.clone(),
                child,
                stdin: Some(stdin),
                lines,
                readers,
                state: EngineState::Starting,
                reaped: false,
                logger,
            }),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn attach(
        child: &mut Child,
        path: &Path,
        logger: &Logger,
    ) -> Result<(ChildStdin, Receiver<String>, Vec<JoinHandle<()>>), LaunchError> {
        let missing = |what: &str| LaunchError::Spawn {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, format!("{what} not captured")),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let (tx, rx) = mpsc::channel();
        let spawn_err = |source| LaunchError::Spawn {
            path: path.to_path_buf(),
            source,
        };

        let stdout_reader = thread::Builder::new()
            .name("engine-stdout".to_string())
            .spawn(move || forward_lines(stdout, &tx))
            .map_err(spawn_err)?;

        let stderr_logger = logger.clone();
        let stderr_reader = thread::Builder::new()
            .name("engine-stderr".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(stderr);
                let mut buf = Vec::new();
                while let Some(line) = next_line(&mut reader, &mut buf) {
                    if !line.is_empty() {
                        stderr_logger.debug(&format!("Engine stderr: {line}"));
                    }
                }
            })
            .map_err(spawn_err)?;

        Ok((stdin, rx, vec![stdout_reader, stderr_reader]))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn set_state(&mut self, state: EngineState) {
        if self.state == state {
            return;
        }
        // Dead is terminal.
        if self.state == EngineState::Dead {
            return;
        }
        self.logger
            .debug(&format!("Engine state: {} -> {}", self.state, state));
        self.state = state;
    }

    /// Check the OS exit status; marks the handle dead if the process exited.
    pub fn is_alive(&mut self) -> bool {
        if self.state == EngineState::Dead {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.reaped = true;
                self.logger
                    .debug(&format!("Engine process exited with {status}"));
                self.mark_dead();
                false
            }
            Err(e) => {
                self.logger
                    .debug(&format!("Could not query engine status: {e}"));
                self.mark_dead();
                false
            }
        }
    }

    fn mark_dead(&mut self) {
        self.set_state(EngineState::Dead);
        self.stdin = None;
    }

    /// Stdout hit end of stream: confirm the exit and mark the handle dead.
    fn confirm_exit(&mut self) {
        let deadline = Deadline::after(EXIT_SETTLE);
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    self.reaped = true;
                    self.logger.debug(&format!(
                        "Engine process terminated while expecting output ({status})"
                    ));
                    break;
                }
                Ok(None) if !deadline.is_expired() => thread::sleep(EXIT_POLL),
                Ok(None) => {
                    self.logger
                        .debug("Engine closed stdout but is still running; killing it");
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    self.reaped = true;
                    break;
                }
                Err(e) => {
                    self.logger
                        .debug(&format!("Could not query engine status: {e}"));
                    break;
                }
            }
        }
        self.mark_dead();
    }

    /// Ask the engine to quit, kill it after `grace`, and reap it.
    ///
    /// Safe to call more than once.
    pub fn terminate(&mut self, grace: Duration) {
        if !self.reaped {
            if matches!(self.child.try_wait(), Ok(None)) {
                self.logger.debug("Stopping chess engine...");
                if self.stdin.is_some() {
                    let _ = self.send(&UciCommand::Quit);
                }
                // Closing stdin lets engines that ignore `quit` see end of input.
                self.stdin = None;

                if !self.wait_for_exit(grace) {
                    self.logger
                        .debug("Engine did not quit gracefully, killing process");
                    let _ = self.child.kill();
                }
            } else {
                self.logger.debug("Engine process was already terminated");
            }
            let _ = self.child.wait();
            self.reaped = true;
        }

        self.mark_dead();
        self.release_readers();
    }

    /// Join the reader threads that finish within [`EXIT_SETTLE`] and detach
    /// the rest.
    ///
    /// A reader stays blocked for as long as any descendant of the engine
    /// still holds its end of the pipe.
    fn release_readers(&mut self) {
        // Forwarders stop at their next line once the receiver is gone.
        let (_, closed) = mpsc::channel::<String>();
        self.lines = closed;

        let deadline = Deadline::after(EXIT_SETTLE);
        for reader in self.readers.drain(..) {
            while !reader.is_finished() && !deadline.is_expired() {
                thread::sleep(EXIT_POLL);
            }
            if reader.is_finished() {
                let _ = reader.join();
            } else {
                self.logger
                    .debug("Engine output pipe is still held open; detaching reader");
            }
        }
    }

    fn wait_for_exit(&mut self, grace: Duration) -> bool {
        let deadline = Deadline::after(grace);
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) if deadline.is_expired() => return false,
                Ok(None) => thread::sleep(EXIT_POLL),
                Err(_) => return false,
            }
        }
    }
}

impl EngineIo for EngineHandle {
    fn send_line(&mut self, line: &str) -> Result<(), PipeClosed> {
        if self.state == EngineState::Dead {
            return Err(PipeClosed);
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PipeClosed);
        };

        self.logger.debug(&format!("To engine: {line}"));
        let result = writeln!(stdin, "{line}").and_then(|()| stdin.flush());
        if let Err(e) = result {
            self.logger
                .debug(&format!("Broken pipe to engine ({e}); engine may have crashed"));
            self.mark_dead();
            return Err(PipeClosed);
        }
        Ok(())
    }

    fn read_line(&mut self, deadline: &Deadline) -> ReadOutcome {
        if self.state == EngineState::Dead {
            return ReadOutcome::Closed;
        }
        let Some(left) = deadline.remaining() else {
            return ReadOutcome::TimedOut;
        };

        match self.lines.recv_timeout(left) {
            Ok(line) => {
                if !line.is_empty() {
                    self.logger.debug(&format!("From engine: {line}"));
                }
                ReadOutcome::Line(line)
            }
            Err(RecvTimeoutError::Timeout) => ReadOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => {
                self.confirm_exit();
                ReadOutcome::Closed
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.terminate(DEFAULT_QUIT_GRACE);
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("path", &self.path)
            .field("pid", &self.child.id())
            .field("state", &self.state)
            .finish()
    }
}

fn forward_lines<R: Read>(stream: R, tx: &Sender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    while let Some(line) = next_line(&mut reader, &mut buf) {
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Read one line, tolerating invalid UTF-8. `None` at end of stream.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Option<String> {
    buf.clear();
    match reader.read_until(b'\n', buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(String::from_utf8_lossy(buf).trim().to_string()),
    }
}
