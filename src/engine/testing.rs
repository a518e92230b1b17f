//! In-memory engine used by the unit tests.

use std::collections::VecDeque;
use std::thread;

use super::error::PipeClosed;
use super::process::{EngineIo, ReadOutcome};
use crate::timer::Deadline;

#[derive(Debug, Clone)]
enum Item {
    Line(String),
    Close,
}

/// Replays canned replies for each command it receives.
///
/// A command with several registered scripts uses them in order and keeps
/// repeating the last one. Reading with nothing queued sleeps until the
/// deadline, like a silent engine.
#[derive(Debug, Default)]
pub(crate) struct ScriptedIo {
    scripts: Vec<(String, VecDeque<Vec<Item>>)>,
    queue: VecDeque<Item>,
    sent: Vec<String>,
    closed: bool,
}

impl ScriptedIo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, command: &str, replies: &[&str]) -> Self {
        let items = replies.iter().map(|r| Item::Line((*r).to_string())).collect();
        self.push_script(command, items);
        self
    }

    /// The engine dies after replying to the most recent script for `command`.
    pub(crate) fn die_after(mut self, command: &str) -> Self {
        match self.scripts.iter_mut().find(|(key, _)| key == command) {
            Some((_, scripts)) => {
                if let Some(last) = scripts.back_mut() {
                    last.push(Item::Close);
                }
            }
            None => self.push_script(command, vec![Item::Close]),
        }
        self
    }

    fn push_script(&mut self, command: &str, items: Vec<Item>) {
        match self.scripts.iter_mut().find(|(key, _)| key == command) {
            Some((_, scripts)) => scripts.push_back(items),
            None => self
                .scripts
                .push((command.to_string(), VecDeque::from(vec![items]))),
        }
    }

    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl EngineIo for ScriptedIo {
    fn send_line(&mut self, line: &str) -> Result<(), PipeClosed> {
        if self.closed {
            return Err(PipeClosed);
        }
        self.sent.push(line.to_string());

        let matching = self
            .scripts
            .iter_mut()
            .find(|(key, _)| line == key || line.starts_with(&format!("{key} ")));
        if let Some((_, scripts)) = matching {
            let items = if scripts.len() > 1 {
                scripts.pop_front().unwrap_or_default()
            } else {
                scripts.front().cloned().unwrap_or_default()
            };
            self.queue.extend(items);
        }
        Ok(())
    }

    fn read_line(&mut self, deadline: &Deadline) -> ReadOutcome {
        if self.closed {
            return ReadOutcome::Closed;
        }
        match self.queue.pop_front() {
            Some(Item::Line(line)) => ReadOutcome::Line(line),
            Some(Item::Close) => {
                self.closed = true;
                ReadOutcome::Closed
            }
            None => {
                if let Some(left) = deadline.remaining() {
                    thread::sleep(left);
                }
                ReadOutcome::TimedOut
            }
        }
    }
}
