//! Minimal stand-in UCI engine with scripted misbehaviour, used by the
//! integration tests.
//!
//! usage: scripted_engine [scenario]
//!
//! Scenarios:
//!   normal            well-behaved engine, answers `bestmove e2e4` with cp 35
//!   mate              reports `score mate -3` and `bestmove (none)`
//!   no-score          answers `bestmove` without any info line
//!   silent            reads input and never answers
//!   no-readyok        answers `uciok` but never `readyok`
//!   die-in-handshake  exits as soon as `uci` arrives
//!   die-on-go         exits as soon as `go` arrives
//!   one-shot          answers one search, then exits
//!   never-bestmove    sends scores but no `bestmove`, even after `stop`
//!   ignore-quit       well-behaved, but keeps running after `quit`

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::thread;
use std::time::Duration;

use chess_assist::uci::STARTPOS_FEN;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Normal,
    Mate,
    NoScore,
    Silent,
    NoReadyOk,
    DieInHandshake,
    DieOnGo,
    OneShot,
    NeverBestMove,
    IgnoreQuit,
}

impl Scenario {
    fn parse(name: &str) -> Option<Self> {
        let scenario = match name {
            "normal" => Scenario::Normal,
            "mate" => Scenario::Mate,
            "no-score" => Scenario::NoScore,
            "silent" => Scenario::Silent,
            "no-readyok" => Scenario::NoReadyOk,
            "die-in-handshake" => Scenario::DieInHandshake,
            "die-on-go" => Scenario::DieOnGo,
            "one-shot" => Scenario::OneShot,
            "never-bestmove" => Scenario::NeverBestMove,
            "ignore-quit" => Scenario::IgnoreQuit,
            _ => return None,
        };
        Some(scenario)
    }
}

/// A command as this engine reads it from the client.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Uci,
    IsReady,
    Position(String),
    Go { movetime_ms: u64 },
    Quit,
    Ignored,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut tokens = line.split_whitespace();
    let input = match tokens.next()? {
        "uci" => Input::Uci,
        "isready" => Input::IsReady,
        "position" => match tokens.next()? {
            "startpos" => Input::Position(STARTPOS_FEN.to_string()),
            "fen" => {
                let fen: Vec<&str> = tokens.take_while(|t| *t != "moves").collect();
                if fen.is_empty() {
                    return None;
                }
                Input::Position(fen.join(" "))
            }
            _ => return None,
        },
        "go" => {
            let mut movetime_ms = 100;
            while let Some(token) = tokens.next() {
                if token == "movetime" {
                    movetime_ms = tokens.next().and_then(|v| v.parse().ok()).unwrap_or(100);
                }
            }
            Input::Go { movetime_ms }
        }
        "quit" => Input::Quit,
        _ => Input::Ignored,
    };
    Some(input)
}

struct Output {
    out: io::Stdout,
}

impl Output {
    fn line(&mut self, line: &str) {
        let mut lock = self.out.lock();
        // The client may already be gone; nothing useful to do about it.
        let _ = writeln!(lock, "{line}");
        let _ = lock.flush();
    }
}

fn search(out: &mut Output, scenario: Scenario, movetime_ms: u64) {
    let pause = Duration::from_millis(movetime_ms.min(100) / 2);
    match scenario {
        Scenario::Mate => {
            out.line("info depth 1 score mate -3 nodes 40");
            thread::sleep(pause);
            out.line("bestmove (none)");
        }
        Scenario::NoScore => {
            thread::sleep(pause);
            out.line("bestmove g1f3");
        }
        Scenario::NeverBestMove => {
            out.line("info depth 1 score cp 12 pv e2e4");
            out.line("info depth 2 score cp 41 pv d2d4");
        }
        _ => {
            out.line("info depth 1 score cp 12 nodes 20 pv e2e4");
            thread::sleep(pause);
            out.line("info depth 2 score cp 35 nodes 180 pv e2e4 e7e5");
            out.line("info string search finished");
            out.line("bestmove e2e4 ponder e7e5");
        }
    }
}

fn main() {
    let name = env::args().nth(1).unwrap_or_else(|| "normal".to_string());
    let Some(scenario) = Scenario::parse(&name) else {
        eprintln!("scripted_engine: unknown scenario '{name}'");
        process::exit(2);
    };

    let mut out = Output { out: io::stdout() };
    eprintln!("scripted_engine running scenario {name}");

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if scenario == Scenario::Silent {
            continue;
        }
        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            Input::Uci => {
                if scenario == Scenario::DieInHandshake {
                    process::exit(1);
                }
                out.line("id name Scripted Engine 1.0");
                out.line("id author chess_assist");
                out.line("option name Hash type spin default 16 min 1 max 1024");
                out.line("option name Threads type spin default 1 min 1 max 8");
                out.line("uciok");
            }
            Input::IsReady => {
                if scenario != Scenario::NoReadyOk {
                    out.line("readyok");
                }
            }
            Input::Position(fen) => {
                out.line(&format!("info string position {fen}"));
            }
            Input::Go { movetime_ms } => {
                if scenario == Scenario::DieOnGo {
                    process::exit(3);
                }
                search(&mut out, scenario, movetime_ms);
                if scenario == Scenario::OneShot {
                    process::exit(0);
                }
            }
            Input::Quit => {
                if scenario != Scenario::IgnoreQuit {
                    break;
                }
            }
            Input::Ignored => {}
        }
    }

    if scenario == Scenario::IgnoreQuit {
        // Stay alive with stdin closed until killed.
        loop {
            thread::sleep(Duration::from_secs(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(
            parse_input("position startpos moves e2e4"),
            Some(Input::Position(STARTPOS_FEN.to_string()))
        );
        assert_eq!(
            parse_input("position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1a2"),
            Some(Input::Position("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()))
        );
        assert_eq!(parse_input("position fen"), None);
        assert_eq!(parse_input("position"), None);
    }

    #[test]
    fn test_parse_go_and_others() {
        assert_eq!(
            parse_input("go movetime 250"),
            Some(Input::Go { movetime_ms: 250 })
        );
        assert_eq!(parse_input("go infinite"), Some(Input::Go { movetime_ms: 100 }));
        assert_eq!(parse_input("  uci "), Some(Input::Uci));
        assert_eq!(parse_input("setoption name Hash value 128"), Some(Input::Ignored));
        assert_eq!(parse_input(""), None);
    }
}
