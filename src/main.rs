//! Headless front end: ask an engine for one move suggestion.
//!
//! usage: chess_assist <engine> [fen] [movetime_ms] [--debug]

use std::env;
use std::process::ExitCode;

use chess_assist::delay::suggest_movetime_ms;
use chess_assist::engine::{EngineSpec, EngineSupervisor, SupervisorConfig};
use chess_assist::logging::{LogLevel, Logger};
use chess_assist::uci::STARTPOS_FEN;

fn usage() -> ExitCode {
    eprintln!("usage: chess_assist <engine> [fen] [movetime_ms] [--debug]");
    ExitCode::from(2)
}

/// Default think time for a FEN, scaled by how far the game has progressed.
fn default_movetime(fen: &str) -> u64 {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let fullmove = fields.get(5).and_then(|f| f.parse::<u32>().ok()).unwrap_or(1);
    let black = fields.get(1) == Some(&"b");
    let ply = fullmove.saturating_sub(1) * 2 + u32::from(black);
    suggest_movetime_ms(ply)
}

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    args.retain(|a| a != "--debug");

    let Some(engine) = args.first() else {
        return usage();
    };
    let fen = args.get(1).map_or(STARTPOS_FEN, String::as_str);
    let movetime = match args.get(2) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) => ms,
            Err(_) => return usage(),
        },
        None => default_movetime(fen),
    };

    let logger = Logger::new(move |msg, level| {
        if debug || level == LogLevel::User {
            eprintln!("[{level}] {msg}");
        }
    });

    let supervisor = EngineSupervisor::new(SupervisorConfig::new(EngineSpec::new(engine)), logger);
    let outcome = supervisor.best_move_and_eval(fen, movetime);
    supervisor.shutdown();

    match outcome {
        Ok(result) => {
            println!("bestmove {}", result.best_move);
            match result.score {
                Some(score) => println!("score {score}"),
                None => println!("score none"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
