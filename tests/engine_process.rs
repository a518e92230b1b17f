use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use chess_assist::engine::{
    initialize, EngineHandle, EngineIo, EngineSpec, EngineState, HandshakeConfig, HandshakeError,
    HandshakeStage, LaunchError, SearchSession, SessionConfig, SessionError,
};
use chess_assist::logging::{LogLevel, Logger};
use chess_assist::uci::{BestMove, EngineOptions, Score, STARTPOS_FEN};

fn scripted(scenario: &str) -> EngineSpec {
    EngineSpec::new(env!("CARGO_BIN_EXE_scripted_engine")).with_args([scenario])
}

fn quick_handshake() -> HandshakeConfig {
    HandshakeConfig {
        timeout: Duration::from_millis(500),
        options: EngineOptions::default(),
    }
}

fn quick_session() -> SessionConfig {
    SessionConfig {
        resync_timeout: Duration::from_millis(500),
        search_grace: Duration::from_millis(200),
    }
}

type Captured = Arc<Mutex<Vec<(String, LogLevel)>>>;

fn capturing_logger() -> (Logger, Captured) {
    let messages: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let logger = Logger::new(move |msg, level| {
        sink.lock().push((msg.to_string(), level));
    });
    (logger, messages)
}

fn ready_engine(scenario: &str) -> EngineHandle {
    let mut handle = EngineHandle::start(&scripted(scenario), Logger::silent()).expect("spawn");
    initialize(&mut handle, &quick_handshake(), &Logger::silent()).expect("handshake");
    handle.set_state(EngineState::Ready);
    handle
}

#[test]
fn handshake_reports_identity() {
    let mut handle = EngineHandle::start(&scripted("normal"), Logger::silent()).unwrap();
    assert_eq!(handle.state(), EngineState::Starting);

    let identity = initialize(&mut handle, &quick_handshake(), &Logger::silent()).unwrap();
    assert_eq!(identity.name.as_deref(), Some("Scripted Engine 1.0"));
    assert_eq!(identity.author.as_deref(), Some("chess_assist"));
    assert!(handle.is_alive());
}

#[test]
fn handshake_times_out_without_readyok() {
    let mut handle = EngineHandle::start(&scripted("no-readyok"), Logger::silent()).unwrap();

    let start = Instant::now();
    let err = initialize(&mut handle, &quick_handshake(), &Logger::silent()).unwrap_err();
    assert!(matches!(
        err,
        HandshakeError::Timeout {
            stage: HandshakeStage::IsReady,
            ..
        }
    ));
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(handle.is_alive());
}

#[test]
fn handshake_detects_engine_exit() {
    let mut handle = EngineHandle::start(&scripted("die-in-handshake"), Logger::silent()).unwrap();

    let err = initialize(&mut handle, &quick_handshake(), &Logger::silent()).unwrap_err();
    assert!(
        matches!(
            err,
            HandshakeError::EngineDied {
                stage: HandshakeStage::Uci
            } | HandshakeError::PipeClosed
        ),
        "unexpected error: {err}"
    );
    assert!(!handle.is_alive());
    assert_eq!(handle.state(), EngineState::Dead);
}

#[test]
fn search_returns_move_and_last_score() {
    let mut handle = ready_engine("normal");
    let logger = Logger::silent();

    let result = SearchSession::new(&mut handle, quick_session(), &logger)
        .run(STARTPOS_FEN, 100)
        .unwrap();
    assert_eq!(result.best_move, BestMove::Move("e2e4".to_string()));
    assert_eq!(result.score, Some(Score::Centipawns(35)));
    assert_eq!(result.depth, Some(2));
}

#[test]
fn search_reports_no_move_with_mate_score() {
    let mut handle = ready_engine("mate");
    let logger = Logger::silent();

    let result = SearchSession::new(&mut handle, quick_session(), &logger)
        .run("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 100)
        .unwrap();
    assert_eq!(result.best_move, BestMove::NoMove);
    assert_eq!(result.score, Some(Score::Mate(-3)));
}

#[test]
fn search_without_info_has_no_score() {
    let mut handle = ready_engine("no-score");
    let logger = Logger::silent();

    let result = SearchSession::new(&mut handle, quick_session(), &logger)
        .run(STARTPOS_FEN, 50)
        .unwrap();
    assert_eq!(result.best_move, BestMove::Move("g1f3".to_string()));
    assert_eq!(result.score, None);
}

#[test]
fn search_times_out_after_budget() {
    let mut handle = ready_engine("never-bestmove");
    let logger = Logger::silent();

    let start = Instant::now();
    let err = SearchSession::new(&mut handle, quick_session(), &logger)
        .run(STARTPOS_FEN, 100)
        .unwrap_err();
    let waited = start.elapsed();

    match err {
        SessionError::Timeout { score, .. } => assert_eq!(score, Some(Score::Centipawns(41))),
        other => panic!("expected timeout, got {other}"),
    }
    assert!(waited >= Duration::from_millis(300));
    assert!(waited < Duration::from_secs(5));
    // A slow search does not kill the engine.
    assert!(handle.is_alive());
}

#[test]
fn search_detects_engine_exit() {
    let mut handle = ready_engine("die-on-go");
    let logger = Logger::silent();

    let err = SearchSession::new(&mut handle, quick_session(), &logger)
        .run(STARTPOS_FEN, 100)
        .unwrap_err();
    assert_eq!(err, SessionError::Terminated);
    assert!(!handle.is_alive());
    assert!(handle.send_line("isready").is_err());
}

#[test]
fn traffic_is_logged_at_debug_level() {
    let (logger, messages) = capturing_logger();
    let mut handle = EngineHandle::start(&scripted("normal"), logger.clone()).unwrap();
    initialize(&mut handle, &quick_handshake(), &logger).unwrap();
    SearchSession::new(&mut handle, quick_session(), &logger)
        .run(STARTPOS_FEN, 50)
        .unwrap();

    // Stderr is drained on its own thread.
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        let seen = messages
            .lock()
            .iter()
            .any(|(msg, _)| msg.starts_with("Engine stderr: "));
        if seen {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let messages = messages.lock();
    let has = |text: &str| {
        messages
            .iter()
            .any(|(msg, level)| *level == LogLevel::Debug && msg == text)
    };
    assert!(has("To engine: uci"));
    assert!(has("From engine: uciok"));
    assert!(has("To engine: setoption name Hash value 128"));
    assert!(has(&format!("To engine: position fen {STARTPOS_FEN}")));
    assert!(has(&format!("From engine: info string position {STARTPOS_FEN}")));
    assert!(has("To engine: go movetime 50"));
    assert!(has("Engine stderr: scripted_engine running scenario normal"));
}

#[test]
fn terminate_kills_engine_that_ignores_quit() {
    let mut handle = ready_engine("ignore-quit");

    let start = Instant::now();
    handle.terminate(Duration::from_millis(200));
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(handle.state(), EngineState::Dead);

    // Second call is a no-op.
    handle.terminate(Duration::from_millis(200));
    assert!(!handle.is_alive());
}

#[cfg(unix)]
#[test]
fn terminate_is_bounded_when_a_child_keeps_pipes_open() {
    // The shell exits once stdin closes, but the backgrounded `sleep` keeps
    // stdout and stderr open.
    let spec = EngineSpec::new("/bin/sh").with_args(["-c", "sleep 8 & while read l; do :; done"]);
    let mut handle = EngineHandle::start(&spec, Logger::silent()).unwrap();

    let start = Instant::now();
    handle.terminate(Duration::from_millis(300));
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "terminate took {:?}",
        start.elapsed()
    );
    assert_eq!(handle.state(), EngineState::Dead);

    let start = Instant::now();
    drop(handle);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn terminate_lets_engine_quit_naturally() {
    let mut handle = ready_engine("normal");

    let start = Instant::now();
    handle.terminate(Duration::from_secs(5));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!handle.is_alive());
}

#[test]
fn missing_executable_is_classified() {
    let err = EngineHandle::start(&EngineSpec::new("/definitely/not/here/engine"), Logger::silent())
        .unwrap_err();
    assert!(matches!(err, LaunchError::ExecutableNotFound { .. }));
    assert!(err.to_string().contains("/definitely/not/here/engine"));
}
