//! Auto-play control loop.
//!
//! Polls the game page (through [`GameObserver`]), rebuilds the position from
//! the scraped move list, asks the engine for a move when it is the bot's turn, waits a human-like delay and executes the move
//! (through [`MoveExecutor`]). Any failure stops play instead of retrying.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use shakmaty::{Chess, Color, Outcome, Position};

use crate::board::{fen_of, legal_uci_move, replay_moves, san_of};
use crate::delay::{compute_delays, GameMode};
use crate::engine::{EngineError, MoveOracle};
use crate::logging::Logger;
use crate::screen::{BoardGeometry, Orientation, Point};
use crate::sync::StopFlag;

/// Read side of the game page: the move list, clocks and orientation.
pub trait GameObserver {
    /// Moves shown on the page in SAN, possibly prefixed with move numbers.
    /// `None` if scraping failed.
    fn scrape_moves(&mut self) -> Option<Vec<String>>;

    /// Remaining clock of `color` in seconds, when it can be read.
    fn clock_secs(&mut self, color: Color) -> Option<f64>;

    fn orientation(&mut self) -> Option<Orientation>;
}

/// Write side: performs a move by dragging or clicking between two points.
pub trait MoveExecutor {
    fn execute(&mut self, from: Point, to: Point) -> Result<(), ExecuteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteError(pub String);

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move execution failed: {}", self.0)
    }
}

impl std::error::Error for ExecuteError {}

/// Pauses used by the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoPlayTiming {
    /// Pause at the top of every iteration
    pub poll: Duration,
    /// Pause after a failed board update
    pub retry: Duration,
    /// Pause while waiting for the opponent
    pub opponent_wait: Duration,
    /// Range of the random pause after a move, in seconds
    pub settle_secs: (f64, f64),
    /// Whether to sleep the sampled human delay before moving
    pub human_delay: bool,
}

impl Default for AutoPlayTiming {
    fn default() -> Self {
        AutoPlayTiming {
            poll: Duration::from_millis(50),
            retry: Duration::from_secs(1),
            opponent_wait: Duration::from_millis(200),
            settle_secs: (0.2, 0.5),
            human_delay: true,
        }
    }
}

impl AutoPlayTiming {
    /// No pauses at all.
    #[must_use]
    pub fn immediate() -> Self {
        AutoPlayTiming {
            poll: Duration::ZERO,
            retry: Duration::ZERO,
            opponent_wait: Duration::ZERO,
            settle_secs: (0.0, 0.0),
            human_delay: false,
        }
    }
}

/// Why the loop ended.
#[derive(Debug)]
pub enum StopReason {
    /// The stop flag was set
    Requested,
    GameOver(Outcome),
    /// The engine answered `(none)`
    NoLegalMove,
    Engine(EngineError),
    IllegalMove(String),
    NoCoordinates(String),
    Executor(ExecuteError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::GameOver(outcome) => write!(f, "game over: {outcome}"),
            StopReason::NoLegalMove => write!(f, "engine returned (none), no legal moves"),
            StopReason::Engine(e) => write!(f, "engine did not return a valid best move: {e}"),
            StopReason::IllegalMove(mv) => write!(f, "engine proposed illegal move {mv}"),
            StopReason::NoCoordinates(mv) => write!(f, "could not get screen coordinates for {mv}"),
            StopReason::Executor(e) => write!(f, "{e}"),
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Plays one side of a game until stopped or something goes wrong.
pub struct AutoPlayer<'a, O: MoveOracle + ?Sized> {
    oracle: &'a O,
    mode: GameMode,
    bot: Color,
    geometry: BoardGeometry,
    timing: AutoPlayTiming,
    logger: Logger,
    stop: StopFlag,
}

impl<'a, O: MoveOracle + ?Sized> AutoPlayer<'a, O> {
    pub fn new(oracle: &'a O, mode: GameMode, bot: Color, logger: Logger) -> Self {
        AutoPlayer {
            oracle,
            mode,
            bot,
            geometry: BoardGeometry::default(),
            timing: AutoPlayTiming::default(),
            logger,
            stop: StopFlag::new(),
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: BoardGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: AutoPlayTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    /// A clone of the flag that ends [`AutoPlayer::run`].
    #[must_use]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Run the loop on the calling thread until it stops.
    pub fn run<G, X>(&self, observer: &mut G, executor: &mut X) -> StopReason
    where
        G: GameObserver,
        X: MoveExecutor,
    {
        self.logger.user(&format!(
            "AutoPlayer started for {}. Bot plays as {}.",
            self.mode,
            color_name(self.bot)
        ));

        let reason = self.play(observer, executor);
        match &reason {
            StopReason::Requested => self.logger.user("AutoPlayer instructed to stop."),
            other => self.logger.user(&format!("Auto-play stopped: {other}.")),
        }
        self.logger
            .debug(&format!("Auto-play loop for {} terminated.", self.mode));
        reason
    }

    fn play<G, X>(&self, observer: &mut G, executor: &mut X) -> StopReason
    where
        G: GameObserver,
        X: MoveExecutor,
    {
        loop {
            if !self.stop.sleep(self.timing.poll) {
                return StopReason::Requested;
            }

            let Some(position) = self.update_position(observer) else {
                self.logger.debug("Board update failed. Retrying...");
                if !self.stop.sleep(self.timing.retry) {
                    return StopReason::Requested;
                }
                continue;
            };

            if let Some(outcome) = position.outcome() {
                return StopReason::GameOver(outcome);
            }
            if position.turn() != self.bot {
                if !self.stop.sleep(self.timing.opponent_wait) {
                    return StopReason::Requested;
                }
                continue;
            }

            if let Err(reason) = self.take_turn(&position, observer, executor) {
                return reason;
            }
        }
    }

    fn update_position<G: GameObserver>(&self, observer: &mut G) -> Option<Chess> {
        let moves = observer.scrape_moves().unwrap_or_default();
        replay_moves(&moves, &self.logger)
            .ok()
            .map(|(position, _)| position)
    }

    fn take_turn<G, X>(
        &self,
        position: &Chess,
        observer: &mut G,
        executor: &mut X,
    ) -> Result<(), StopReason>
    where
        G: GameObserver,
        X: MoveExecutor,
    {
        self.logger.debug(&format!(
            "Bot's turn ({}). Analyzing...",
            color_name(self.bot)
        ));

        let clock = observer.clock_secs(self.bot);
        let delays = compute_delays(self.mode, clock);
        self.logger.debug(&format!(
            "Mode: {}, Clock: {}. Human Delay: {:.2}s, Engine Time: {}ms",
            self.mode,
            clock.map_or_else(|| "N/A".to_string(), |c| format!("{c:.1}")),
            delays.human_delay_secs,
            delays.engine_think_ms
        ));

        let fen = fen_of(position);
        let answer = self.oracle.best_move_and_eval(&fen, delays.engine_think_ms);
        if self.stop.is_stopped() {
            return Err(StopReason::Requested);
        }

        let result = answer.map_err(StopReason::Engine)?;
        let mv = result.best_move.as_move().ok_or(StopReason::NoLegalMove)?;

        let Some(legal) = legal_uci_move(position, mv) else {
            self.logger.debug(&format!("Engine move {mv} is not legal in {fen}"));
            return Err(StopReason::IllegalMove(mv.to_string()));
        };
        self.logger.user(&format!(
            "Engine suggests: {} (UCI: {mv})",
            san_of(position, &legal)
        ));

        let orientation = observer.orientation().unwrap_or_else(|| {
            self.logger
                .debug("Could not determine board orientation. Using default.");
            Orientation::default()
        });
        let (from, to) = self
            .geometry
            .move_points(mv, orientation)
            .ok_or_else(|| StopReason::NoCoordinates(mv.to_string()))?;

        if self.timing.human_delay {
            self.logger.debug(&format!(
                "Making move {mv} after {:.2}s delay.",
                delays.human_delay_secs
            ));
            if !self.stop.sleep(delays.human_delay()) {
                return Err(StopReason::Requested);
            }
        }
        if self.stop.is_stopped() {
            return Err(StopReason::Requested);
        }

        executor.execute(from, to).map_err(StopReason::Executor)?;

        let (settle_min, settle_max) = self.timing.settle_secs;
        let settle = rand::thread_rng().gen_range(settle_min..=settle_max);
        if !self.stop.sleep(Duration::from_secs_f64(settle.max(0.0))) {
            return Err(StopReason::Requested);
        }
        Ok(())
    }
}
