pub mod autoplay;
pub mod board;
pub mod delay;
pub mod engine;
pub mod logging;
pub mod screen;
pub mod sync;
pub mod timer;
pub mod uci;

pub use autoplay::{AutoPlayTiming, AutoPlayer, GameObserver, MoveExecutor, StopReason};
pub use board::{replay_moves, ReplayError};
pub use delay::{compute_delays, GameMode, MoveDelays};
pub use engine::{
    EngineError, EngineSpec, EngineState, EngineSupervisor, MoveOracle, SearchResult,
    SupervisorConfig,
};
pub use logging::{LogLevel, Logger};
pub use screen::{BoardGeometry, Orientation, Point};
pub use sync::StopFlag;
pub use uci::{BestMove, EngineOptions, Score, ScoreKind};
