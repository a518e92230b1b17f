//! How long to let the engine think and how long to wait before moving.
//!
//! Values are drawn uniformly from fixed per-mode ranges on every call so the
//! timing does not look mechanical. The ranges themselves are the contract.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

/// Remaining clock below which a player counts as short on time (seconds).
pub const LOW_TIME_THRESHOLD_SECS: f64 = 20.0;

/// Manual suggestions: base think time, per-ply increment and clamp bounds (ms).
const SUGGEST_BASE_MS: u64 = 1000;
const SUGGEST_PER_PLY_MS: u64 = 50;
const SUGGEST_MIN_MS: u64 = 500;
const SUGGEST_MAX_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GameMode {
    Bullet,
    Blitz,
    #[default]
    Default,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Bullet, GameMode::Blitz, GameMode::Default];
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Bullet => write!(f, "bullet"),
            GameMode::Blitz => write!(f, "blitz"),
            GameMode::Default => write!(f, "default"),
        }
    }
}

/// Error returned when parsing an unknown game mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGameMode(pub String);

impl fmt::Display for UnknownGameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown game mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownGameMode {}

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullet" => Ok(GameMode::Bullet),
            "blitz" => Ok(GameMode::Blitz),
            "default" => Ok(GameMode::Default),
            _ => Err(UnknownGameMode(s.to_string())),
        }
    }
}

/// Inclusive sampling ranges for one (mode, low time) combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRanges {
    pub think_ms: (u64, u64),
    pub human_delay_secs: (f64, f64),
}

/// The documented range table.
#[must_use]
pub const fn ranges(mode: GameMode, low_time: bool) -> DelayRanges {
    let (think_ms, human_delay_secs) = match (mode, low_time) {
        (GameMode::Bullet, false) => ((70, 120), (0.15, 0.40)),
        (GameMode::Bullet, true) => ((50, 80), (0.05, 0.20)),
        (GameMode::Blitz, false) => ((150, 400), (2.0, 7.0)),
        (GameMode::Blitz, true) => ((100, 200), (0.10, 0.50)),
        (GameMode::Default, false) => ((500, 500), (0.50, 1.00)),
        (GameMode::Default, true) => ((200, 300), (0.20, 0.50)),
    };
    DelayRanges {
        think_ms,
        human_delay_secs,
    }
}

/// True only when the clock is known and below [`LOW_TIME_THRESHOLD_SECS`].
#[must_use]
pub fn is_low_time(remaining_clock_secs: Option<f64>) -> bool {
    remaining_clock_secs.is_some_and(|secs| secs < LOW_TIME_THRESHOLD_SECS)
}

/// One sample of the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveDelays {
    pub human_delay_secs: f64,
    pub engine_think_ms: u64,
}

impl MoveDelays {
    #[must_use]
    pub fn human_delay(&self) -> Duration {
        Duration::from_secs_f64(self.human_delay_secs.max(0.0))
    }
}

/// Sample delays for `mode` using the thread-local RNG.
#[must_use]
pub fn compute_delays(mode: GameMode, remaining_clock_secs: Option<f64>) -> MoveDelays {
    compute_delays_with(&mut rand::thread_rng(), mode, remaining_clock_secs)
}

/// Sample delays for `mode` from `rng`.
pub fn compute_delays_with<R: Rng + ?Sized>(
    rng: &mut R,
    mode: GameMode,
    remaining_clock_secs: Option<f64>,
) -> MoveDelays {
    let range = ranges(mode, is_low_time(remaining_clock_secs));
    let (think_min, think_max) = range.think_ms;
    let (delay_min, delay_max) = range.human_delay_secs;

    MoveDelays {
        human_delay_secs: rng.gen_range(delay_min..=delay_max),
        engine_think_ms: rng.gen_range(think_min..=think_max),
    }
}

/// Think time for a manual "suggest move" request at `ply`.
#[must_use]
pub fn suggest_movetime_ms(ply: u32) -> u64 {
    (SUGGEST_BASE_MS + u64::from(ply) * SUGGEST_PER_PLY_MS).clamp(SUGGEST_MIN_MS, SUGGEST_MAX_MS)
}
