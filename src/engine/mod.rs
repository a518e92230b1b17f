//! Client side of the UCI protocol: running an external engine process.
//!
//! Layers, leaves first: [`process`] owns the subprocess and its pipes,
//! [`handshake`] performs the startup exchange, [`session`] runs one search,
//! and [`supervisor`] ties them together behind a single blocking call.

pub mod error;
pub mod handshake;
pub mod process;
pub mod session;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{
    EngineError, HandshakeError, HandshakeStage, LaunchError, PipeClosed, SessionError,
    UnavailableReason,
};
pub use handshake::{initialize, EngineIdentity, HandshakeConfig};
pub use process::{EngineHandle, EngineIo, EngineSpec, EngineState, ReadOutcome};
pub use session::{SearchResult, SearchSession, SessionConfig, SessionPhase};
pub use supervisor::{EngineSupervisor, MoveOracle, SupervisorConfig};
