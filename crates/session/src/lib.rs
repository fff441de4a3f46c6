//! Session: one run of the game, owning every pool and the streamer explicitly.
//!
//! # Invariants
//! - All pool and frontier state is mutated from the session's frame update only.
//! - Streaming runs on a fixed polling cadence; projectiles and reclamation run every frame.
//! - Stopping a session halts polling; live actors stay where they are.

mod config;
mod error;
mod inspect;
mod runner;
mod schedule;
mod session;

pub use config::{
    EmitterConfig, ProjectileConfig, RunnerConfig, SegmentConfig, SessionConfig, StartZoneConfig,
};
pub use error::{ConfigError, SessionError};
pub use inspect::{SessionInspector, SessionSummary};
pub use runner::Runner;
pub use schedule::Periodic;
pub use session::{FrameReport, Session};
