//! Streaming: forward level generation around a moving anchor, and reclamation behind it.
//!
//! # Invariants
//! - `frontier.x` never decreases.
//! - After a poll with an anchor present, `anchor.x + lookahead <= frontier.x`
//!   unless a placement failed to advance the frontier.
//! - No two consecutive segment picks share a template when the catalog has
//!   more than one.
//! - Segments are reclaimed through the pool that placed them, never leaked.

mod config;
mod error;
mod reclaimer;
mod selection;
mod streamer;

pub use config::StreamConfig;
pub use error::StreamError;
pub use reclaimer::{ReclaimReport, SegmentReclaimer};
pub use selection::SelectionOrder;
pub use streamer::{LevelStreamer, Placement, StreamStats, StreamerState, frontier_from_marker};
