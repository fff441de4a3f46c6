//! Pooling: keyed reuse of actors by template, and the level segment pool built on it.
//!
//! # Invariants
//! - A template maps to at most one queue.
//! - An actor is either in exactly one queue (inactive) or live in the world (active).
//! - Every actor the pool creates is tagged with its originating template.
//! - Tagged actors are never destroyed by the pool, only deactivated and recycled.

mod error;
mod object_pool;
mod segment;

pub use error::PoolError;
pub use object_pool::{ObjectPool, PoolStats, Release};
pub use segment::{Reclaim, SegmentPool};
