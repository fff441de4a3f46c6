//! World Kernel: the actor host the pooling core drives, plus an in-memory world.
//!
//! # Invariants
//! - All actor mutations flow through the [`ActorHost`] operations.
//! - Every mutation of [`World`] is recorded in its event log.
//! - Actor ids are never reused within a world.

pub mod host;
pub mod world;

pub use host::{ActorHost, HostError};
pub use world::{ActorData, Blueprint, World, WorldEvent};
