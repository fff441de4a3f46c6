//! Projectiles: pooled actors with a lifetime countdown and contact rules.
//!
//! # Invariants
//! - A projectile is released at most once per incarnation, whichever of
//!   expiry, trigger overlap or collision fires first.
//! - A projectile without a pool context is destroyed instead of recycled.

mod emitter;
mod error;
mod pool;
mod projectile;

pub use emitter::Emitter;
pub use error::ProjectileError;
pub use pool::{ContactOutcome, ProjectilePool, ProjectileStats, ProjectileTick};
pub use projectile::{
    Contact, ContactEffect, ContactKind, ContactTarget, Projectile, ProjectileSpec, Step,
};
