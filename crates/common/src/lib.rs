//! Shared types: actor and template identifiers, transforms, and the anchor contract.
//!
//! # Invariants
//! - Templates are compared by identity, never by content.
//! - Anchors are observed read-only by the streaming core.

mod anchor;
mod types;

pub use anchor::{Anchor, AnchorSubject};
pub use types::{ActorId, TemplateId, Transform};
