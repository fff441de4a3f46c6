use glam::{Quat, Vec3};
use persrun_common::{ActorId, TemplateId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ProjectileError;

/// Static behaviour of a projectile design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSpec {
    /// Units per second along `direction`.
    pub speed: f32,
    pub direction: Vec3,
    /// Seconds before the projectile expires on its own.
    pub lifetime: f32,
    pub rotate: bool,
    /// Degrees per second around Z when `rotate` is set.
    pub rotation_speed: f32,
    /// Collision tags the projectile passes without expiring.
    pub exempt_tags: Vec<String>,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: 5.0,
            direction: Vec3::NEG_X,
            lifetime: 5.0,
            rotate: false,
            rotation_speed: 360.0,
            exempt_tags: vec!["Enemy".to_owned()],
        }
    }
}

impl ProjectileSpec {
    pub fn validate(&self) -> Result<(), ProjectileError> {
        if !self.lifetime.is_finite() || self.lifetime <= 0.0 {
            return Err(ProjectileError::InvalidSpec(format!(
                "lifetime must be positive, got {}",
                self.lifetime
            )));
        }
        if !self.speed.is_finite() || !self.rotation_speed.is_finite() {
            return Err(ProjectileError::InvalidSpec(
                "speed and rotation_speed must be finite".into(),
            ));
        }
        if !self.direction.is_finite() {
            return Err(ProjectileError::InvalidSpec(
                "direction must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Velocity in units per second.
    pub fn velocity(&self) -> Vec3 {
        self.direction.normalize_or_zero() * self.speed
    }

    /// Decide what a contact does to a projectile of this design.
    ///
    /// Trigger overlaps only react to the anchor. Solid collisions also
    /// expire the projectile on anything not exempted.
    pub fn resolve(&self, contact: &Contact) -> ContactEffect {
        match (&contact.target, contact.kind) {
            (ContactTarget::Anchor, _) => ContactEffect::HitAnchor,
            (ContactTarget::Tagged(_), ContactKind::Trigger) => ContactEffect::Ignore,
            (ContactTarget::Tagged(tag), ContactKind::Collision) => {
                if self.exempt_tags.iter().any(|t| t == tag) {
                    ContactEffect::Ignore
                } else {
                    ContactEffect::Expire
                }
            }
        }
    }
}

/// What a projectile touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactTarget {
    /// The tracked anchor's character.
    Anchor,
    /// Anything else, by collision tag.
    Tagged(String),
}

/// How the host reported the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Trigger,
    Collision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub target: ContactTarget,
    pub kind: ContactKind,
}

impl Contact {
    pub fn anchor(kind: ContactKind) -> Self {
        Self {
            target: ContactTarget::Anchor,
            kind,
        }
    }

    pub fn tagged(tag: impl Into<String>, kind: ContactKind) -> Self {
        Self {
            target: ContactTarget::Tagged(tag.into()),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEffect {
    Ignore,
    Expire,
    /// Send fatal damage to the anchor, then expire.
    HitAnchor,
}

/// Result of advancing a projectile by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Alive { translation: Vec3, spin: Quat },
    Expired,
}

/// Per-instance lifecycle state of a live projectile.
#[derive(Debug, Clone)]
pub struct Projectile {
    id: ActorId,
    /// `None` when the projectile has no pool context.
    template: Option<TemplateId>,
    spec: Arc<ProjectileSpec>,
    remaining: f32,
}

impl Projectile {
    pub fn new(id: ActorId, template: Option<TemplateId>, spec: Arc<ProjectileSpec>) -> Self {
        let remaining = spec.lifetime;
        Self {
            id,
            template,
            spec,
            remaining,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn template(&self) -> Option<TemplateId> {
        self.template
    }

    pub fn spec(&self) -> &ProjectileSpec {
        &self.spec
    }

    /// Seconds left before expiry.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down by `dt` seconds and report the motion for this frame.
    pub fn advance(&mut self, dt: f32) -> Step {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            return Step::Expired;
        }
        let translation = self.spec.velocity() * dt;
        let spin = if self.spec.rotate {
            Quat::from_rotation_z((self.spec.rotation_speed * dt).to_radians())
        } else {
            Quat::IDENTITY
        };
        Step::Alive { translation, spin }
    }
}
