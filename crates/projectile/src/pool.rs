use glam::{Quat, Vec3};
use persrun_common::{ActorId, AnchorSubject, TemplateId};
use persrun_kernel::ActorHost;
use persrun_pool::{ObjectPool, Release};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::ProjectileError;
use crate::projectile::{Contact, ContactEffect, Projectile, ProjectileSpec, Step};

/// Projectiles that ended during one [`ProjectilePool::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectileTick {
    pub expired: Vec<ActorId>,
    /// Projectiles whose actor disappeared from the host.
    pub lost: Vec<ActorId>,
}

/// What a reported contact did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Ignored,
    Expired,
    /// Fatal damage was sent to the anchor and the projectile expired.
    HitAnchor,
    /// The projectile was already released; the contact was dropped.
    NotLive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectileStats {
    pub spawned: usize,
    pub recycled: usize,
    pub destroyed: usize,
    pub anchor_hits: usize,
}

/// Pool of projectiles plus the lifecycle of every live one.
///
/// A projectile leaves the live set the moment it is released, so a second
/// trigger in the same frame (an overlap and a collision, say) finds nothing
/// to release.
#[derive(Debug)]
pub struct ProjectilePool {
    pool: ObjectPool,
    specs: HashMap<TemplateId, Arc<ProjectileSpec>>,
    live: BTreeMap<ActorId, Projectile>,
    stats: ProjectileStats,
}

impl ProjectilePool {
    pub fn new<H: ActorHost + ?Sized>(host: &mut H) -> Self {
        Self {
            pool: ObjectPool::new(host, "ProjectilePool"),
            specs: HashMap::new(),
            live: BTreeMap::new(),
            stats: ProjectileStats::default(),
        }
    }

    /// Register the behaviour of a projectile template.
    pub fn register(
        &mut self,
        template: TemplateId,
        spec: ProjectileSpec,
    ) -> Result<(), ProjectileError> {
        spec.validate()?;
        self.specs.insert(template, Arc::new(spec));
        Ok(())
    }

    pub fn spec(&self, template: TemplateId) -> Option<&ProjectileSpec> {
        self.specs.get(&template).map(Arc::as_ref)
    }

    pub fn prewarm<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        count: usize,
    ) -> Result<(), ProjectileError> {
        if !self.specs.contains_key(&template) {
            return Err(ProjectileError::UnknownTemplate(template));
        }
        self.pool.prewarm(host, template, count)?;
        Ok(())
    }

    /// Fire a projectile of `template` from `position`.
    pub fn spawn<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        position: Vec3,
        rotation: Quat,
    ) -> Result<ActorId, ProjectileError> {
        let spec = self
            .specs
            .get(&template)
            .cloned()
            .ok_or(ProjectileError::UnknownTemplate(template))?;
        let id = self.pool.acquire(host, template, position, rotation)?;
        self.live.insert(id, Projectile::new(id, Some(template), spec));
        self.stats.spawned += 1;
        tracing::debug!(%id, %template, x = position.x, "projectile spawned");
        Ok(id)
    }

    /// Track an actor placed outside the pool as a projectile.
    ///
    /// It has no pool context, so it is destroyed when it expires.
    pub fn adopt(&mut self, id: ActorId, spec: ProjectileSpec) -> Result<(), ProjectileError> {
        spec.validate()?;
        self.live.insert(id, Projectile::new(id, None, Arc::new(spec)));
        Ok(())
    }

    /// Advance every live projectile by `dt` seconds.
    pub fn tick<H: ActorHost + ?Sized>(&mut self, host: &mut H, dt: f32) -> ProjectileTick {
        let mut report = ProjectileTick::default();
        for (id, projectile) in &mut self.live {
            match projectile.advance(dt) {
                Step::Expired => report.expired.push(*id),
                Step::Alive { translation, spin } => {
                    let Some(mut t) = host.transform(*id) else {
                        report.lost.push(*id);
                        continue;
                    };
                    t.position += translation;
                    t.rotation = (spin * t.rotation).normalize();
                    if host.set_transform(*id, t).is_err() {
                        report.lost.push(*id);
                    }
                }
            }
        }
        for id in &report.lost {
            tracing::warn!(%id, "projectile actor vanished");
            self.live.remove(id);
            self.pool.forget(*id);
        }
        for id in &report.expired {
            self.release(host, *id);
        }
        report
    }

    /// Apply a contact reported by the host.
    pub fn contact<H, A>(
        &mut self,
        host: &mut H,
        id: ActorId,
        contact: &Contact,
        anchor: &mut A,
    ) -> ContactOutcome
    where
        H: ActorHost + ?Sized,
        A: AnchorSubject + ?Sized,
    {
        let Some(projectile) = self.live.get(&id) else {
            return ContactOutcome::NotLive;
        };
        let effect = projectile.spec().resolve(contact);
        match effect {
            ContactEffect::Ignore => ContactOutcome::Ignored,
            ContactEffect::Expire => {
                self.release(host, id);
                ContactOutcome::Expired
            }
            ContactEffect::HitAnchor => {
                anchor.take_fatal_damage();
                self.stats.anchor_hits += 1;
                self.release(host, id);
                ContactOutcome::HitAnchor
            }
        }
    }

    /// Take a projectile out of play: back to its pool, or destroyed if it has none.
    ///
    /// Returns `false` if it was not live, which makes repeated calls harmless.
    pub fn release<H: ActorHost + ?Sized>(&mut self, host: &mut H, id: ActorId) -> bool {
        let Some(projectile) = self.live.remove(&id) else {
            return false;
        };
        match projectile.template() {
            Some(template) => match self.pool.release(host, id, template) {
                Release::Pooled => self.stats.recycled += 1,
                Release::AlreadyReleased => {}
                Release::Unknown => {
                    tracing::warn!(%id, "projectile actor gone before release");
                    self.pool.forget(id);
                }
            },
            None => {
                if let Err(e) = host.destroy(id) {
                    tracing::warn!(%id, "could not destroy projectile: {e}");
                }
                self.stats.destroyed += 1;
            }
        }
        tracing::trace!(%id, "projectile released");
        true
    }

    pub fn is_live(&self, id: ActorId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn get(&self, id: ActorId) -> Option<&Projectile> {
        self.live.get(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.pooled_count()
    }

    pub fn stats(&self) -> ProjectileStats {
        self.stats
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }
}
