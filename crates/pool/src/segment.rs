use glam::{Quat, Vec3};
use persrun_common::{ActorId, TemplateId};
use persrun_kernel::ActorHost;

use crate::error::PoolError;
use crate::object_pool::{ObjectPool, PoolStats, Release};

/// What happened to a segment handed back through [`SegmentPool::reclaim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaim {
    /// Returned to the queue of its originating template.
    Pooled,
    /// No originating template on record; the actor was destroyed.
    Destroyed,
    /// Already queued or inactive.
    AlreadyReleased,
    /// The host no longer knows the actor.
    Missing,
}

/// Object pool specialised for level segments.
///
/// Every segment it hands out is recorded with its originating template, so
/// the reclaimer can return a segment without knowing which design it is.
#[derive(Debug)]
pub struct SegmentPool {
    pool: ObjectPool,
}

impl SegmentPool {
    pub fn new<H, I>(host: &mut H, templates: I) -> Self
    where
        H: ActorHost + ?Sized,
        I: IntoIterator<Item = TemplateId>,
    {
        Self {
            pool: ObjectPool::with_templates(host, "LevelSegmentPool", templates),
        }
    }

    /// Get a segment of `template` at `position`, recycled when possible.
    pub fn acquire_segment<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        position: Vec3,
        rotation: Quat,
    ) -> Result<ActorId, PoolError> {
        self.pool.acquire(host, template, position, rotation)
    }

    /// Return a segment to the queue of `template`.
    pub fn release_segment<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: ActorId,
        template: TemplateId,
    ) -> Release {
        self.pool.release(host, id, template)
    }

    /// Return a segment to the queue of its recorded template.
    ///
    /// A segment the pool never tagged is destroyed outright so it cannot
    /// leak into the wrong queue.
    pub fn reclaim<H: ActorHost + ?Sized>(&mut self, host: &mut H, id: ActorId) -> Reclaim {
        match self.pool.release_tracked(host, id) {
            Some(Release::Pooled) => Reclaim::Pooled,
            Some(Release::AlreadyReleased) => Reclaim::AlreadyReleased,
            Some(Release::Unknown) => Reclaim::Missing,
            None => match host.destroy(id) {
                Ok(()) => {
                    tracing::warn!(%id, "segment has no originating template, destroyed");
                    Reclaim::Destroyed
                }
                Err(_) => Reclaim::Missing,
            },
        }
    }

    /// Drop the bookkeeping for a segment the host lost.
    pub fn forget(&mut self, id: ActorId) {
        self.pool.forget(id);
    }

    pub fn origin_of(&self, id: ActorId) -> Option<TemplateId> {
        self.pool.origin_of(id)
    }

    pub fn is_pooled(&self, id: ActorId) -> bool {
        self.pool.is_pooled(id)
    }

    pub fn available(&self, template: TemplateId) -> usize {
        self.pool.available(template)
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.pooled_count()
    }

    /// Segments currently out in the world.
    pub fn live_count(&self) -> usize {
        self.pool.tracked_count() - self.pool.pooled_count()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }
}
