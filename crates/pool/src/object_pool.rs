use glam::{Quat, Vec3};
use persrun_common::{ActorId, TemplateId};
use persrun_kernel::ActorHost;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::PoolError;

/// Outcome of returning an actor to a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The actor was deactivated and enqueued.
    Pooled,
    /// The actor was already inactive or already queued; nothing changed.
    AlreadyReleased,
    /// The host no longer knows the actor.
    Unknown,
}

/// Counters for instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: usize,
    pub reused: usize,
    pub released: usize,
    /// Queue entries skipped because the host had destroyed them.
    pub stale_skipped: usize,
}

/// Keyed reuse pool mapping a template to a queue of inactive actors.
///
/// The pool keeps an explicit `actor -> template` association for everything
/// it created or took back, so callers can return an actor without knowing
/// where it came from. Inactive actors are parented under a holding container
/// owned by the pool.
///
/// The host is passed into every operation instead of being stored, so one
/// session can drive several pools over the same world.
#[derive(Debug)]
pub struct ObjectPool {
    name: String,
    container: ActorId,
    queues: HashMap<TemplateId, VecDeque<ActorId>>,
    origins: HashMap<ActorId, TemplateId>,
    pooled: HashSet<ActorId>,
    stats: PoolStats,
}

impl ObjectPool {
    /// Create an empty pool and its holding container.
    pub fn new<H: ActorHost + ?Sized>(host: &mut H, name: impl Into<String>) -> Self {
        let name = name.into();
        let container = host.create_container(&name);
        Self {
            name,
            container,
            queues: HashMap::new(),
            origins: HashMap::new(),
            pooled: HashSet::new(),
            stats: PoolStats::default(),
        }
    }

    /// Create a pool with empty queues for the given templates.
    pub fn with_templates<H, I>(host: &mut H, name: impl Into<String>, templates: I) -> Self
    where
        H: ActorHost + ?Sized,
        I: IntoIterator<Item = TemplateId>,
    {
        let mut pool = Self::new(host, name);
        for t in templates {
            pool.queues.entry(t).or_default();
        }
        pool
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The holding container inactive actors are parented under.
    pub fn container(&self) -> ActorId {
        self.container
    }

    /// Create `count` inactive actors of `template` up front.
    pub fn prewarm<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        count: usize,
    ) -> Result<(), PoolError> {
        for _ in 0..count {
            let id = self.acquire_new(host, template, Vec3::ZERO, Quat::IDENTITY)?;
            self.release(host, id, template);
        }
        tracing::debug!(pool = %self.name, %template, count, "prewarmed");
        Ok(())
    }

    /// Hand out an actor of `template` placed at `position`/`rotation`.
    ///
    /// Recycles the oldest queued actor when one is available, otherwise asks
    /// the host for a new one.
    pub fn acquire<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        position: Vec3,
        rotation: Quat,
    ) -> Result<ActorId, PoolError> {
        let queue = self.queues.entry(template).or_default();
        while let Some(id) = queue.pop_front() {
            self.pooled.remove(&id);
            let Some(mut transform) = host.transform(id) else {
                tracing::warn!(pool = %self.name, %id, "pooled actor vanished, skipping");
                self.origins.remove(&id);
                self.stats.stale_skipped += 1;
                continue;
            };
            transform.position = position;
            transform.rotation = rotation;
            host.reparent(id, None)?;
            host.set_transform(id, transform)?;
            host.set_active(id, true)?;
            self.origins.insert(id, template);
            self.stats.reused += 1;
            tracing::trace!(pool = %self.name, %id, %template, "reused");
            return Ok(id);
        }
        self.acquire_new(host, template, position, rotation)
    }

    fn acquire_new<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        template: TemplateId,
        position: Vec3,
        rotation: Quat,
    ) -> Result<ActorId, PoolError> {
        let transform = persrun_common::Transform::from_position_rotation(position, rotation);
        let id = host.instantiate(template, transform)?;
        self.origins.insert(id, template);
        self.stats.created += 1;
        tracing::trace!(pool = %self.name, %id, %template, "created");
        Ok(id)
    }

    /// Deactivate `id`, park it under the holding container, and queue it under `template`.
    ///
    /// Releasing an actor that is already inactive or queued is a no-op, so a
    /// double release never enqueues the same actor twice. A template the pool
    /// has never seen gets its queue created on the spot.
    pub fn release<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: ActorId,
        template: TemplateId,
    ) -> Release {
        if self.pooled.contains(&id) {
            return Release::AlreadyReleased;
        }
        match host.is_active(id) {
            None => {
                self.origins.remove(&id);
                return Release::Unknown;
            }
            Some(false) => return Release::AlreadyReleased,
            Some(true) => {}
        }

        let container = self.holding_area(host);
        if host.set_active(id, false).is_err() || host.reparent(id, Some(container)).is_err() {
            return Release::Unknown;
        }
        self.queues.entry(template).or_default().push_back(id);
        self.pooled.insert(id);
        self.origins.insert(id, template);
        self.stats.released += 1;
        tracing::trace!(pool = %self.name, %id, %template, "released");
        Release::Pooled
    }

    /// Release `id` under the template recorded when it was created.
    ///
    /// Returns `None` when the pool has no record of the actor.
    pub fn release_tracked<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        id: ActorId,
    ) -> Option<Release> {
        let template = self.origin_of(id)?;
        Some(self.release(host, id, template))
    }

    /// Drop all bookkeeping for `id`, e.g. after the caller destroyed it.
    pub fn forget(&mut self, id: ActorId) {
        self.origins.remove(&id);
        if self.pooled.remove(&id) {
            for queue in self.queues.values_mut() {
                queue.retain(|q| *q != id);
            }
        }
    }

    fn holding_area<H: ActorHost + ?Sized>(&mut self, host: &mut H) -> ActorId {
        if !host.exists(self.container) {
            tracing::warn!(pool = %self.name, "holding container missing, recreating");
            self.container = host.create_container(&self.name);
        }
        self.container
    }

    /// Template an actor was created from, if the pool knows it.
    pub fn origin_of(&self, id: ActorId) -> Option<TemplateId> {
        self.origins.get(&id).copied()
    }

    /// Whether `id` currently sits in one of the queues.
    pub fn is_pooled(&self, id: ActorId) -> bool {
        self.pooled.contains(&id)
    }

    /// Number of queued actors for a template.
    pub fn available(&self, template: TemplateId) -> usize {
        self.queues.get(&template).map_or(0, VecDeque::len)
    }

    /// Queued actors for a template, oldest first.
    pub fn queued(&self, template: TemplateId) -> impl Iterator<Item = ActorId> + '_ {
        self.queues.get(&template).into_iter().flatten().copied()
    }

    /// Total number of queued actors across templates.
    pub fn pooled_count(&self) -> usize {
        self.pooled.len()
    }

    /// Number of actors the pool is tracking, live or queued.
    pub fn tracked_count(&self) -> usize {
        self.origins.len()
    }

    /// Templates that have a queue.
    pub fn templates(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.queues.keys().copied()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persrun_kernel::{Blueprint, World};
    use proptest::prelude::*;

    const A: TemplateId = TemplateId(0);
    const B: TemplateId = TemplateId(1);

    fn world() -> World {
        let mut w = World::new();
        w.register_blueprint(A, Blueprint::new("a"));
        w.register_blueprint(B, Blueprint::new("b"));
        w
    }

    #[test]
    fn acquire_creates_on_miss() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool
            .acquire(&mut w, A, Vec3::new(1.0, 2.0, 0.0), Quat::IDENTITY)
            .unwrap();
        assert_eq!(w.is_active(id), Some(true));
        assert_eq!(w.transform(id).unwrap().position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(pool.origin_of(id), Some(A));
        assert_eq!(pool.stats().created, 1);
    }

    #[test]
    fn release_then_acquire_reuses() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_eq!(pool.release(&mut w, id, A), Release::Pooled);
        assert_eq!(w.is_active(id), Some(false));
        assert_eq!(w.parent(id), Some(pool.container()));
        assert_eq!(pool.available(A), 1);

        let again = pool
            .acquire(&mut w, A, Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY)
            .unwrap();
        assert_eq!(again, id);
        assert_eq!(w.is_active(id), Some(true));
        assert_eq!(w.parent(id), None);
        assert_eq!(w.transform(id).unwrap().position.x, 5.0);
        assert_eq!(w.instantiation_count(), 1);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn templates_do_not_share_queues() {
        let mut w = world();
        let mut pool = ObjectPool::with_templates(&mut w, "test", [A, B]);
        let a = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        pool.release(&mut w, a, A);
        let b = pool.acquire(&mut w, B, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.available(A), 1);
    }

    #[test]
    fn double_release_is_noop() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_eq!(pool.release(&mut w, id, A), Release::Pooled);
        assert_eq!(pool.release(&mut w, id, A), Release::AlreadyReleased);
        assert_eq!(pool.queued(A).filter(|q| *q == id).count(), 1);
    }

    #[test]
    fn release_of_inactive_actor_is_noop() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = w.instantiate(A, Default::default()).unwrap();
        w.set_active(id, false).unwrap();
        assert_eq!(pool.release(&mut w, id, A), Release::AlreadyReleased);
        assert_eq!(pool.available(A), 0);
    }

    #[test]
    fn release_unseen_template_creates_queue() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = w.instantiate(B, Default::default()).unwrap();
        assert_eq!(pool.templates().count(), 0);
        assert_eq!(pool.release(&mut w, id, B), Release::Pooled);
        assert_eq!(pool.available(B), 1);
        assert_eq!(pool.origin_of(id), Some(B));
    }

    #[test]
    fn release_unknown_actor() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        assert_eq!(pool.release(&mut w, ActorId(42), A), Release::Unknown);
    }

    #[test]
    fn release_tracked_uses_origin() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool.acquire(&mut w, B, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_eq!(pool.release_tracked(&mut w, id), Some(Release::Pooled));
        assert_eq!(pool.available(B), 1);
        assert_eq!(pool.release_tracked(&mut w, ActorId(99)), None);
    }

    #[test]
    fn acquire_skips_destroyed_entries() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        pool.release(&mut w, id, A);
        w.destroy(id).unwrap();

        let fresh = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_ne!(fresh, id);
        assert_eq!(pool.stats().stale_skipped, 1);
        assert_eq!(pool.origin_of(id), None);
    }

    #[test]
    fn prewarm_fills_queue_without_live_actors() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        pool.prewarm(&mut w, A, 4).unwrap();
        assert_eq!(pool.available(A), 4);
        assert_eq!(w.active_count(), 0);

        pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_eq!(w.instantiation_count(), 4);
    }

    #[test]
    fn release_recreates_missing_container() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let old = pool.container();
        w.destroy(old).unwrap();
        let id = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        assert_eq!(pool.release(&mut w, id, A), Release::Pooled);
        assert_ne!(pool.container(), old);
        assert_eq!(w.parent(id), Some(pool.container()));
    }

    #[test]
    fn forget_drops_queue_entry() {
        let mut w = world();
        let mut pool = ObjectPool::new(&mut w, "test");
        let id = pool.acquire(&mut w, A, Vec3::ZERO, Quat::IDENTITY).unwrap();
        pool.release(&mut w, id, A);
        pool.forget(id);
        assert_eq!(pool.available(A), 0);
        assert!(!pool.is_pooled(id));
        assert_eq!(pool.tracked_count(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire(bool),
        Release(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Acquire),
            (0usize..16).prop_map(Op::Release),
        ]
    }

    // Property: an actor is never in two queues, never both queued and live,
    // and acquire never hands out a queued actor.
    proptest! {
        #[test]
        fn prop_pool_identity(ops in proptest::collection::vec(op_strategy(), 1..200)) {
            let mut w = world();
            let mut pool = ObjectPool::with_templates(&mut w, "prop", [A, B]);
            let mut live: Vec<(ActorId, TemplateId)> = Vec::new();

            for op in ops {
                match op {
                    Op::Acquire(pick_a) => {
                        let t = if pick_a { A } else { B };
                        let id = pool.acquire(&mut w, t, Vec3::ZERO, Quat::IDENTITY).unwrap();
                        prop_assert!(!pool.is_pooled(id));
                        prop_assert!(pool.queued(A).chain(pool.queued(B)).all(|q| q != id));
                        prop_assert!(live.iter().all(|(l, _)| *l != id));
                        live.push((id, t));
                    }
                    Op::Release(i) => {
                        if live.is_empty() {
                            continue;
                        }
                        let (id, t) = live[i % live.len()];
                        // Release twice to exercise the guard.
                        pool.release(&mut w, id, t);
                        pool.release(&mut w, id, t);
                        live.retain(|(l, _)| *l != id);
                    }
                }

                let queued: Vec<ActorId> = pool.queued(A).chain(pool.queued(B)).collect();
                let unique: HashSet<ActorId> = queued.iter().copied().collect();
                prop_assert_eq!(queued.len(), unique.len());
                for id in &queued {
                    prop_assert_eq!(w.is_active(*id), Some(false));
                }
                for (id, _) in &live {
                    prop_assert_eq!(w.is_active(*id), Some(true));
                    prop_assert!(!unique.contains(id));
                }
                prop_assert_eq!(queued.len() + live.len(), pool.tracked_count());
            }
        }
    }
}
