use persrun_common::{ActorId, Anchor};
use persrun_kernel::ActorHost;
use persrun_pool::{Reclaim, SegmentPool};
use std::collections::BTreeSet;

/// Segments handed back during one [`SegmentReclaimer::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Returned to their pool.
    pub recycled: Vec<ActorId>,
    /// Had no originating template and were destroyed.
    pub destroyed: Vec<ActorId>,
    /// Vanished from the host before they could be reclaimed.
    pub lost: Vec<ActorId>,
}

impl ReclaimReport {
    pub fn is_empty(&self) -> bool {
        self.recycled.is_empty() && self.destroyed.is_empty() && self.lost.is_empty()
    }

    /// Every segment that stopped being watched.
    pub fn released(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.recycled
            .iter()
            .chain(&self.destroyed)
            .chain(&self.lost)
            .copied()
    }
}

/// Watches live segments and returns those left far enough behind the anchor.
///
/// A segment is reclaimed once `segment.x < anchor.x - despawn_distance`.
/// The check is not threshold-exact in time: it runs whenever the owner
/// calls it, so a segment may overshoot the line by one frame.
#[derive(Debug)]
pub struct SegmentReclaimer {
    despawn_distance: f32,
    watched: BTreeSet<ActorId>,
}

impl SegmentReclaimer {
    pub fn new(despawn_distance: f32) -> Self {
        Self {
            despawn_distance,
            watched: BTreeSet::new(),
        }
    }

    pub fn despawn_distance(&self) -> f32 {
        self.despawn_distance
    }

    /// Start watching a placed segment.
    pub fn watch(&mut self, id: ActorId) {
        self.watched.insert(id);
    }

    /// Stop watching a segment. Returns whether it was watched.
    pub fn unwatch(&mut self, id: ActorId) -> bool {
        self.watched.remove(&id)
    }

    pub fn is_watching(&self, id: ActorId) -> bool {
        self.watched.contains(&id)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Watched segments in id order.
    pub fn watched(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.watched.iter().copied()
    }

    /// Whether a segment at `segment_x` is past the despawn line for `anchor_x`.
    pub fn should_reclaim(&self, segment_x: f32, anchor_x: f32) -> bool {
        segment_x < anchor_x - self.despawn_distance
    }

    /// Reclaim every watched segment that has fallen behind the despawn line.
    ///
    /// A missing anchor skips the check entirely.
    pub fn check<H, A>(&mut self, host: &mut H, pool: &mut SegmentPool, anchor: &A) -> ReclaimReport
    where
        H: ActorHost + ?Sized,
        A: Anchor + ?Sized,
    {
        let mut report = ReclaimReport::default();
        let Some(anchor_pos) = anchor.position() else {
            return report;
        };

        for &id in &self.watched {
            let Some(transform) = host.transform(id) else {
                pool.forget(id);
                report.lost.push(id);
                continue;
            };
            if !self.should_reclaim(transform.position.x, anchor_pos.x) {
                continue;
            }
            match pool.reclaim(host, id) {
                Reclaim::Pooled | Reclaim::AlreadyReleased => report.recycled.push(id),
                Reclaim::Destroyed => report.destroyed.push(id),
                Reclaim::Missing => {
                    pool.forget(id);
                    report.lost.push(id);
                }
            }
        }

        for id in report.released() {
            self.watched.remove(&id);
        }
        if !report.is_empty() {
            tracing::debug!(
                recycled = report.recycled.len(),
                destroyed = report.destroyed.len(),
                lost = report.lost.len(),
                anchor = anchor_pos.x,
                "segments reclaimed"
            );
        }
        report
    }
}
