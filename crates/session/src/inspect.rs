use persrun_common::{ActorId, Anchor};
use persrun_kernel::ActorHost;

use crate::session::Session;

/// Session inspector for developer tooling.
///
/// Read-only queries against a running session for debugging and the CLI.
pub struct SessionInspector;

impl SessionInspector {
    /// Produce a summary of the session state.
    pub fn summary(session: &Session) -> SessionSummary {
        let segment_stats = session.segments().stats();
        SessionSummary {
            frame: session.frame(),
            elapsed_secs: session.elapsed().as_secs_f32(),
            anchor_x: session.runner().position().map(|p| p.x),
            frontier_x: session.streamer().frontier().x,
            live_segments: session.reclaimer().watched_count(),
            pooled_segments: session.segments().pooled_count(),
            segments_created: segment_stats.created,
            segments_reused: segment_stats.reused,
            live_projectiles: session.projectiles().live_count(),
            pooled_projectiles: session.projectiles().pooled_count(),
            deaths: session.runner().deaths(),
            data_errors: session.streamer().stats().data_errors,
            state_hash: session.world().state_hash(),
        }
    }

    /// Placed segments ordered along the run, with their x positions.
    pub fn segment_layout(session: &Session) -> Vec<(ActorId, f32)> {
        let mut layout: Vec<(ActorId, f32)> = session
            .live_segments()
            .filter_map(|id| {
                session
                    .world()
                    .transform(id)
                    .map(|t| (id, t.position.x))
            })
            .collect();
        layout.sort_by(|a, b| a.1.total_cmp(&b.1));
        layout
    }
}

/// Summary of session state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub frame: u64,
    pub elapsed_secs: f32,
    /// `None` while the runner is absent.
    pub anchor_x: Option<f32>,
    pub frontier_x: f32,
    pub live_segments: usize,
    pub pooled_segments: usize,
    pub segments_created: usize,
    pub segments_reused: usize,
    pub live_projectiles: usize,
    pub pooled_projectiles: usize,
    pub deaths: u32,
    pub data_errors: usize,
    pub state_hash: u64,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let anchor = self
            .anchor_x
            .map_or_else(|| "-".to_owned(), |x| format!("{x:.1}"));
        write!(
            f,
            "Session: frame={} t={:.2}s anchor={} frontier={:.1} segments={}+{} pooled \
             (created={} reused={}) projectiles={}+{} pooled deaths={} data_errors={} hash={:#018x}",
            self.frame,
            self.elapsed_secs,
            anchor,
            self.frontier_x,
            self.live_segments,
            self.pooled_segments,
            self.segments_created,
            self.segments_reused,
            self.live_projectiles,
            self.pooled_projectiles,
            self.deaths,
            self.data_errors,
            self.state_hash,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use std::time::Duration;

    #[test]
    fn summary_after_start() {
        let session = Session::new(SessionConfig::default()).unwrap();
        let summary = SessionInspector::summary(&session);
        assert_eq!(summary.frame, 0);
        assert_eq!(summary.live_segments, 3);
        assert_eq!(summary.segments_created, 3);
        assert_eq!(summary.pooled_projectiles, 4);
        assert_eq!(summary.anchor_x, Some(0.0));
    }

    #[test]
    fn layout_is_contiguous() {
        let session = Session::new(SessionConfig::default()).unwrap();
        let layout = SessionInspector::segment_layout(&session);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0].1, 20.0);
        assert!(layout.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn summary_tracks_frames() {
        let mut session = Session::new(SessionConfig::default()).unwrap();
        session.run(10, Duration::from_millis(50)).unwrap();
        let summary = SessionInspector::summary(&session);
        assert_eq!(summary.frame, 10);
        assert!((summary.elapsed_secs - 0.5).abs() < 1e-4);
    }

    #[test]
    fn summary_display() {
        let mut session = Session::new(SessionConfig::default()).unwrap();
        session.runner_mut().remove();
        let s = SessionInspector::summary(&session).to_string();
        assert!(s.contains("frame=0"));
        assert!(s.contains("anchor=-"));
    }
}
