use glam::{Quat, Vec3};
use persrun_common::{ActorId, Anchor, TemplateId};
use persrun_kernel::ActorHost;
use persrun_pool::SegmentPool;
use std::time::{Duration, Instant};

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::selection::SelectionOrder;

/// Lifecycle of a [`LevelStreamer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerState {
    Uninitialized,
    Seeding,
    Streaming,
}

/// A segment placed at the frontier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: ActorId,
    pub template: TemplateId,
    /// Where the segment was placed.
    pub at: Vec3,
    /// Whether the frontier moved strictly forward.
    pub advanced: bool,
}

/// Streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub placed_last_poll: usize,
    pub total_placed: usize,
    pub polls: u64,
    /// Polls skipped because the anchor was missing.
    pub skipped_polls: u64,
    /// Placements whose exit marker was missing or pointed backwards.
    pub data_errors: usize,
    pub poll_time: Duration,
}

/// Resolve the initial frontier from a start zone's exit marker.
///
/// A start zone without the marker is a configuration error.
pub fn frontier_from_marker<H: ActorHost + ?Sized>(
    host: &H,
    start_zone: ActorId,
    marker: &str,
) -> Result<Vec3, StreamError> {
    host.marker(start_zone, marker).ok_or_else(|| {
        tracing::error!(%start_zone, marker, "start zone has no exit marker");
        StreamError::MissingStartMarker {
            zone: start_zone,
            marker: marker.to_owned(),
        }
    })
}

/// Keeps level content built ahead of the anchor.
///
/// Owns the frontier: the world-space exit point of the most recently placed
/// segment. Segments are only ever concatenated forward, so `frontier.x`
/// never decreases.
#[derive(Debug)]
pub struct LevelStreamer {
    config: StreamConfig,
    selection: SelectionOrder,
    frontier: Vec3,
    state: StreamerState,
    stats: StreamStats,
}

impl LevelStreamer {
    /// Validate the configuration and catalog and build an unseeded streamer.
    pub fn new(
        config: StreamConfig,
        catalog: &[TemplateId],
        start_frontier: Vec3,
        seed: u64,
    ) -> Result<Self, StreamError> {
        if let Err(e) = config.validate() {
            tracing::error!("stream config rejected: {e}");
            return Err(e);
        }
        if !start_frontier.is_finite() {
            tracing::error!(?start_frontier, "start frontier is not finite");
            return Err(StreamError::InvalidConfig(format!(
                "start frontier must be finite, got {start_frontier}"
            )));
        }
        let selection = SelectionOrder::new(catalog, seed).inspect_err(|e| {
            tracing::error!("segment catalog rejected: {e}");
        })?;
        Ok(Self {
            config,
            selection,
            frontier: start_frontier,
            state: StreamerState::Uninitialized,
            stats: StreamStats::default(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> StreamerState {
        self.state
    }

    pub fn frontier(&self) -> Vec3 {
        self.frontier
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Whether an anchor at `anchor_x` still needs content placed ahead of it.
    pub fn needs_segment(&self, anchor_x: f32) -> bool {
        anchor_x + self.config.lookahead_distance > self.frontier.x
    }

    /// Place the initial `seed_count` segments back-to-back, then start streaming.
    ///
    /// Seeding ends early at a placement that does not move the frontier, so
    /// segments never pile up at one spot; polling fills the rest.
    pub fn seed<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        pool: &mut SegmentPool,
    ) -> Result<Vec<Placement>, StreamError> {
        if self.state != StreamerState::Uninitialized {
            return Err(StreamError::AlreadySeeded);
        }
        self.state = StreamerState::Seeding;
        let mut placed = Vec::with_capacity(self.config.seed_count);
        for _ in 0..self.config.seed_count {
            let placement = self.place_next(host, pool)?;
            placed.push(placement);
            if !placement.advanced {
                tracing::warn!(
                    seeded = placed.len(),
                    frontier = self.frontier.x,
                    "frontier did not advance, seeding stopped early"
                );
                break;
            }
        }
        self.state = StreamerState::Streaming;
        tracing::info!(
            seeded = placed.len(),
            frontier = self.frontier.x,
            "level seeded"
        );
        Ok(placed)
    }

    /// One streaming check: place segments until the anchor's lookahead is covered.
    ///
    /// Catches up fully in a single call after a large anchor jump. A missing
    /// anchor skips the check. If a placement fails to move the frontier
    /// forward the pass stops there and resumes on the next poll.
    pub fn poll<H, A>(
        &mut self,
        host: &mut H,
        pool: &mut SegmentPool,
        anchor: &A,
    ) -> Result<Vec<Placement>, StreamError>
    where
        H: ActorHost + ?Sized,
        A: Anchor + ?Sized,
    {
        let _span = tracing::info_span!("stream_poll").entered();
        if self.state != StreamerState::Streaming {
            return Err(StreamError::NotSeeded);
        }
        let started = Instant::now();
        self.stats.polls += 1;

        let Some(anchor_pos) = anchor.position() else {
            self.stats.skipped_polls += 1;
            tracing::trace!("anchor missing, skipping poll");
            return Ok(Vec::new());
        };

        let mut placed = Vec::new();
        while self.needs_segment(anchor_pos.x) {
            let placement = self.place_next(host, pool)?;
            placed.push(placement);
            if !placement.advanced {
                tracing::warn!(
                    frontier = self.frontier.x,
                    "frontier did not advance, resuming next poll"
                );
                break;
            }
        }

        self.stats.placed_last_poll = placed.len();
        self.stats.poll_time = started.elapsed();
        tracing::trace!(
            placed = placed.len(),
            frontier = self.frontier.x,
            anchor = anchor_pos.x,
            "stream poll complete"
        );
        Ok(placed)
    }

    fn place_next<H: ActorHost + ?Sized>(
        &mut self,
        host: &mut H,
        pool: &mut SegmentPool,
    ) -> Result<Placement, StreamError> {
        let template = self.selection.pick();
        let at = self.frontier;
        let id = pool.acquire_segment(host, template, at, Quat::IDENTITY)?;
        self.stats.total_placed += 1;

        let mut advanced = false;
        match host.marker(id, &self.config.exit_marker) {
            Some(exit) if exit.x >= self.frontier.x => {
                advanced = exit.x > self.frontier.x;
                self.frontier = exit;
            }
            Some(exit) => {
                self.stats.data_errors += 1;
                tracing::warn!(
                    %id,
                    %template,
                    exit = exit.x,
                    frontier = self.frontier.x,
                    "exit marker behind frontier, frontier unchanged"
                );
            }
            None => {
                self.stats.data_errors += 1;
                tracing::warn!(
                    %id,
                    %template,
                    marker = %self.config.exit_marker,
                    "placed segment has no exit marker, frontier unchanged"
                );
            }
        }
        tracing::debug!(%id, %template, x = at.x, frontier = self.frontier.x, "segment placed");
        Ok(Placement {
            id,
            template,
            at,
            advanced,
        })
    }
}
