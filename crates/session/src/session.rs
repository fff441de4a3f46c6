use glam::{Quat, Vec3};
use persrun_common::{ActorId, Anchor, AnchorSubject, TemplateId, Transform};
use persrun_kernel::{ActorHost, Blueprint, World};
use persrun_pool::SegmentPool;
use persrun_projectile::{Contact, ContactOutcome, Emitter, ProjectilePool};
use persrun_stream::{LevelStreamer, Placement, SegmentReclaimer, frontier_from_marker};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::runner::Runner;
use crate::schedule::Periodic;

/// Template of the fixed start zone. Catalog templates are numbered after it.
const START_ZONE: TemplateId = TemplateId(0);

/// What happened during one [`Session::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Whether the streaming check ran this frame.
    pub polled: bool,
    pub placed: Vec<ActorId>,
    pub reclaimed: Vec<ActorId>,
    pub fired: Vec<ActorId>,
    pub expired: Vec<ActorId>,
    /// World events recorded during the frame.
    pub events: usize,
}

/// One run of the game.
///
/// Owns the world and every pool outright; nothing is reachable through
/// globals. The frame order is: runner, projectiles, emitters, reclaimer,
/// then the streaming check when its cadence is due.
#[derive(Debug)]
pub struct Session {
    world: World,
    segments: SegmentPool,
    streamer: LevelStreamer,
    reclaimer: SegmentReclaimer,
    projectiles: ProjectilePool,
    runner: Runner,
    stream_poll: Periodic,
    templates: BTreeMap<String, TemplateId>,
    /// Emitter layout per segment template.
    layouts: HashMap<TemplateId, Vec<Emitter>>,
    /// Emitters of live segments.
    emitters: BTreeMap<ActorId, Vec<Emitter>>,
    start_zone: ActorId,
    frame: u64,
    elapsed: Duration,
    running: bool,
}

impl Session {
    /// Build the world from `config`, resolve the start frontier and seed the level.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        if let Err(e) = config.validate() {
            tracing::error!("session config rejected: {e}");
            return Err(e.into());
        }
        let exit_marker = config.stream.exit_marker.clone();
        let mut world = World::new();
        let mut templates = BTreeMap::new();

        world.register_blueprint(
            START_ZONE,
            Blueprint::new("StartZone").with_marker(&exit_marker, config.start_zone.exit),
        );
        let start_zone = world.instantiate(START_ZONE, Transform::default())?;
        let start_frontier = frontier_from_marker(&world, start_zone, &exit_marker)?;

        let mut next_template = START_ZONE.0 + 1;
        let mut catalog = Vec::with_capacity(config.segments.len());
        for segment in &config.segments {
            let template = TemplateId(next_template);
            next_template += 1;
            let mut blueprint = Blueprint::new(&segment.name);
            blueprint.markers = segment.markers.clone();
            if let Some(exit) = segment.exit {
                blueprint.markers.insert(exit_marker.clone(), exit);
            }
            world.register_blueprint(template, blueprint);
            templates.insert(segment.name.clone(), template);
            catalog.push(template);
        }

        let mut projectiles = ProjectilePool::new(&mut world);
        for projectile in &config.projectiles {
            let template = TemplateId(next_template);
            next_template += 1;
            world.register_blueprint(template, Blueprint::new(&projectile.name));
            projectiles.register(template, projectile.spec.clone())?;
            projectiles.prewarm(&mut world, template, projectile.prewarm)?;
            templates.insert(projectile.name.clone(), template);
        }

        let mut layouts = HashMap::new();
        for (segment, &template) in config.segments.iter().zip(&catalog) {
            if segment.emitters.is_empty() {
                continue;
            }
            let mut layout = Vec::with_capacity(segment.emitters.len());
            for e in &segment.emitters {
                let projectile = templates.get(&e.projectile).copied().ok_or_else(|| {
                    ConfigError::Invalid(format!("unknown projectile `{}`", e.projectile))
                })?;
                layout.push(Emitter::new(projectile, e.offset, e.interval, e.min_distance));
            }
            layouts.insert(template, layout);
        }

        let segments = SegmentPool::new(&mut world, catalog.iter().copied());
        let streamer =
            LevelStreamer::new(config.stream.clone(), &catalog, start_frontier, config.seed)?;

        let mut session = Self {
            world,
            segments,
            streamer,
            reclaimer: SegmentReclaimer::new(config.stream.despawn_distance),
            projectiles,
            runner: Runner::new(config.runner.start, config.runner.speed),
            stream_poll: Periodic::new(config.stream.poll_interval()),
            templates,
            layouts,
            emitters: BTreeMap::new(),
            start_zone,
            frame: 0,
            elapsed: Duration::ZERO,
            running: true,
        };

        let seeded = session
            .streamer
            .seed(&mut session.world, &mut session.segments)?;
        for placement in &seeded {
            session.track(placement);
        }
        session.world.drain_events();
        tracing::info!(
            seed = config.seed,
            catalog = catalog.len(),
            frontier = session.streamer.frontier().x,
            "session started"
        );
        Ok(session)
    }

    /// Load a config file and start a session from it.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, SessionError> {
        Self::new(SessionConfig::load(path)?)
    }

    /// Advance the session by one frame of `dt`.
    ///
    /// A stopped session does nothing and reports an empty frame.
    pub fn update(&mut self, dt: Duration) -> Result<FrameReport, SessionError> {
        let mut report = FrameReport::default();
        if !self.running {
            return Ok(report);
        }
        let _span = tracing::trace_span!("frame", frame = self.frame).entered();
        self.frame += 1;
        self.elapsed += dt;
        let secs = dt.as_secs_f32();

        self.runner.advance(secs);

        let tick = self.projectiles.tick(&mut self.world, secs);
        report.expired = tick.expired;

        let anchor = self.runner.position();
        for (&segment, emitters) in &mut self.emitters {
            let Some(origin) = self.world.transform(segment).map(|t| t.position) else {
                continue;
            };
            for emitter in emitters.iter_mut() {
                let Some(muzzle) = emitter.tick(secs, origin, anchor) else {
                    continue;
                };
                let template = emitter.template();
                match self
                    .projectiles
                    .spawn(&mut self.world, template, muzzle, Quat::IDENTITY)
                {
                    Ok(id) => report.fired.push(id),
                    Err(e) => {
                        tracing::warn!(%segment, %template, "emitter could not fire: {e}");
                    }
                }
            }
        }

        let reclaimed = self
            .reclaimer
            .check(&mut self.world, &mut self.segments, &self.runner);
        for id in reclaimed.released() {
            self.emitters.remove(&id);
            report.reclaimed.push(id);
        }

        if self.stream_poll.advance(dt) {
            report.polled = true;
            let placed = self
                .streamer
                .poll(&mut self.world, &mut self.segments, &self.runner)?;
            for placement in &placed {
                self.track(placement);
                report.placed.push(placement.id);
            }
        }

        report.events = self.world.drain_events().len();
        Ok(report)
    }

    /// Run `frames` updates of `dt` each.
    pub fn run(&mut self, frames: u64, dt: Duration) -> Result<(), SessionError> {
        for _ in 0..frames {
            self.update(dt)?;
        }
        Ok(())
    }

    /// Report a contact between a live projectile and something in the world.
    pub fn contact(&mut self, projectile: ActorId, contact: &Contact) -> ContactOutcome {
        self.projectiles
            .contact(&mut self.world, projectile, contact, &mut self.runner)
    }

    /// Bring the runner back at `position`. Streaming catches up on the next poll.
    pub fn revive_at(&mut self, position: Vec3) {
        self.runner.revive_at(position);
    }

    /// Tear the session down: streaming stops, live actors stay where they are.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.stream_poll.stop();
        tracing::info!(
            frame = self.frame,
            frontier = self.streamer.frontier().x,
            "session stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    pub fn streamer(&self) -> &LevelStreamer {
        &self.streamer
    }

    pub fn segments(&self) -> &SegmentPool {
        &self.segments
    }

    pub fn reclaimer(&self) -> &SegmentReclaimer {
        &self.reclaimer
    }

    pub fn projectiles(&self) -> &ProjectilePool {
        &self.projectiles
    }

    pub fn start_zone(&self) -> ActorId {
        self.start_zone
    }

    /// Template assigned to a segment or projectile name.
    pub fn template(&self, name: &str) -> Option<TemplateId> {
        self.templates.get(name).copied()
    }

    /// Segments currently placed in the level, in id order.
    pub fn live_segments(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.reclaimer.watched()
    }

    fn track(&mut self, placement: &Placement) {
        self.reclaimer.watch(placement.id);
        match self.layouts.get(&placement.template) {
            Some(layout) => {
                // Fresh copies so a reused segment starts its countdown over.
                self.emitters.insert(placement.id, layout.clone());
            }
            None => {
                self.emitters.remove(&placement.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmitterConfig, ProjectileConfig, SegmentConfig};
    use persrun_projectile::{ContactKind, ProjectileSpec};
    use persrun_stream::StreamConfig;

    const FRAME: Duration = Duration::from_millis(50);

    fn plain_config() -> SessionConfig {
        SessionConfig {
            seed: 3,
            stream: StreamConfig::default(),
            start_zone: crate::config::StartZoneConfig { exit: Vec3::ZERO },
            runner: crate::config::RunnerConfig {
                start: Vec3::ZERO,
                speed: 0.0,
            },
            segments: vec![
                SegmentConfig::new("a", 40.0),
                SegmentConfig::new("b", 60.0),
                SegmentConfig::new("c", 80.0),
            ],
            projectiles: Vec::new(),
        }
    }

    fn anchor_x(session: &Session) -> f32 {
        session.runner().position().map_or(f32::NAN, |p| p.x)
    }

    #[test]
    fn seeding_places_every_catalog_entry_once() {
        let session = Session::new(plain_config()).unwrap();
        assert_eq!(session.streamer().frontier().x, 180.0);
        assert_eq!(session.live_segments().count(), 3);
        assert_eq!(session.segments().stats().created, 3);
    }

    #[test]
    fn default_config_starts_from_start_zone_exit() {
        let session = Session::new(SessionConfig::default()).unwrap();
        assert_eq!(session.streamer().frontier().x, 20.0 + 40.0 + 60.0 + 80.0);
        assert!(session.template("needle").is_some());
        assert_eq!(session.projectiles().pooled_count(), 4);
    }

    #[test]
    fn far_jump_catches_up_in_one_frame() {
        let mut session = Session::new(plain_config()).unwrap();
        session.runner_mut().teleport(Vec3::new(250.0, 0.0, 0.0));
        let report = session.update(FRAME).unwrap();
        assert!(report.polled);
        assert!(!report.placed.is_empty());
        assert!(session.streamer().frontier().x >= 450.0);
    }

    #[test]
    fn revive_far_ahead_streams_on_next_poll() {
        let mut session = Session::new(plain_config()).unwrap();
        session.update(FRAME).unwrap();
        session.revive_at(Vec3::new(5_000.0, 0.0, 0.0));
        session.update(Duration::from_millis(200)).unwrap();
        assert!(session.streamer().frontier().x >= 5_200.0);
    }

    #[test]
    fn segments_behind_runner_are_reused() {
        let mut config = plain_config();
        config.runner.speed = 40.0;
        let mut session = Session::new(config).unwrap();
        session.run(1_200, FRAME).unwrap();

        let x = anchor_x(&session);
        assert!(x > 2_000.0);
        // The last poll may be up to one interval behind the runner.
        assert!(session.streamer().frontier().x >= x + 150.0);
        let stats = session.segments().stats();
        assert!(stats.reused > 0);
        assert!(stats.created < session.streamer().stats().total_placed);

        for id in session.live_segments() {
            assert!(!session.segments().is_pooled(id));
            assert_eq!(session.world().is_active(id), Some(true));
        }
    }

    #[test]
    fn frontier_never_moves_back() {
        let mut session = Session::new(plain_config()).unwrap();
        session.runner_mut().teleport(Vec3::new(600.0, 0.0, 0.0));
        let mut last = session.streamer().frontier().x;
        for step in 0..40 {
            let x = if step % 2 == 0 { 100.0 } else { 900.0 };
            session.runner_mut().teleport(Vec3::new(x, 0.0, 0.0));
            session.update(Duration::from_millis(200)).unwrap();
            let frontier = session.streamer().frontier().x;
            assert!(frontier >= last);
            last = frontier;
        }
    }

    #[test]
    fn missing_runner_pauses_streaming_and_reclaiming() {
        let mut session = Session::new(plain_config()).unwrap();
        session.runner_mut().remove();
        let frontier = session.streamer().frontier();
        for _ in 0..20 {
            let report = session.update(FRAME).unwrap();
            assert!(report.placed.is_empty());
            assert!(report.reclaimed.is_empty());
        }
        assert_eq!(session.streamer().frontier(), frontier);
        assert!(session.streamer().stats().skipped_polls > 0);
    }

    #[test]
    fn stop_halts_streaming() {
        let mut session = Session::new(plain_config()).unwrap();
        session.update(FRAME).unwrap();
        session.stop();
        assert!(!session.is_running());

        let frontier = session.streamer().frontier();
        let live = session.live_segments().count();
        session.runner_mut().teleport(Vec3::new(10_000.0, 0.0, 0.0));
        let report = session.update(Duration::from_secs(1)).unwrap();
        assert_eq!(report, FrameReport::default());
        assert_eq!(session.streamer().frontier(), frontier);
        assert_eq!(session.live_segments().count(), live);
    }

    #[test]
    fn same_seed_builds_same_world() {
        let mut a = Session::new(SessionConfig::default()).unwrap();
        let mut b = Session::new(SessionConfig::default()).unwrap();
        a.run(400, FRAME).unwrap();
        b.run(400, FRAME).unwrap();
        assert_eq!(a.world().state_hash(), b.world().state_hash());
        assert_eq!(a.streamer().frontier(), b.streamer().frontier());
    }

    #[test]
    fn emitter_fires_and_projectile_kills_runner() {
        let mut segment = SegmentConfig::new("turret", 60.0);
        segment.emitters.push(EmitterConfig {
            projectile: "bolt".to_owned(),
            offset: Vec3::new(30.0, 1.0, 0.0),
            interval: 1.0,
            min_distance: 3.0,
        });
        let config = SessionConfig {
            segments: vec![segment],
            projectiles: vec![ProjectileConfig {
                name: "bolt".to_owned(),
                spec: ProjectileSpec::default(),
                prewarm: 0,
            }],
            ..plain_config()
        };
        let mut session = Session::new(config).unwrap();

        let mut fired = Vec::new();
        for _ in 0..30 {
            fired.extend(session.update(FRAME).unwrap().fired);
        }
        assert!(!fired.is_empty());
        let bolt = fired[0];
        assert!(session.projectiles().is_live(bolt));

        let trigger = Contact::anchor(ContactKind::Trigger);
        assert_eq!(session.contact(bolt, &trigger), ContactOutcome::HitAnchor);
        assert_eq!(session.contact(bolt, &trigger), ContactOutcome::NotLive);
        assert!(!session.runner().is_alive());
        assert_eq!(session.runner().deaths(), 1);
    }

    #[test]
    fn projectiles_expire_back_into_pool() {
        let mut segment = SegmentConfig::new("turret", 60.0);
        segment.emitters.push(EmitterConfig {
            projectile: "bolt".to_owned(),
            offset: Vec3::ZERO,
            interval: 0.5,
            min_distance: 0.0,
        });
        let config = SessionConfig {
            segments: vec![segment],
            projectiles: vec![ProjectileConfig {
                name: "bolt".to_owned(),
                spec: ProjectileSpec {
                    lifetime: 1.0,
                    ..ProjectileSpec::default()
                },
                prewarm: 2,
            }],
            ..plain_config()
        };
        let mut session = Session::new(config).unwrap();
        let mut expired = 0;
        for _ in 0..200 {
            expired += session.update(FRAME).unwrap().expired.len();
        }
        assert!(expired > 0);
        // Each turret fires twice a second and a bolt lives one second.
        let turrets = session.live_segments().count();
        assert!(session.projectiles().live_count() <= turrets * 3);
        assert!(session.projectiles().stats().recycled >= expired);
    }

    #[test]
    fn failed_shot_does_not_cut_frame_short() {
        let mut session = Session::new(plain_config()).unwrap();
        let segment = session.live_segments().next().unwrap();
        let stray = Emitter::new(TemplateId(999), Vec3::ZERO, 0.01, 0.0);
        session.emitters.insert(segment, vec![stray]);
        session.runner_mut().teleport(Vec3::new(250.0, 0.0, 0.0));

        let report = session.update(FRAME).unwrap();
        assert!(report.fired.is_empty());
        assert!(report.polled);
        assert!(!report.placed.is_empty());
        assert!(report.events > 0);
        assert!(session.world().events().is_empty());
    }

    #[test]
    fn segment_without_exit_is_tolerated() {
        let mut config = plain_config();
        config.segments = vec![
            SegmentConfig::new("ok", 50.0),
            SegmentConfig {
                exit: None,
                ..SegmentConfig::new("broken", 0.0)
            },
        ];
        config.runner.speed = 20.0;
        let mut session = Session::new(config).unwrap();
        let start = session.streamer().frontier().x;
        session.run(200, FRAME).unwrap();
        assert!(session.streamer().stats().data_errors > 0);
        assert!(session.streamer().frontier().x > start);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = SessionConfig {
            segments: Vec::new(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(SessionError::Config(ConfigError::Invalid(_)))
        ));
    }
}
