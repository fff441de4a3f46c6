use glam::Vec3;
use persrun_projectile::ProjectileSpec;
use persrun_stream::StreamConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::ConfigError;

/// Full description of a session: catalogs, distances, and the runner.
///
/// Read from YAML or JSON. Tuning sections fall back to their defaults when
/// omitted; the catalogs start empty, so a file must list its own segments.
/// [`SessionConfig::default`] is the built-in demo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed for segment selection.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub start_zone: StartZoneConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
    #[serde(default)]
    pub projectiles: Vec<ProjectileConfig>,
}

fn default_seed() -> u64 {
    42
}

/// The fixed zone the level grows from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartZoneConfig {
    /// Exit point of the start zone, relative to the origin.
    pub exit: Vec3,
}

impl Default for StartZoneConfig {
    fn default() -> Self {
        Self {
            exit: Vec3::new(20.0, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub start: Vec3,
    /// Units per second along +X.
    pub speed: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(0.0, 1.0, 0.0),
            speed: 8.0,
        }
    }
}

/// A level segment design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub name: String,
    /// Exit marker offset; `None` builds a segment without one.
    pub exit: Option<Vec3>,
    /// Extra named markers.
    #[serde(default)]
    pub markers: BTreeMap<String, Vec3>,
    #[serde(default)]
    pub emitters: Vec<EmitterConfig>,
}

impl SegmentConfig {
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            exit: Some(Vec3::new(length, 0.0, 0.0)),
            markers: BTreeMap::new(),
            emitters: Vec::new(),
        }
    }
}

/// A projectile emitter mounted on a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Name of a projectile in the catalog.
    pub projectile: String,
    #[serde(default)]
    pub offset: Vec3,
    /// Seconds between shots.
    pub interval: f32,
    /// Hold fire while the runner is this close on the x axis.
    #[serde(default)]
    pub min_distance: f32,
}

/// A projectile design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    pub name: String,
    #[serde(flatten)]
    pub spec: ProjectileSpec,
    /// Inactive instances created up front.
    #[serde(default)]
    pub prewarm: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut canyon = SegmentConfig::new("canyon", 60.0);
        canyon.emitters.push(EmitterConfig {
            projectile: "needle".to_owned(),
            offset: Vec3::new(30.0, 1.0, 0.0),
            interval: 2.0,
            min_distance: 3.0,
        });
        Self {
            seed: default_seed(),
            stream: StreamConfig::default(),
            start_zone: StartZoneConfig::default(),
            runner: RunnerConfig::default(),
            segments: vec![
                SegmentConfig::new("meadow", 40.0),
                canyon,
                SegmentConfig::new("bridge", 80.0),
            ],
            projectiles: vec![ProjectileConfig {
                name: "needle".to_owned(),
                spec: ProjectileSpec::default(),
                prewarm: 4,
            }],
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_owned(),
                ));
            }
        };
        tracing::debug!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check everything a session needs before any actor is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.segments.is_empty() {
            return Err(ConfigError::Invalid("segment catalog is empty".into()));
        }
        if !self.start_zone.exit.is_finite() {
            return Err(ConfigError::Invalid("start zone exit must be finite".into()));
        }
        if !self.runner.start.is_finite() || !self.runner.speed.is_finite() {
            return Err(ConfigError::Invalid("runner start and speed must be finite".into()));
        }

        let mut names = HashSet::new();
        let all_names = self
            .segments
            .iter()
            .map(|s| &s.name)
            .chain(self.projectiles.iter().map(|p| &p.name));
        for name in all_names {
            if name.is_empty() {
                return Err(ConfigError::Invalid("template names must not be empty".into()));
            }
            if !names.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate template name `{name}`")));
            }
        }

        for p in &self.projectiles {
            p.spec
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("projectile `{}`: {e}", p.name)))?;
        }

        let projectile_names: HashSet<&str> =
            self.projectiles.iter().map(|p| p.name.as_str()).collect();
        for s in &self.segments {
            if s.exit.is_some_and(|e| !e.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "segment `{}` has a non-finite exit",
                    s.name
                )));
            }
            for e in &s.emitters {
                if !projectile_names.contains(e.projectile.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "segment `{}` emits unknown projectile `{}`",
                        s.name, e.projectile
                    )));
                }
                if !e.interval.is_finite() || e.interval <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "segment `{}` emitter interval must be positive",
                        s.name
                    )));
                }
            }
        }
        Ok(())
    }
}
