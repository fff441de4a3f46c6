use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StreamError;

/// Streaming configuration: how far ahead to build, how far behind to reclaim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Distance ahead of the anchor that must always have level content.
    pub lookahead_distance: f32,
    /// Number of segments placed back-to-back before streaming starts.
    pub seed_count: usize,
    /// Distance behind the anchor beyond which segments are reclaimed.
    pub despawn_distance: f32,
    /// Cadence of the streaming check, in milliseconds.
    pub poll_interval_ms: u64,
    /// Name of the child marker holding a segment's exit point.
    pub exit_marker: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            lookahead_distance: 200.0,
            seed_count: 3,
            despawn_distance: 100.0,
            poll_interval_ms: 200,
            exit_marker: "EndPoint".to_owned(),
        }
    }
}

impl StreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !self.lookahead_distance.is_finite() || self.lookahead_distance < 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "lookahead_distance must be a non-negative number, got {}",
                self.lookahead_distance
            )));
        }
        if !self.despawn_distance.is_finite() || self.despawn_distance < 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "despawn_distance must be a non-negative number, got {}",
                self.despawn_distance
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(StreamError::InvalidConfig(
                "poll_interval_ms must be positive".into(),
            ));
        }
        if self.exit_marker.is_empty() {
            return Err(StreamError::InvalidConfig(
                "exit_marker must not be empty".into(),
            ));
        }
        Ok(())
    }
}
