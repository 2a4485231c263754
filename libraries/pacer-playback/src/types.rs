//! Core types for playback scheduling

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};

/// Coarse scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No program chosen
    Empty,

    /// Program chosen, not playing
    Stopped,

    /// Current buffer started against the audio clock
    Playing,

    /// Cursor ran past the last entry; `reset` rewinds it
    Finished,
}

/// Why a command was declined without touching state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Another load holds the busy flag
    Busy,

    AlreadyPlaying,

    NotPlaying,

    /// No program chosen
    NoProgram,

    /// Cursor is past the last entry
    EndOfProgram,

    /// The next buffer is already committed to the backend
    NextAlreadyScheduled,

    /// Cursor is already on the first entry
    AtFirstTrack,
}

/// Result of a caller-facing command
///
/// A skipped command is an expected race, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    Applied,
    Skipped(SkipReason),
}

/// Configuration for the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Remaining time at which the next buffer is committed (default: 1.0s)
    pub schedule_lead_secs: f64,

    /// Remaining time at which the boundary shift happens (default: 0.01s)
    pub boundary_threshold_secs: f64,

    /// Training name shown when nothing is loaded
    pub placeholder_training: String,

    /// Song name shown when nothing is loaded
    pub placeholder_song: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule_lead_secs: 1.0,
            boundary_threshold_secs: 0.01,
            placeholder_training: "No training loaded".to_string(),
            placeholder_song: "No song loaded".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// The lead window must open before the boundary threshold is reached
    pub fn validate(&self) -> Result<()> {
        if !self.boundary_threshold_secs.is_finite() || self.boundary_threshold_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "boundary_threshold_secs must be non-negative, got {}",
                self.boundary_threshold_secs
            )));
        }
        if !self.schedule_lead_secs.is_finite()
            || self.schedule_lead_secs <= self.boundary_threshold_secs
        {
            return Err(PlaybackError::InvalidConfig(format!(
                "schedule_lead_secs ({}) must exceed boundary_threshold_secs ({})",
                self.schedule_lead_secs, self.boundary_threshold_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.schedule_lead_secs, 1.0);
        assert_eq!(config.boundary_threshold_secs, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lead_must_exceed_threshold() {
        let config = SchedulerConfig {
            schedule_lead_secs: 0.01,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"schedule_lead_secs": 2.0}"#).unwrap();
        assert_eq!(config.schedule_lead_secs, 2.0);
        assert_eq!(config.boundary_threshold_secs, 0.01);
    }
}
