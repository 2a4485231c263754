/// Track and cue domain types
use serde::{Deserialize, Serialize};

/// A single stored audio asset with its tempo metadata
///
/// Tracks are immutable once stored. Instances within a program refer to
/// them by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Track {
    /// Unique track name
    pub name: String,

    /// Storage path of the raw audio asset
    pub path: String,

    /// Tempo in beats per minute (> 0)
    pub tempo: f64,

    /// Intro length in beats (0 = no intro)
    #[serde(default)]
    pub intro: f64,

    /// Pre-recorded duration in seconds
    ///
    /// Playback always uses the decoded duration; this is informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Track {
    /// Create a track without intro
    pub fn new(name: impl Into<String>, path: impl Into<String>, tempo: f64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            tempo,
            intro: 0.0,
            duration: None,
        }
    }

    /// Set the intro length in beats
    #[must_use]
    pub fn with_intro(mut self, beats: f64) -> Self {
        self.intro = beats;
        self
    }

    /// Set the pre-recorded duration in seconds
    #[must_use]
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Whether the track starts with a counted-in intro
    pub fn has_intro(&self) -> bool {
        self.intro > 0.0
    }
}

/// Timestamped instruction shown while a track plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cue {
    /// Seconds from track start
    pub time: f64,

    /// Instruction text
    pub text: String,
}

impl Cue {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_builder() {
        let track = Track::new("warmup", "warmup.mp3", 120.0)
            .with_intro(8.0)
            .with_duration(180.0);

        assert_eq!(track.name, "warmup");
        assert!(track.has_intro());
        assert_eq!(track.duration, Some(180.0));
    }

    #[test]
    fn track_json_uses_pascal_case() {
        let json = r#"{"Name":"a","Path":"a.mp3","Tempo":60,"Intro":4}"#;
        let track: Track = serde_json::from_str(json).unwrap();

        assert_eq!(track.tempo, 60.0);
        assert_eq!(track.intro, 4.0);
        assert_eq!(track.duration, None);

        let back = serde_json::to_value(&track).unwrap();
        assert!(back.get("Duration").is_none());
        assert_eq!(back["Path"], "a.mp3");
    }

    #[test]
    fn missing_intro_defaults_to_zero() {
        let json = r#"{"Name":"a","Path":"a.mp3","Tempo":90}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert!(!track.has_intro());
    }
}
