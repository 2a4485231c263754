//! Structural validation of untrusted records
//!
//! Serde enforces field presence and types; [`Validate`] adds the range
//! rules on top. Song entries of untrusted documents must also spell out
//! their `Instructions` list, even when it is empty. A record that fails
//! either step is rejected whole, before it reaches storage or the scheduler.

use crate::error::{PacerError, Result};
use crate::types::{Cue, PlayableProgram, Program, ProgramEntry, Track, TrackInstance};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Range and consistency checks for a deserialized record
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn require_name(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PacerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_unit(value: f32, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PacerError::validation(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn in_context(context: String) -> impl FnOnce(PacerError) -> PacerError {
    move |err| match err {
        PacerError::Validation(msg) => PacerError::Validation(format!("{context}: {msg}")),
        other => other,
    }
}

impl Validate for Cue {
    fn validate(&self) -> Result<()> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(PacerError::validation(format!(
                "Time must be a non-negative number, got {}",
                self.time
            )));
        }
        Ok(())
    }
}

impl Validate for Track {
    fn validate(&self) -> Result<()> {
        require_name(&self.name, "Name")?;
        require_name(&self.path, "Path")?;
        if !self.tempo.is_finite() || self.tempo <= 0.0 {
            return Err(PacerError::validation(format!(
                "Tempo must be positive, got {}",
                self.tempo
            )));
        }
        if !self.intro.is_finite() || self.intro < 0.0 {
            return Err(PacerError::validation(format!(
                "Intro must be non-negative, got {}",
                self.intro
            )));
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(PacerError::validation(format!(
                    "Duration must be positive, got {duration}"
                )));
            }
        }
        Ok(())
    }
}

impl Validate for TrackInstance {
    fn validate(&self) -> Result<()> {
        require_name(&self.song_name, "SongName")?;
        require_unit(self.volume, "Volume")?;
        for (i, cue) in self.instructions.iter().enumerate() {
            cue.validate().map_err(in_context(format!("Instructions[{i}]")))?;
        }
        Ok(())
    }
}

impl Validate for Program {
    fn validate(&self) -> Result<()> {
        require_name(&self.name, "Name")?;
        require_unit(self.pause_volume, "PauseVolume")?;
        if let Some(pause_song) = &self.pause_song {
            require_name(pause_song, "PauseSong")?;
        }
        for (i, entry) in self.content.iter().enumerate() {
            let result = match entry {
                ProgramEntry::Track(instance) => instance.validate(),
                ProgramEntry::Program(instance) => {
                    require_name(&instance.training_name, "TrainingName")
                }
            };
            result.map_err(in_context(format!("Content[{i}]")))?;
        }
        Ok(())
    }
}

impl Validate for PlayableProgram {
    fn validate(&self) -> Result<()> {
        require_name(&self.name, "Name")?;
        for (i, instance) in self.content.iter().enumerate() {
            instance
                .validate()
                .map_err(in_context(format!("Content[{i}]")))?;
        }
        Ok(())
    }
}

fn require_instructions(value: &Value) -> Result<()> {
    // A missing or mistyped `Content` is reported by serde
    let Some(content) = value.get("Content").and_then(Value::as_array) else {
        return Ok(());
    };
    for (i, entry) in content.iter().enumerate() {
        let is_song = entry.get("Type").and_then(Value::as_str) != Some("Training");
        if is_song && entry.get("Instructions").is_none() {
            return Err(PacerError::validation(format!(
                "Content[{i}]: missing field `Instructions`"
            )));
        }
    }
    Ok(())
}

fn decode<T>(value: &Value, kind: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let record: T = serde_json::from_value(value.clone())
        .map_err(|e| PacerError::validation(format!("invalid {kind}: {e}")))?;
    record
        .validate()
        .map_err(in_context(format!("invalid {kind}")))?;
    Ok(record)
}

/// Validate an untrusted program document
pub fn validate_program(value: &Value) -> Result<Program> {
    require_instructions(value)?;
    decode(value, "program")
}

/// Validate an untrusted track document
pub fn validate_track(value: &Value) -> Result<Track> {
    decode(value, "track")
}

/// Validate an untrusted, already flattened program document
pub fn validate_playable(value: &Value) -> Result<PlayableProgram> {
    require_instructions(value)?;
    decode(value, "playable program")
}

/// Parse and validate a program from JSON text
pub fn parse_program(json: &str) -> Result<Program> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| PacerError::validation(format!("program is not valid JSON: {e}")))?;
    validate_program(&value)
}
