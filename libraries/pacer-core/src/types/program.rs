/// Training program domain types
use super::track::Cue;
use serde::{Deserialize, Serialize};

fn default_volume() -> f32 {
    1.0
}

/// Placement of a stored track inside a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackInstance {
    /// Name of the referenced track
    pub song_name: String,

    /// Cues for this placement, in non-decreasing time order
    #[serde(default)]
    pub instructions: Vec<Cue>,

    /// Marks a pause placement
    #[serde(default)]
    pub pause: bool,

    /// Playback gain in [0, 1]
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl TrackInstance {
    /// Create an instance at full volume with no cues
    pub fn new(song_name: impl Into<String>) -> Self {
        Self {
            song_name: song_name.into(),
            instructions: Vec::new(),
            pause: false,
            volume: default_volume(),
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Append a cue (callers keep cues in time order)
    #[must_use]
    pub fn with_cue(mut self, time: f64, text: impl Into<String>) -> Self {
        self.instructions.push(Cue::new(time, text));
        self
    }

    #[must_use]
    pub fn as_pause(mut self) -> Self {
        self.pause = true;
        self
    }
}

/// Reference to another named program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProgramInstance {
    /// Name of the referenced program
    pub training_name: String,
}

impl ProgramInstance {
    pub fn new(training_name: impl Into<String>) -> Self {
        Self {
            training_name: training_name.into(),
        }
    }
}

/// One entry of a program's content
///
/// Serialized with an explicit `Type` discriminator so entries are never
/// told apart by which fields happen to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum ProgramEntry {
    #[serde(rename = "Song")]
    Track(TrackInstance),

    #[serde(rename = "Training")]
    Program(ProgramInstance),
}

impl ProgramEntry {
    /// The sub-program reference, if this entry is one
    pub fn as_program(&self) -> Option<&ProgramInstance> {
        match self {
            Self::Program(instance) => Some(instance),
            Self::Track(_) => None,
        }
    }
}

impl From<TrackInstance> for ProgramEntry {
    fn from(instance: TrackInstance) -> Self {
        Self::Track(instance)
    }
}

impl From<ProgramInstance> for ProgramEntry {
    fn from(instance: ProgramInstance) -> Self {
        Self::Program(instance)
    }
}

/// A named, possibly nested training program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Program {
    pub name: String,

    /// Templates are building blocks for other programs
    #[serde(default)]
    pub template: bool,

    pub content: Vec<ProgramEntry>,

    /// Track used for pause placements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_song: Option<String>,

    #[serde(default = "default_volume")]
    pub pause_volume: f32,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: false,
            content: Vec::new(),
            pause_song: None,
            pause_volume: default_volume(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<ProgramEntry>) -> Self {
        self.content.push(entry.into());
        self
    }

    #[must_use]
    pub fn as_template(mut self) -> Self {
        self.template = true;
        self
    }

    #[must_use]
    pub fn with_pause_song(mut self, name: impl Into<String>, volume: f32) -> Self {
        self.pause_song = Some(name.into());
        self.pause_volume = volume;
        self
    }

    /// Names of directly referenced sub-programs, in content order
    pub fn sub_program_names(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter_map(ProgramEntry::as_program)
            .map(|instance| instance.training_name.as_str())
    }

    /// Whether the program can be played without flattening
    pub fn is_flat(&self) -> bool {
        self.sub_program_names().next().is_none()
    }
}

/// Flattened, scheduler-ready program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayableProgram {
    pub name: String,
    pub content: Vec<TrackInstance>,
}

impl PlayableProgram {
    pub fn new(name: impl Into<String>, content: Vec<TrackInstance>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackInstance> {
        self.content.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_volume_defaults_to_full() {
        let json = r#"{"SongName":"a","Instructions":[]}"#;
        let instance: TrackInstance = serde_json::from_str(json).unwrap();

        assert_eq!(instance.volume, 1.0);
        assert!(!instance.pause);
    }

    #[test]
    fn entries_are_discriminated_by_type_tag() {
        let json = r#"{
            "Name": "session",
            "Content": [
                {"Type": "Song", "SongName": "a", "Volume": 0.5},
                {"Type": "Training", "TrainingName": "block"}
            ]
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();

        assert_eq!(program.content.len(), 2);
        assert!(matches!(&program.content[0], ProgramEntry::Track(t) if t.volume == 0.5));
        assert_eq!(program.sub_program_names().collect::<Vec<_>>(), vec!["block"]);
        assert!(!program.is_flat());
    }

    #[test]
    fn untagged_entry_is_rejected() {
        let json = r#"{"Name":"x","Content":[{"SongName":"a"}]}"#;
        assert!(serde_json::from_str::<Program>(json).is_err());
    }

    #[test]
    fn program_builder_round_trips() {
        let program = Program::new("session")
            .with_entry(TrackInstance::new("a").with_cue(10.0, "faster"))
            .with_entry(ProgramInstance::new("block"))
            .with_pause_song("rest", 0.4);

        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, program);
    }
}
