//! Render projection
//!
//! Pure derivation of display facts from the playback cursor, the elapsed
//! offset and track metadata. Nothing here mutates scheduler state.

use crate::types::SchedulerConfig;
use pacer_core::{Cue, PlayableProgram, Track};
use serde::{Deserialize, Serialize};

/// Display facts for one render frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub training_name: String,
    pub song_name: String,

    /// Seconds left in the current track
    pub remaining: f64,

    /// Elapsed fraction of the current track
    pub completion: f64,

    /// Beat within the bar (1-4)
    pub beat: u32,

    /// Text of the upcoming cue (empty when none)
    pub display_text: String,

    /// Whole seconds until the upcoming cue
    pub display_countdown: u32,

    /// Beats left in the intro, 0 once it is over
    pub intro_countdown: u32,

    pub current_tempo: f64,

    /// Tempo of the following track, 0 when there is none
    pub next_tempo: f64,
}

impl DisplayInfo {
    /// Record shown when no program or no valid entry is loaded
    pub fn placeholder(config: &SchedulerConfig) -> Self {
        Self {
            training_name: config.placeholder_training.clone(),
            song_name: config.placeholder_song.clone(),
            remaining: 0.0,
            completion: 0.0,
            beat: 1,
            display_text: String::new(),
            display_countdown: 0,
            intro_countdown: 0,
            current_tempo: 0.0,
            next_tempo: 0.0,
        }
    }

    /// Remaining time as `m:ss`; a full 60 seconds rolls over into minutes
    pub fn remaining_label(&self) -> String {
        let remaining = self.remaining.max(0.0);
        let mut minutes = (remaining / 60.0).floor() as u64;
        let mut seconds = (remaining % 60.0).ceil() as u64;
        if seconds == 60 {
            minutes += 1;
            seconds = 0;
        }
        format!("{minutes}:{seconds:02}")
    }

    pub fn intro_label(&self) -> Option<String> {
        (self.intro_countdown > 0).then(|| format!("Intro - starts in {}", self.intro_countdown))
    }

    pub fn instruction_label(&self) -> Option<String> {
        (self.display_countdown > 0 && !self.display_text.is_empty())
            .then(|| format!("{} - {}", self.display_text, self.display_countdown))
    }
}

/// Elapsed beats at `offset` seconds
///
/// Beats are counted at four per quarter of a minute-beat (`tempo / 15`).
pub fn total_beats(offset: f64, tempo: f64) -> f64 {
    offset.max(0.0) * tempo / 15.0
}

/// Beat within the bar
///
/// An exact multiple of four reads as beat 1 of the next bar, not beat 0.
pub fn beat_number(offset: f64, tempo: f64) -> u32 {
    let beat = (total_beats(offset, tempo) % 4.0).ceil() as u32;
    beat.max(1)
}

/// Beats left in the intro, inclusive of its first beat
pub fn intro_countdown(offset: f64, tempo: f64, intro: f64) -> u32 {
    if intro <= 0.0 {
        return 0;
    }
    let remaining = (intro - total_beats(offset, tempo)).ceil();
    if remaining > 0.0 {
        (remaining - 1.0) as u32
    } else {
        0
    }
}

/// First cue still ahead of `offset`, with whole seconds until it fires
///
/// Cues are scanned in stored order.
pub fn active_cue(cues: &[Cue], offset: f64) -> Option<(&Cue, u32)> {
    cues.iter()
        .find(|cue| offset < cue.time)
        .map(|cue| (cue, (cue.time - offset).ceil() as u32))
}

/// Project the entry at `cursor`
///
/// `tracks` holds the resolved metadata for each entry of `program`.
/// Returns `None` when the cursor does not reference an entry.
pub fn project(
    program: &PlayableProgram,
    tracks: &[Track],
    cursor: usize,
    song_offset: f64,
    remaining: f64,
    completion: f64,
) -> Option<DisplayInfo> {
    let instance = program.get(cursor)?;
    let track = tracks.get(cursor)?;
    let offset = song_offset.max(0.0);

    let (display_text, display_countdown) = active_cue(&instance.instructions, offset)
        .map(|(cue, countdown)| (cue.text.clone(), countdown))
        .unwrap_or_default();

    Some(DisplayInfo {
        training_name: program.name.clone(),
        song_name: instance.song_name.clone(),
        remaining,
        completion,
        beat: beat_number(offset, track.tempo),
        display_text,
        display_countdown,
        intro_countdown: intro_countdown(offset, track.tempo, track.intro),
        current_tempo: track.tempo,
        next_tempo: tracks.get(cursor + 1).map_or(0.0, |next| next.tempo),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_core::TrackInstance;

    fn program() -> (PlayableProgram, Vec<Track>) {
        let program = PlayableProgram::new(
            "intervals",
            vec![
                TrackInstance::new("warmup")
                    .with_cue(5.0, "Rate 20")
                    .with_cue(30.0, "Rate 24"),
                TrackInstance::new("sprint"),
            ],
        );
        let tracks = vec![
            Track::new("warmup", "warmup.wav", 60.0).with_intro(8.0),
            Track::new("sprint", "sprint.wav", 150.0),
        ];
        (program, tracks)
    }

    #[test]
    fn exact_bar_boundary_reads_as_beat_one() {
        // 1.0s at 60 BPM is 4 beats; 4 mod 4 = 0
        assert_eq!(beat_number(1.0, 60.0), 1);
        assert_eq!(beat_number(0.0, 60.0), 1);
    }

    #[test]
    fn beat_advances_within_the_bar() {
        assert_eq!(beat_number(0.3, 60.0), 2); // 1.2 beats
        assert_eq!(beat_number(0.6, 60.0), 3); // 2.4 beats
        assert_eq!(beat_number(0.9, 60.0), 4); // 3.6 beats
    }

    #[test]
    fn intro_countdown_is_inclusive_of_first_beat() {
        // 0.5s at 60 BPM is 2 beats; ceil(8 - 2) = 6 -> 5
        assert_eq!(intro_countdown(0.5, 60.0, 8.0), 5);
        assert_eq!(intro_countdown(0.0, 60.0, 8.0), 7);
        assert_eq!(intro_countdown(2.0, 60.0, 8.0), 0);
        assert_eq!(intro_countdown(0.5, 60.0, 0.0), 0);
    }

    #[test]
    fn first_future_cue_is_active() {
        let (program, _) = program();
        let cues = &program.content[0].instructions;

        let (cue, countdown) = active_cue(cues, 1.2).unwrap();
        assert_eq!(cue.text, "Rate 20");
        assert_eq!(countdown, 4);

        let (cue, _) = active_cue(cues, 5.0).unwrap();
        assert_eq!(cue.text, "Rate 24");

        assert!(active_cue(cues, 31.0).is_none());
    }

    #[test]
    fn projects_current_and_next_tempo() {
        let (program, tracks) = program();

        let info = project(&program, &tracks, 0, 0.5, 179.5, 0.5 / 180.0).unwrap();
        assert_eq!(info.training_name, "intervals");
        assert_eq!(info.song_name, "warmup");
        assert_eq!(info.intro_countdown, 5);
        assert_eq!(info.display_text, "Rate 20");
        assert_eq!(info.display_countdown, 5);
        assert_eq!(info.current_tempo, 60.0);
        assert_eq!(info.next_tempo, 150.0);

        let last = project(&program, &tracks, 1, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(last.next_tempo, 0.0);
        assert_eq!(last.display_text, "");
    }

    #[test]
    fn out_of_range_cursor_projects_nothing() {
        let (program, tracks) = program();
        assert!(project(&program, &tracks, 2, 0.0, 0.0, 0.0).is_none());
    }

    #[test]
    fn negative_offset_is_clamped() {
        let (program, tracks) = program();
        let info = project(&program, &tracks, 0, -0.004, 180.0, 0.0).unwrap();
        assert_eq!(info.beat, 1);
        assert_eq!(info.intro_countdown, 7);
    }

    #[test]
    fn remaining_label_rolls_over() {
        let mut info = DisplayInfo::placeholder(&SchedulerConfig::default());

        info.remaining = 125.2;
        assert_eq!(info.remaining_label(), "2:06");

        info.remaining = 59.5;
        assert_eq!(info.remaining_label(), "1:00");

        info.remaining = 0.0;
        assert_eq!(info.remaining_label(), "0:00");
    }

    #[test]
    fn labels_hide_when_idle() {
        let mut info = DisplayInfo::placeholder(&SchedulerConfig::default());
        assert!(info.intro_label().is_none());
        assert!(info.instruction_label().is_none());

        info.display_text = "Rate 20".to_string();
        info.display_countdown = 3;
        assert_eq!(info.instruction_label().as_deref(), Some("Rate 20 - 3"));
    }
}
