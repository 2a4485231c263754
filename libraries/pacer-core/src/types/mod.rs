mod program;
mod track;

pub use program::{PlayableProgram, Program, ProgramEntry, ProgramInstance, TrackInstance};
pub use track::{Cue, Track};
