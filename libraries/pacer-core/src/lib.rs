//! Pacer Core
//!
//! Platform-agnostic program model, validation and storage traits for Pacer.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Cue`, `TrackInstance`, `Program`, `PlayableProgram`
//! - **Validation**: structural checks for untrusted documents
//! - **Flattening**: expansion of nested programs into playable form
//! - **Storage Traits**: `TrackStore`, `AssetLoader`
//! - **Error Handling**: Unified `PacerError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use pacer_core::{flatten, Program, ProgramInstance, TrackInstance};
//!
//! let block = Program::new("block").with_entry(TrackInstance::new("sprint"));
//! let session = Program::new("session")
//!     .with_entry(TrackInstance::new("warmup").with_volume(0.8))
//!     .with_entry(ProgramInstance::new("block"));
//!
//! let playable = flatten(&session, |name| {
//!     Ok((name == "block").then(|| block.clone()))
//! })
//! .unwrap();
//! assert_eq!(playable.content.len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod flatten;
pub mod storage;
pub mod types;
pub mod validation;

pub use error::{PacerError, Result};
pub use flatten::{collect_programs, collect_programs_from_store, flatten, flatten_with_store};
pub use storage::{AssetLoader, TrackStore};
pub use types::{Cue, PlayableProgram, Program, ProgramEntry, ProgramInstance, Track, TrackInstance};
pub use validation::{
    parse_program, validate_playable, validate_program, validate_track, Validate,
};
