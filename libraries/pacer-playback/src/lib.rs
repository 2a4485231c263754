//! Pacer Playback
//!
//! Gapless sequential playback of training programs.
//!
//! This crate provides:
//! - A scheduler that commits each next track against the audio clock before
//!   the current one ends
//! - Pause/resume that keeps the elapsed offset
//! - Skip forward and back across program entries
//! - A pure render projection (beat, intro countdown, active cue, tempos)
//! - A simulated backend with a virtual clock
//!
//! # Architecture
//!
//! `pacer-playback` does not know about any audio device or storage engine.
//! Metadata comes from a [`pacer_core::TrackStore`], raw bytes from a
//! [`pacer_core::AssetLoader`] and sound from an [`AudioBackend`].
//! Recoverable load failures go to a [`Notifier`].
//!
//! # Example
//!
//! ```rust,no_run
//! use pacer_core::{AssetLoader, PlayableProgram, Track, TrackInstance, TrackStore};
//! use pacer_playback::{silent_wav, Scheduler, SchedulerConfig, SimulatedBackend, TracingNotifier};
//! use pacer_storage::{MemoryAssetLoader, MemoryTrackStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> pacer_playback::Result<()> {
//! let store = MemoryTrackStore::new();
//! store.put_track(Track::new("warmup", "warmup.wav", 120.0)).await?;
//!
//! let assets = MemoryAssetLoader::new();
//! assets.import_asset(silent_wav(180.0, 100)?, "warmup.wav").await?;
//!
//! let backend = SimulatedBackend::new();
//! let scheduler = Scheduler::new(
//!     Arc::new(store),
//!     Arc::new(assets),
//!     Arc::new(backend.clone()),
//!     Arc::new(TracingNotifier),
//!     SchedulerConfig::default(),
//! )?;
//!
//! let program = PlayableProgram::new("easy", vec![TrackInstance::new("warmup")]);
//! scheduler.choose_program(program).await?;
//! scheduler.play().await?;
//!
//! backend.advance(30.0);
//! let frame = scheduler.tick();
//! println!("{} {} beat {}", frame.song_name, frame.remaining_label(), frame.beat);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod notify;
pub mod render;
pub mod scheduler;
pub mod simulated;
pub mod types;

pub use backend::{AudioBackend, DecodedBuffer, PlayableNode};
pub use error::{PlaybackError, Result};
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use render::DisplayInfo;
pub use scheduler::Scheduler;
pub use simulated::{silent_wav, BackendCall, SimulatedBackend};
pub use types::{CommandOutcome, PlaybackState, SchedulerConfig, SkipReason};
