//! Pacer Storage
//!
//! Reference implementations of the storage collaborators the playback
//! engine consumes.
//!
//! # Architecture
//!
//! - **Metadata**: `MemoryTrackStore` implements `TrackStore`
//! - **Assets**: `MemoryAssetLoader` and `FsAssetLoader` implement `AssetLoader`
//! - **Bulk export**: `ExportBundle` archives programs with every sub-program,
//!   track and raw asset they reference
//!
//! # Example
//!
//! ```rust,no_run
//! use pacer_core::{Program, Track, TrackInstance, TrackStore};
//! use pacer_storage::{ExportBundle, FsAssetLoader, MemoryTrackStore};
//!
//! # async fn example() -> pacer_core::Result<()> {
//! let store = MemoryTrackStore::new();
//! store.put_track(Track::new("warmup", "warmup.wav", 120.0)).await?;
//! store
//!     .put_program(Program::new("session").with_entry(TrackInstance::new("warmup")))
//!     .await?;
//!
//! let assets = FsAssetLoader::new("/var/lib/pacer/assets");
//! let bundle = ExportBundle::build(&store, &assets, &["session"]).await?;
//! bundle.write_to_file(std::path::Path::new("/tmp/session.zip")).await?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod export;
pub mod memory;

pub use assets::{FsAssetLoader, MemoryAssetLoader};
pub use export::{ExportBundle, ExportDocument, ImportSummary, METADATA_FILE};
pub use memory::MemoryTrackStore;
