//! Storage traits for track metadata, programs and raw audio assets
//!
//! Lookups return `Ok(None)` on a miss so a missing record never looks like
//! a failing store.

use crate::error::{PacerError, Result};
use crate::types::{Program, Track};
use async_trait::async_trait;

/// Persistent store of track and program metadata
#[async_trait]
pub trait TrackStore: Send + Sync {
    // ========================================================================
    // Tracks
    // ========================================================================

    /// Get track by name
    async fn get_track(&self, name: &str) -> Result<Option<Track>>;

    /// Insert or replace a track
    async fn put_track(&self, track: Track) -> Result<()>;

    /// Delete a track (no-op if absent)
    async fn delete_track(&self, name: &str) -> Result<()>;

    /// Get all tracks
    async fn list_tracks(&self) -> Result<Vec<Track>>;

    /// Get tracks with exactly the given tempo
    async fn list_tracks_by_tempo(&self, tempo: f64) -> Result<Vec<Track>> {
        let tracks = self.list_tracks().await?;
        Ok(tracks.into_iter().filter(|t| t.tempo == tempo).collect())
    }

    /// Get tracks with an intro, optionally refined by tempo
    async fn list_intro_tracks(&self, tempo: Option<f64>) -> Result<Vec<Track>> {
        let tracks = self.list_tracks().await?;
        Ok(tracks
            .into_iter()
            .filter(|t| t.has_intro())
            .filter(|t| tempo.map_or(true, |tempo| t.tempo == tempo))
            .collect())
    }

    /// Get track by name, treating a miss as `NotFound`
    async fn require_track(&self, name: &str) -> Result<Track> {
        self.get_track(name)
            .await?
            .ok_or_else(|| PacerError::not_found("Track", name))
    }

    // ========================================================================
    // Programs
    // ========================================================================

    /// Get program by name
    async fn get_program(&self, name: &str) -> Result<Option<Program>>;

    /// Insert or replace a program
    async fn put_program(&self, program: Program) -> Result<()>;

    /// Delete a program (no-op if absent)
    async fn delete_program(&self, name: &str) -> Result<()>;

    /// Get all programs
    async fn list_programs(&self) -> Result<Vec<Program>>;

    /// Get program by name, treating a miss as `NotFound`
    async fn require_program(&self, name: &str) -> Result<Program> {
        self.get_program(name)
            .await?
            .ok_or_else(|| PacerError::not_found("Program", name))
    }
}

/// Store of raw (undecoded) audio assets keyed by storage path
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Store raw bytes under `name`
    async fn import_asset(&self, bytes: Vec<u8>, name: &str) -> Result<()>;

    /// Load raw bytes stored at `path`
    async fn load_asset(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Delete the asset at `path` (no-op if absent)
    async fn delete_asset(&self, path: &str) -> Result<()>;

    /// Names of all stored assets
    async fn list_asset_names(&self) -> Result<Vec<String>>;

    /// Load raw bytes, treating a miss as `NotFound`
    async fn require_asset(&self, path: &str) -> Result<Vec<u8>> {
        self.load_asset(path)
            .await?
            .ok_or_else(|| PacerError::not_found("Asset", path))
    }
}
