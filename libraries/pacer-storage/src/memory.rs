/// In-memory track and program store
use async_trait::async_trait;
use pacer_core::{Program, Result, Track, TrackStore};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// `TrackStore` backed by ordered maps keyed by name
///
/// Listing order is by name, which keeps exports and CLI output stable.
#[derive(Debug, Default)]
pub struct MemoryTrackStore {
    tracks: RwLock<BTreeMap<String, Track>>,
    programs: RwLock<BTreeMap<String, Program>>,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given records
    pub fn with_records(tracks: Vec<Track>, programs: Vec<Program>) -> Self {
        Self {
            tracks: RwLock::new(tracks.into_iter().map(|t| (t.name.clone(), t)).collect()),
            programs: RwLock::new(programs.into_iter().map(|p| (p.name.clone(), p)).collect()),
        }
    }
}

#[async_trait]
impl TrackStore for MemoryTrackStore {
    async fn get_track(&self, name: &str) -> Result<Option<Track>> {
        Ok(self.tracks.read().await.get(name).cloned())
    }

    async fn put_track(&self, track: Track) -> Result<()> {
        tracing::debug!(track = %track.name, "storing track");
        self.tracks.write().await.insert(track.name.clone(), track);
        Ok(())
    }

    async fn delete_track(&self, name: &str) -> Result<()> {
        self.tracks.write().await.remove(name);
        Ok(())
    }

    async fn list_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.tracks.read().await.values().cloned().collect())
    }

    async fn get_program(&self, name: &str) -> Result<Option<Program>> {
        Ok(self.programs.read().await.get(name).cloned())
    }

    async fn put_program(&self, program: Program) -> Result<()> {
        tracing::debug!(program = %program.name, "storing program");
        self.programs
            .write()
            .await
            .insert(program.name.clone(), program);
        Ok(())
    }

    async fn delete_program(&self, name: &str) -> Result<()> {
        self.programs.write().await.remove(name);
        Ok(())
    }

    async fn list_programs(&self) -> Result<Vec<Program>> {
        Ok(self.programs.read().await.values().cloned().collect())
    }
}
