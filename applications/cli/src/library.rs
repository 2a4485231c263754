//! On-disk library: one JSON document plus an asset directory
//!
//! The document uses the export format, so a library directory can be
//! handed to `import` unchanged.

use crate::config::LibrarySettings;
use crate::error::Result;
use pacer_core::{AssetLoader, Program, Track, TrackStore, Validate};
use pacer_storage::{ExportBundle, ExportDocument, FsAssetLoader, ImportSummary, MemoryTrackStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

pub struct Library {
    document_path: PathBuf,
    pub store: Arc<MemoryTrackStore>,
    pub assets: Arc<FsAssetLoader>,
}

impl Library {
    /// Open the library, starting empty when the document does not exist yet
    pub async fn open(settings: &LibrarySettings) -> Result<Self> {
        let assets = FsAssetLoader::new(&settings.asset_dir);
        assets.initialize().await?;

        let store = MemoryTrackStore::new();
        match fs::read_to_string(&settings.document).await {
            Ok(text) => {
                let document = ExportDocument::from_json(&text)?;
                document.load_into(&store).await?;
                tracing::debug!(
                    tracks = document.tracks.len(),
                    programs = document.programs.len(),
                    "Library loaded"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No library document at {:?}, starting empty", settings.document);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            document_path: settings.document.clone(),
            store: Arc::new(store),
            assets: Arc::new(assets),
        })
    }

    /// Write the current records back to the library document
    pub async fn save(&self) -> Result<()> {
        let document = ExportDocument::from_store(self.store.as_ref()).await?;
        if let Some(parent) = self.document_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.document_path, serde_json::to_vec_pretty(&document)?).await?;
        Ok(())
    }

    /// Copy an audio file into the asset directory and register its track
    pub async fn add_track(&self, source: &Path, track: Track) -> Result<()> {
        track.validate()?;
        let bytes = fs::read(source).await?;
        self.assets.import_asset(bytes, &track.path).await?;
        tracing::info!(track = %track.name, tempo = track.tempo, "Track added");
        self.store.put_track(track).await?;
        self.save().await
    }

    pub async fn add_program(&self, program: Program) -> Result<()> {
        program.validate()?;
        tracing::info!(program = %program.name, "Program added");
        self.store.put_program(program).await?;
        self.save().await
    }

    /// Write the named programs and everything they reference to a zip archive
    pub async fn export(&self, archive: &Path, program_names: &[&str]) -> Result<ExportBundle> {
        let bundle =
            ExportBundle::build(self.store.as_ref(), self.assets.as_ref(), program_names).await?;
        bundle.write_to_file(archive).await?;
        Ok(bundle)
    }

    pub async fn import(&self, archive: &Path) -> Result<ImportSummary> {
        let bundle = ExportBundle::read_from_file(archive).await?;
        let summary = bundle
            .import_into(self.store.as_ref(), self.assets.as_ref())
            .await?;
        self.save().await?;
        Ok(summary)
    }
}
