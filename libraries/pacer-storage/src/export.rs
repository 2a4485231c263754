//! Bulk export and import of programs with their audio assets
//!
//! A bundle is a zip archive with one metadata document (`training.json`)
//! holding `{ "programs": [...], "tracks": [...] }` plus one raw asset per
//! referenced track, stored under the track's storage path.

use pacer_core::{
    collect_programs_from_store, validate_program, validate_track, AssetLoader, PacerError,
    Program, ProgramEntry, Result, Track, TrackStore, Validate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tokio::fs;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the metadata document inside a bundle
pub const METADATA_FILE: &str = "training.json";

/// Metadata document of a bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub programs: Vec<Program>,
    pub tracks: Vec<Track>,
}

#[derive(Deserialize)]
struct RawDocument {
    programs: Vec<Value>,
    tracks: Vec<Value>,
}

impl ExportDocument {
    /// Parse an untrusted document, validating every record
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(text)
            .map_err(|e| PacerError::validation(format!("not a valid document: {e}")))?;

        Ok(Self {
            programs: raw
                .programs
                .iter()
                .map(validate_program)
                .collect::<Result<_>>()?,
            tracks: raw.tracks.iter().map(validate_track).collect::<Result<_>>()?,
        })
    }

    /// Snapshot every record held by `store`
    pub async fn from_store(store: &dyn TrackStore) -> Result<Self> {
        Ok(Self {
            programs: store.list_programs().await?,
            tracks: store.list_tracks().await?,
        })
    }

    /// Write every record into `store` without cross-reference checks
    pub async fn load_into(&self, store: &dyn TrackStore) -> Result<()> {
        for track in &self.tracks {
            store.put_track(track.clone()).await?;
        }
        for program in &self.programs {
            store.put_program(program.clone()).await?;
        }
        Ok(())
    }
}

/// Counts of records written by [`ExportBundle::import_into`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub programs: usize,
    pub tracks: usize,
    pub assets: usize,
}

/// Programs, tracks and raw assets ready to be archived or imported
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub document: ExportDocument,
    /// Raw asset bytes keyed by storage path
    pub assets: BTreeMap<String, Vec<u8>>,
}

/// Asset paths may not shadow the metadata document inside the archive
fn check_asset_path(track: &Track) -> Result<()> {
    if track.path == METADATA_FILE {
        return Err(PacerError::validation(format!(
            "track '{}' uses the reserved path '{METADATA_FILE}'",
            track.name
        )));
    }
    Ok(())
}

fn archive_error(err: ZipError) -> PacerError {
    match err {
        ZipError::FileNotFound => PacerError::not_found("Archive entry", METADATA_FILE),
        ZipError::Io(e) => PacerError::Io(e),
        other => PacerError::invalid_input(format!("not a valid archive: {other}")),
    }
}

/// Track names referenced by a program, including its pause track
fn referenced_tracks(program: &Program) -> impl Iterator<Item = &str> {
    program
        .content
        .iter()
        .filter_map(|entry| match entry {
            ProgramEntry::Track(instance) => Some(instance.song_name.as_str()),
            ProgramEntry::Program(_) => None,
        })
        .chain(program.pause_song.as_deref())
}

impl ExportBundle {
    /// Gather the named programs and everything they transitively reference
    pub async fn build(
        store: &dyn TrackStore,
        assets: &dyn AssetLoader,
        program_names: &[&str],
    ) -> Result<Self> {
        let mut bundle = Self::default();
        let mut seen_programs = HashSet::new();
        let mut seen_tracks = HashSet::new();

        for name in program_names {
            let root = store.require_program(name).await?;
            for program in collect_programs_from_store(store, &root).await? {
                if seen_programs.insert(program.name.clone()) {
                    bundle.document.programs.push(program);
                }
            }
        }

        for program in &bundle.document.programs {
            for track_name in referenced_tracks(program) {
                if seen_tracks.insert(track_name.to_string()) {
                    let track = store.require_track(track_name).await?;
                    check_asset_path(&track)?;
                    bundle.document.tracks.push(track);
                }
            }
        }

        for track in &bundle.document.tracks {
            if !bundle.assets.contains_key(&track.path) {
                let bytes = assets.require_asset(&track.path).await?;
                bundle.assets.insert(track.path.clone(), bytes);
            }
        }

        tracing::info!(
            programs = bundle.document.programs.len(),
            tracks = bundle.document.tracks.len(),
            "export bundle assembled"
        );
        Ok(bundle)
    }

    /// Encode the bundle as a zip archive
    pub fn to_archive(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer
            .start_file(METADATA_FILE, options)
            .map_err(archive_error)?;
        writer.write_all(&serde_json::to_vec_pretty(&self.document)?)?;

        for (path, bytes) in &self.assets {
            writer.start_file(path.as_str(), options).map_err(archive_error)?;
            writer.write_all(bytes)?;
        }

        Ok(writer.finish().map_err(archive_error)?.into_inner())
    }

    /// Decode and validate an archive produced by [`Self::to_archive`]
    ///
    /// Only the assets referenced by the document's tracks are read.
    pub fn from_archive(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_error)?;

        let mut text = String::new();
        archive
            .by_name(METADATA_FILE)
            .map_err(archive_error)?
            .read_to_string(&mut text)?;
        let document = ExportDocument::from_json(&text)?;

        let mut assets = BTreeMap::new();
        for track in &document.tracks {
            check_asset_path(track)?;
            if assets.contains_key(&track.path) {
                continue;
            }
            let mut entry = match archive.by_name(&track.path) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => {
                    return Err(PacerError::not_found("Asset", &track.path));
                }
                Err(e) => return Err(archive_error(e)),
            };
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            assets.insert(track.path.clone(), data);
        }

        Ok(Self { document, assets })
    }

    /// Write the archive to `path`, creating parent directories
    pub async fn write_to_file(&self, path: &Path) -> Result<()> {
        let archive = self.to_archive()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, archive).await?;
        tracing::debug!(path = %path.display(), assets = self.assets.len(), "bundle written");
        Ok(())
    }

    /// Read an archive written by [`Self::write_to_file`]
    pub async fn read_from_file(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PacerError::not_found("Bundle", path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_archive(&bytes)
    }

    /// Check every record and cross-reference before anything is written
    pub fn validate(&self) -> Result<()> {
        let track_names: HashSet<&str> =
            self.document.tracks.iter().map(|t| t.name.as_str()).collect();

        for track in &self.document.tracks {
            track.validate()?;
            check_asset_path(track)?;
            if !self.assets.contains_key(&track.path) {
                return Err(PacerError::not_found("Asset", &track.path));
            }
        }
        for program in &self.document.programs {
            program.validate()?;
            if let Some(missing) = referenced_tracks(program).find(|n| !track_names.contains(n)) {
                return Err(PacerError::validation(format!(
                    "program '{}' references track '{missing}' missing from the bundle",
                    program.name
                )));
            }
        }
        Ok(())
    }

    /// Validate, then write every record and asset into the given stores
    pub async fn import_into(
        &self,
        store: &dyn TrackStore,
        assets: &dyn AssetLoader,
    ) -> Result<ImportSummary> {
        self.validate()?;

        for (path, bytes) in &self.assets {
            assets.import_asset(bytes.clone(), path).await?;
        }
        self.document.load_into(store).await?;

        let summary = ImportSummary {
            programs: self.document.programs.len(),
            tracks: self.document.tracks.len(),
            assets: self.assets.len(),
        };
        tracing::info!(?summary, "bundle imported");
        Ok(summary)
    }
}
