//! Integration tests for bulk export and import


use pacer_core::{AssetLoader, PacerError, Program, Track, TrackInstance, TrackStore};
use pacer_storage::{ExportBundle, MemoryAssetLoader, MemoryTrackStore, METADATA_FILE};
use std::io::Write;
use test_helpers::*;
use zip::write::SimpleFileOptions;

/// Archive holding only the given entries
fn archive_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_build_includes_sub_programs_once() {
    let (store, assets) = seeded_library().await;

    let bundle = ExportBundle::build(&store, &assets, &["session", "block"])
        .await
        .unwrap();

    let programs: Vec<_> = bundle.document.programs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(programs, vec!["session", "block"]);

    let tracks: Vec<_> = bundle.document.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tracks, vec!["warmup", "rest", "sprint"]);
    assert_eq!(bundle.assets.len(), 3);
    assert_eq!(bundle.assets["sprint.wav"], b"bytes of sprint".to_vec());
}

#[tokio::test]
async fn test_build_fails_on_missing_asset() {
    let (store, assets) = seeded_library().await;
    assets.delete_asset("sprint.wav").await.unwrap();

    let err = ExportBundle::build(&store, &assets, &["session"]).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_archive_round_trip_into_empty_store() {
    let (store, assets) = seeded_library().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("exports").join("session.zip");

    let bundle = ExportBundle::build(&store, &assets, &["session"]).await.unwrap();
    bundle.write_to_file(&file).await.unwrap();
    assert!(file.is_file());

    let restored = ExportBundle::read_from_file(&file).await.unwrap();
    assert_eq!(restored.document, bundle.document);
    assert_eq!(restored.assets, bundle.assets);

    let target_store = MemoryTrackStore::new();
    let target_assets = MemoryAssetLoader::new();
    let summary = restored.import_into(&target_store, &target_assets).await.unwrap();

    assert_eq!(summary.programs, 2);
    assert_eq!(summary.tracks, 3);
    assert_eq!(summary.assets, 3);
    assert_eq!(
        target_store.require_program("session").await.unwrap(),
        store.require_program("session").await.unwrap()
    );
    assert_eq!(
        target_assets.require_asset("warmup.wav").await.unwrap(),
        b"bytes of warmup".to_vec()
    );
}

#[tokio::test]
async fn test_archive_holds_metadata_and_assets() {
    let (store, assets) = seeded_library().await;
    let bundle = ExportBundle::build(&store, &assets, &["block"]).await.unwrap();

    let bytes = bundle.to_archive().unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut names: Vec<_> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["sprint.wav", METADATA_FILE]);
}

#[test]
fn test_invalid_document_is_rejected_on_read() {
    let doc = r#"{"programs": [{"Name": "x", "Content": [{"Type": "Song", "SongName": "a", "Instructions": [], "Volume": 3}]}], "tracks": []}"#;
    let bytes = archive_with(&[(METADATA_FILE, doc.as_bytes())]);

    let err = ExportBundle::from_archive(&bytes).unwrap_err();
    assert!(matches!(err, PacerError::Validation(_)));
}

#[test]
fn test_non_archive_bytes_are_invalid_input() {
    let err = ExportBundle::from_archive(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, PacerError::InvalidInput(_)));
}

#[test]
fn test_archive_missing_asset_is_not_found() {
    let doc = r#"{"programs": [], "tracks": [{"Name": "warmup", "Path": "warmup.wav", "Tempo": 120}]}"#;
    let bytes = archive_with(&[(METADATA_FILE, doc.as_bytes())]);

    let err = ExportBundle::from_archive(&bytes).unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_bundle_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExportBundle::read_from_file(&dir.path().join("none.zip"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_track_at_metadata_path_is_rejected() {
    let store = MemoryTrackStore::new();
    let assets = MemoryAssetLoader::new();
    store
        .put_track(Track::new("clash", METADATA_FILE, 120.0))
        .await
        .unwrap();
    assets.import_asset(b"audio".to_vec(), METADATA_FILE).await.unwrap();
    store
        .put_program(Program::new("session").with_entry(TrackInstance::new("clash")))
        .await
        .unwrap();

    let err = ExportBundle::build(&store, &assets, &["session"]).await.unwrap_err();
    assert!(matches!(err, PacerError::Validation(_)));

    let mut bundle = ExportBundle::default();
    bundle.document.tracks.push(Track::new("clash", METADATA_FILE, 120.0));
    bundle.assets.insert(METADATA_FILE.to_string(), b"audio".to_vec());
    let target = MemoryTrackStore::new();
    assert!(bundle.import_into(&target, &MemoryAssetLoader::new()).await.is_err());
    assert!(target.list_tracks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_writes_nothing_when_reference_is_dangling() {
    let mut bundle = ExportBundle::default();
    bundle
        .document
        .programs
        .push(Program::new("orphan").with_entry(TrackInstance::new("nowhere")));

    let store = MemoryTrackStore::new();
    let assets = MemoryAssetLoader::new();
    assert!(bundle.import_into(&store, &assets).await.is_err());
    assert!(store.list_programs().await.unwrap().is_empty());
}
