//! Shared fixtures for scheduler tests

#![allow(dead_code)]

use async_trait::async_trait;
use pacer_core::{AssetLoader, PlayableProgram, Track, TrackInstance, TrackStore};
use pacer_playback::{
    silent_wav, BackendCall, ChannelNotifier, Notification, Scheduler, SchedulerConfig,
    SimulatedBackend,
};
use pacer_storage::{MemoryAssetLoader, MemoryTrackStore};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Clock value at which every fixture starts
pub const CLOCK_START: f64 = 5.0;

/// Sample rate for generated assets; low enough to keep fixtures small
pub const SAMPLE_RATE: u32 = 100;

/// (name, tempo, duration in seconds)
pub const LIBRARY: &[(&str, f64, f64)] = &[
    ("warmup", 120.0, 180.0),
    ("sprint", 150.0, 180.0),
    ("cooldown", 90.0, 120.0),
];

pub struct Fixture {
    pub scheduler: Scheduler,
    pub backend: SimulatedBackend,
    pub store: Arc<MemoryTrackStore>,
    pub assets: Arc<GatedAssets>,
    pub notes: mpsc::UnboundedReceiver<Notification>,
}

impl Fixture {
    /// Move the clock to `secs` past the fixture start
    pub fn at(&self, secs: f64) {
        self.backend.set_time(CLOCK_START + secs);
    }

    pub fn drain_notes(&mut self) -> Vec<Notification> {
        let mut notes = Vec::new();
        while let Ok(note) = self.notes.try_recv() {
            notes.push(note);
        }
        notes
    }

    /// Start commands as (buffer, at, offset)
    pub fn starts(&self) -> Vec<(u64, f64, f64)> {
        self.backend
            .starts()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Start { buffer, at, offset } => Some((buffer, at, offset)),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> Vec<u64> {
        self.backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Stop { buffer } => Some(buffer),
                _ => None,
            })
            .collect()
    }

    pub fn gains(&self) -> Vec<(f32, f64)> {
        self.backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Gain { gain, at } => Some((gain, at)),
                _ => None,
            })
            .collect()
    }
}

/// Asset loader whose reads of selected paths wait for a permit
pub struct GatedAssets {
    inner: MemoryAssetLoader,
    gated: HashSet<String>,
    gate: Semaphore,
}

impl GatedAssets {
    pub fn new(inner: MemoryAssetLoader) -> Self {
        Self {
            inner,
            gated: HashSet::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn gate(mut self, path: &str) -> Self {
        self.gated.insert(path.to_string());
        self
    }

    /// Let one gated read through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl AssetLoader for GatedAssets {
    async fn import_asset(&self, bytes: Vec<u8>, name: &str) -> pacer_core::Result<()> {
        self.inner.import_asset(bytes, name).await
    }

    async fn load_asset(&self, path: &str) -> pacer_core::Result<Option<Vec<u8>>> {
        if self.gated.contains(path) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
        self.inner.load_asset(path).await
    }

    async fn delete_asset(&self, path: &str) -> pacer_core::Result<()> {
        self.inner.delete_asset(path).await
    }

    async fn list_asset_names(&self) -> pacer_core::Result<Vec<String>> {
        self.inner.list_asset_names().await
    }
}

pub fn program(name: &str, songs: &[&str]) -> PlayableProgram {
    PlayableProgram::new(
        name,
        songs.iter().map(|song| TrackInstance::new(*song)).collect(),
    )
}

/// Store and assets for [`LIBRARY`], without assets for `missing`
pub async fn library(missing: &[&str]) -> (MemoryTrackStore, MemoryAssetLoader) {
    let store = MemoryTrackStore::new();
    let assets = MemoryAssetLoader::new();
    for (name, tempo, duration) in LIBRARY {
        let path = format!("{name}.wav");
        store
            .put_track(Track::new(*name, &path, *tempo).with_duration(*duration))
            .await
            .unwrap();
        if !missing.contains(name) {
            assets
                .import_asset(silent_wav(*duration, SAMPLE_RATE).unwrap(), &path)
                .await
                .unwrap();
        }
    }
    (store, assets)
}

pub fn build(store: MemoryTrackStore, assets: GatedAssets) -> Fixture {
    let backend = SimulatedBackend::starting_at(CLOCK_START);
    let (notifier, notes) = ChannelNotifier::channel();
    let store = Arc::new(store);
    let assets = Arc::new(assets);
    let scheduler = Scheduler::new(
        store.clone(),
        assets.clone(),
        Arc::new(backend.clone()),
        Arc::new(notifier),
        SchedulerConfig::default(),
    )
    .unwrap();

    Fixture {
        scheduler,
        backend,
        store,
        assets,
        notes,
    }
}

/// Scheduler over the full library with `songs` chosen
pub async fn fixture(songs: &[&str]) -> Fixture {
    let (store, assets) = library(&[]).await;
    let fixture = build(store, GatedAssets::new(assets));
    fixture
        .scheduler
        .choose_program(program("session", songs))
        .await
        .unwrap();
    fixture
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
