//! Gapless playback scheduler
//!
//! Owns the cursor into a [`PlayableProgram`], the current and next decoded
//! buffers and the timing state that ties them to the backend clock.
//!
//! The `busy` flag serializes every load. Commands that find it set, or
//! whose other preconditions fail, return [`CommandOutcome::Skipped`] and
//! leave state untouched. State sits behind a synchronous mutex that is never
//! held across an `.await`.

use crate::backend::{AudioBackend, DecodedBuffer, PlayableNode};
use crate::error::Result;
use crate::notify::Notifier;
use crate::render::{self, DisplayInfo};
use crate::types::{CommandOutcome, PlaybackState, SchedulerConfig, SkipReason};
use pacer_core::{flatten_with_store, AssetLoader, PlayableProgram, Track, TrackStore, Validate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Handle to the playback scheduler
///
/// Cloning is cheap; all clones drive the same state.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SchedulerState>,
    preload: Mutex<Option<JoinHandle<()>>>,
    store: Arc<dyn TrackStore>,
    assets: Arc<dyn AssetLoader>,
    backend: Arc<dyn AudioBackend>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
}

/// Chosen program with the metadata of every entry
struct Session {
    program: PlayableProgram,
    tracks: Vec<Track>,
}

/// A decoded buffer for one entry and the node playing it, if any
struct Slot {
    index: usize,
    buffer: DecodedBuffer,
    node: Option<Box<dyn PlayableNode>>,
}

impl Slot {
    fn new(index: usize, buffer: DecodedBuffer) -> Self {
        Self {
            index,
            buffer,
            node: None,
        }
    }

    fn start(&mut self, backend: &dyn AudioBackend, at: f64, offset: f64) {
        let mut node = backend.create_node(&self.buffer);
        node.start(at, offset);
        self.node = Some(node);
    }

    fn stop(&mut self) {
        if let Some(mut node) = self.node.take() {
            node.stop();
        }
    }
}

/// Next-track load issued by a boundary shift
#[derive(Debug, Clone)]
struct PreloadRequest {
    generation: u64,
    index: usize,
    song_name: String,
    path: String,
}

#[derive(Default)]
struct SchedulerState {
    session: Option<Session>,
    busy: bool,
    playing: bool,
    cursor: usize,
    song_offset: f64,
    start_time: f64,
    next_start_time: f64,
    next_scheduled: bool,
    current: Option<Slot>,
    next: Option<Slot>,

    /// Bumped whenever cursor and timing state are zeroed
    generation: u64,
}

impl SchedulerState {
    fn volume_at(&self, index: usize) -> f32 {
        self.session
            .as_ref()
            .and_then(|session| session.program.get(index))
            .map_or(1.0, |instance| instance.volume)
    }

    fn program_len(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.program.len())
    }

    fn stop_nodes(&mut self) {
        if let Some(slot) = self.current.as_mut() {
            slot.stop();
        }
        if let Some(slot) = self.next.as_mut() {
            slot.stop();
        }
        self.next_scheduled = false;
    }

    /// Zero cursor and timing state, keeping the chosen program
    fn clear_playback(&mut self) {
        self.stop_nodes();
        self.playing = false;
        self.cursor = 0;
        self.song_offset = 0.0;
        self.start_time = 0.0;
        self.next_start_time = 0.0;
        self.current = None;
        self.next = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Commit the next buffer to start where the current one ends
    fn schedule_next(&mut self, backend: &dyn AudioBackend) {
        if !self.playing || self.next_scheduled {
            return;
        }
        let (Some(current), Some(next)) = (self.current.as_ref(), self.next.as_ref()) else {
            return;
        };
        if next.index != current.index + 1 {
            return;
        }

        let at = self.start_time + current.buffer.duration();
        let volume = self.volume_at(next.index);
        if let Some(next) = self.next.as_mut() {
            next.start(backend, at, 0.0);
        }
        backend.set_gain_at(volume, at);
        self.next_start_time = at;
        self.next_scheduled = true;
        debug!(at, index = self.cursor + 1, "Next track scheduled");
    }

    /// Move the cursor across a track boundary
    ///
    /// Returns the preload to issue for the new successor, if any. The busy
    /// flag is left set while that preload is outstanding.
    fn shift(&mut self, now: f64) -> Option<PreloadRequest> {
        if !self.playing || self.busy || self.session.is_none() {
            return None;
        }
        let len = self.program_len();
        let mut request = None;

        if let Some(next) = self.next.take() {
            self.start_time = self.next_start_time;
            self.cursor = next.index;
            self.current = Some(next);
            self.next_scheduled = false;
            self.song_offset = (now - self.start_time).max(0.0);
            debug!(cursor = self.cursor, "Boundary shift");

            let index = self.cursor + 1;
            if let Some(session) = self.session.as_ref() {
                if let (Some(instance), Some(track)) =
                    (session.program.get(index), session.tracks.get(index))
                {
                    self.busy = true;
                    request = Some(PreloadRequest {
                        generation: self.generation,
                        index,
                        song_name: instance.song_name.clone(),
                        path: track.path.clone(),
                    });
                }
            }
        } else {
            if let Some(mut slot) = self.current.take() {
                slot.stop();
            }
            self.playing = false;
            self.cursor += 1;
            self.song_offset = 0.0;
            debug!(cursor = self.cursor, "Boundary shift without a next buffer, stopping");
        }

        if self.cursor >= len {
            self.clear_playback();
            self.cursor = len;
            info!("Program finished");
        }
        request
    }
}

impl Scheduler {
    /// Create a scheduler over its collaborators
    ///
    /// # Errors
    /// Returns `PlaybackError::InvalidConfig` when the lead window does not
    /// open before the boundary threshold.
    pub fn new(
        store: Arc<dyn TrackStore>,
        assets: Arc<dyn AssetLoader>,
        backend: Arc<dyn AudioBackend>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SchedulerState::default()),
                preload: Mutex::new(None),
                store,
                assets,
                backend,
                notifier,
                config,
            }),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Replace the program and zero all cursor and timing state
    ///
    /// Metadata for every entry is resolved up front. A missing track fails
    /// the call and keeps the previously chosen program.
    pub async fn choose_program(&self, program: PlayableProgram) -> Result<CommandOutcome> {
        program.validate()?;

        {
            let mut state = self.lock();
            if state.busy {
                return Ok(skipped("choose_program", SkipReason::Busy));
            }
            state.busy = true;
        }

        let tracks = match self.resolve_tracks(&program).await {
            Ok(tracks) => tracks,
            Err(err) => {
                self.lock().busy = false;
                error!(program = %program.name, error = %err, "Failed to load training");
                self.inner.notifier.notify(
                    &format!("Failed to load training '{}': {err}", program.name),
                    true,
                );
                return Err(err);
            }
        };

        let name = program.name.clone();
        let entries = program.len();
        {
            let mut state = self.lock();
            state.clear_playback();
            state.session = Some(Session { program, tracks });
            state.busy = false;
        }
        info!(program = %name, entries, "Program chosen");
        Ok(CommandOutcome::Applied)
    }

    /// Look up, flatten and choose a stored program
    pub async fn choose_program_by_name(&self, name: &str) -> Result<CommandOutcome> {
        let store = self.inner.store.as_ref();
        let root = store.require_program(name).await?;
        let playable = flatten_with_store(store, &root).await?;
        self.choose_program(playable).await
    }

    /// Start the track at the cursor from the stored offset
    ///
    /// The successor is loaded right after the current track starts. A
    /// failure there is reported but does not stop playback.
    pub async fn play(&self) -> Result<CommandOutcome> {
        let (index, generation, song_name, path, cached) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.playing {
                return Ok(skipped("play", SkipReason::AlreadyPlaying));
            }
            let Some(session) = state.session.as_ref() else {
                return Ok(skipped("play", SkipReason::NoProgram));
            };
            if state.busy {
                return Ok(skipped("play", SkipReason::Busy));
            }
            let index = state.cursor;
            let (Some(instance), Some(track)) =
                (session.program.get(index), session.tracks.get(index))
            else {
                return Ok(skipped("play", SkipReason::EndOfProgram));
            };
            let song_name = instance.song_name.clone();
            let path = track.path.clone();
            let cached = state.current.as_ref().is_some_and(|slot| slot.index == index);
            state.busy = true;
            (index, state.generation, song_name, path, cached)
        };

        if !cached {
            match self.load_buffer(&path).await {
                Ok(buffer) => self.lock().current = Some(Slot::new(index, buffer)),
                Err(err) => {
                    self.lock().busy = false;
                    error!(song = %song_name, error = %err, "Failed to load track");
                    self.inner
                        .notifier
                        .notify(&format!("Failed to load track '{song_name}': {err}"), true);
                    return Err(err);
                }
            }
        }

        let successor = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let backend = self.inner.backend.as_ref();
            let now = backend.now();
            state.start_time = now - state.song_offset;
            let volume = state.volume_at(index);
            if let Some(slot) = state.current.as_mut() {
                slot.start(backend, now, state.song_offset);
            }
            backend.set_gain_at(volume, now);
            state.playing = true;
            debug!(cursor = index, offset = state.song_offset, "Playing");

            let next_index = index + 1;
            let preloaded = state.next.as_ref().is_some_and(|slot| slot.index == next_index);
            state
                .session
                .as_ref()
                .filter(|_| !preloaded)
                .and_then(|session| {
                    let instance = session.program.get(next_index)?;
                    let track = session.tracks.get(next_index)?;
                    Some((next_index, instance.song_name.clone(), track.path.clone()))
                })
        };

        if let Some((next_index, next_name, next_path)) = successor {
            match self.load_buffer(&next_path).await {
                Ok(buffer) => {
                    let mut state = self.lock();
                    if state.generation == generation && state.cursor + 1 == next_index {
                        state.next = Some(Slot::new(next_index, buffer));
                    }
                }
                Err(err) => {
                    self.lock().next = None;
                    warn!(song = %next_name, error = %err, "Failed to load next track");
                    self.inner.notifier.notify(
                        &format!("Failed to load next track '{next_name}': {err}"),
                        true,
                    );
                }
            }
        }

        self.lock().busy = false;
        Ok(CommandOutcome::Applied)
    }

    /// Stop playback and keep the elapsed offset for a later `play`
    pub fn pause(&self) -> Result<CommandOutcome> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.playing {
            return Ok(skipped("pause", SkipReason::NotPlaying));
        }
        if state.busy {
            return Ok(skipped("pause", SkipReason::Busy));
        }

        state.song_offset = self.inner.backend.now() - state.start_time;
        if let Some(slot) = state.current.as_mut() {
            slot.stop();
        }
        if state.next_scheduled {
            if let Some(slot) = state.next.as_mut() {
                slot.stop();
            }
            state.next_scheduled = false;
        }
        state.playing = false;
        debug!(offset = state.song_offset, "Paused");
        Ok(CommandOutcome::Applied)
    }

    /// Rewind to the first entry of the chosen program
    pub fn reset(&self) -> Result<CommandOutcome> {
        let mut state = self.lock();
        if state.busy {
            return Ok(skipped("reset", SkipReason::Busy));
        }
        if state.session.is_none() {
            return Ok(skipped("reset", SkipReason::NoProgram));
        }
        state.clear_playback();
        debug!("Reset");
        Ok(CommandOutcome::Applied)
    }

    /// Advance timing for one render frame and project the display
    ///
    /// Must run inside a Tokio runtime when a boundary shift may need to
    /// preload a successor.
    pub fn tick(&self) -> DisplayInfo {
        let (info, request) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let backend = self.inner.backend.as_ref();
            let now = backend.now();
            let mut request = None;

            if state.playing {
                state.song_offset = now - state.start_time;
                if let Some(duration) = state.current.as_ref().map(|slot| slot.buffer.duration()) {
                    let remaining = duration - state.song_offset;
                    if remaining < self.inner.config.schedule_lead_secs {
                        state.schedule_next(backend);
                    }
                    if remaining < self.inner.config.boundary_threshold_secs {
                        request = state.shift(now);
                    }
                }
            }
            (self.project(state), request)
        };

        if let Some(request) = request {
            self.spawn_preload(request);
        }
        info
    }

    /// Cut the current track and move to the next one now
    ///
    /// Declined once the next buffer is already committed to the backend.
    /// Without a loaded next buffer playback stops and the cursor stays put.
    pub fn skip_next(&self) -> Result<CommandOutcome> {
        let request = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if !state.playing {
                return Ok(skipped("skip_next", SkipReason::NotPlaying));
            }
            if state.busy {
                return Ok(skipped("skip_next", SkipReason::Busy));
            }
            if state.next_scheduled {
                return Ok(skipped("skip_next", SkipReason::NextAlreadyScheduled));
            }

            let backend = self.inner.backend.as_ref();
            let now = backend.now();
            if let Some(slot) = state.current.as_mut() {
                slot.stop();
            }
            state.next_start_time = now;

            let successor = state.cursor + 1;
            let volume = state.volume_at(successor);
            let Some(slot) = state.next.as_mut().filter(|slot| slot.index == successor) else {
                // Nothing to hand off to; the cursor stays on the cut track
                state.song_offset = (now - state.start_time).max(0.0);
                state.playing = false;
                debug!(cursor = state.cursor, "Skip next without a next buffer, stopping");
                return Ok(CommandOutcome::Applied);
            };
            slot.start(backend, now, 0.0);
            backend.set_gain_at(volume, now);
            debug!(cursor = state.cursor, "Skip next");
            state.shift(now)
        };

        if let Some(request) = request {
            self.spawn_preload(request);
        }
        Ok(CommandOutcome::Applied)
    }

    /// Restart playback from the start of the previous entry
    pub async fn skip_previous(&self) -> Result<CommandOutcome> {
        {
            let mut state = self.lock();
            if !state.playing {
                return Ok(skipped("skip_previous", SkipReason::NotPlaying));
            }
            if state.busy {
                return Ok(skipped("skip_previous", SkipReason::Busy));
            }
            if state.cursor == 0 {
                return Ok(skipped("skip_previous", SkipReason::AtFirstTrack));
            }

            state.stop_nodes();
            state.playing = false;
            state.cursor -= 1;
            state.song_offset = 0.0;
            state.current = None;
            state.next = None;
            debug!(cursor = state.cursor, "Skip previous");
        }
        self.play().await
    }

    /// Wait for the successor load issued by the last boundary shift
    pub async fn wait_for_preload(&self) {
        let task = lock(&self.inner.preload).take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "Preload task did not complete");
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        let state = self.lock();
        match state.session.as_ref() {
            None => PlaybackState::Empty,
            Some(_) if state.playing => PlaybackState::Playing,
            Some(session) if state.cursor >= session.program.len() => PlaybackState::Finished,
            Some(_) => PlaybackState::Stopped,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// Elapsed seconds in the current track as of the last tick or pause
    pub fn song_offset(&self) -> f64 {
        self.lock().song_offset
    }

    pub fn program_name(&self) -> Option<String> {
        self.lock()
            .session
            .as_ref()
            .map(|session| session.program.name.clone())
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        lock(&self.inner.state)
    }

    fn project(&self, state: &SchedulerState) -> DisplayInfo {
        let placeholder = || DisplayInfo::placeholder(&self.inner.config);
        let Some(session) = state.session.as_ref() else {
            return placeholder();
        };

        let offset = state.song_offset.max(0.0);
        let (remaining, completion) = match state.current.as_ref() {
            Some(slot) if slot.index == state.cursor && slot.buffer.duration() > 0.0 => {
                let duration = slot.buffer.duration();
                ((duration - offset).max(0.0), (offset / duration).min(1.0))
            }
            _ => (0.0, 0.0),
        };

        render::project(
            &session.program,
            &session.tracks,
            state.cursor,
            offset,
            remaining,
            completion,
        )
        .unwrap_or_else(placeholder)
    }

    async fn resolve_tracks(&self, program: &PlayableProgram) -> Result<Vec<Track>> {
        let mut resolved: HashMap<&str, Track> = HashMap::new();
        let mut tracks = Vec::with_capacity(program.len());
        for instance in &program.content {
            let name = instance.song_name.as_str();
            if let Some(track) = resolved.get(name) {
                tracks.push(track.clone());
                continue;
            }
            let track = self.inner.store.require_track(name).await?;
            resolved.insert(name, track.clone());
            tracks.push(track);
        }
        Ok(tracks)
    }

    async fn load_buffer(&self, path: &str) -> Result<DecodedBuffer> {
        let bytes = self.inner.assets.require_asset(path).await?;
        self.inner.backend.decode(bytes).await
    }

    fn spawn_preload(&self, request: PreloadRequest) {
        match Handle::try_current() {
            Ok(handle) => {
                let scheduler = self.clone();
                let task = handle.spawn(async move { scheduler.run_preload(request).await });
                *lock(&self.inner.preload) = Some(task);
            }
            Err(_) => {
                self.lock().busy = false;
                warn!(song = %request.song_name, "No async runtime, next track not preloaded");
                self.inner.notifier.notify(
                    &format!("Failed to load next track '{}': no async runtime", request.song_name),
                    true,
                );
            }
        }
    }

    async fn run_preload(&self, request: PreloadRequest) {
        let loaded = self.load_buffer(&request.path).await;

        let failure = {
            let mut state = self.lock();
            if state.generation != request.generation || state.cursor + 1 != request.index {
                debug!(index = request.index, "Discarding stale preload");
                return;
            }
            state.busy = false;
            match loaded {
                Ok(buffer) => {
                    state.next = Some(Slot::new(request.index, buffer));
                    debug!(index = request.index, "Preload installed");
                    None
                }
                Err(err) => {
                    state.next = None;
                    Some(err)
                }
            }
        };

        if let Some(err) = failure {
            warn!(song = %request.song_name, error = %err, "Failed to load next track");
            self.inner.notifier.notify(
                &format!("Failed to load next track '{}': {err}", request.song_name),
                true,
            );
        }
    }
}

fn skipped(command: &'static str, reason: SkipReason) -> CommandOutcome {
    trace!(command, ?reason, "Command skipped");
    CommandOutcome::Skipped(reason)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
