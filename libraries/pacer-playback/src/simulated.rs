//! Simulated audio backend
//!
//! Decodes WAV headers with `hound` to learn buffer durations, runs on a
//! virtual clock that only moves when told to, and records every command it
//! receives. Used for headless runs and for exercising the scheduler.

use crate::backend::{AudioBackend, DecodedBuffer, PlayableNode};
use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A command received by the simulated backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Start { buffer: u64, at: f64, offset: f64 },
    Stop { buffer: u64 },
    Gain { gain: f32, at: f64 },
}

#[derive(Debug, Default)]
struct Shared {
    now: f64,
    calls: Vec<BackendCall>,
    next_id: u64,
}

/// Backend with a manually advanced clock
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    shared: Arc<Mutex<Shared>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `now` instead of zero
    pub fn starting_at(now: f64) -> Self {
        let backend = Self::new();
        backend.set_time(now);
        backend
    }

    /// Move the clock forward by `secs`
    pub fn advance(&self, secs: f64) {
        self.shared().now += secs;
    }

    pub fn set_time(&self, now: f64) {
        self.shared().now = now;
    }

    /// Every command received so far, oldest first
    pub fn calls(&self) -> Vec<BackendCall> {
        self.shared().calls.clone()
    }

    /// Only the node start commands
    pub fn starts(&self) -> Vec<BackendCall> {
        self.shared()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Start { .. }))
            .cloned()
            .collect()
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AudioBackend for SimulatedBackend {
    async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedBuffer> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| PlaybackError::decode(format!("not a WAV stream: {e}")))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(PlaybackError::decode("sample rate is zero"));
        }

        let duration = f64::from(reader.duration()) / f64::from(spec.sample_rate);
        if duration <= 0.0 {
            return Err(PlaybackError::decode("decoded audio is empty"));
        }

        let mut shared = self.shared();
        shared.next_id += 1;
        Ok(DecodedBuffer::new(shared.next_id, duration))
    }

    fn create_node(&self, buffer: &DecodedBuffer) -> Box<dyn PlayableNode> {
        Box::new(SimulatedNode {
            buffer: buffer.id(),
            shared: Arc::clone(&self.shared),
            started: false,
        })
    }

    fn set_gain_at(&self, gain: f32, at: f64) {
        self.shared().calls.push(BackendCall::Gain { gain, at });
    }

    fn now(&self) -> f64 {
        self.shared().now
    }
}

struct SimulatedNode {
    buffer: u64,
    shared: Arc<Mutex<Shared>>,
    started: bool,
}

impl SimulatedNode {
    fn record(&self, call: BackendCall) {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .push(call);
    }
}

impl PlayableNode for SimulatedNode {
    fn start(&mut self, at: f64, offset: f64) {
        self.started = true;
        self.record(BackendCall::Start {
            buffer: self.buffer,
            at,
            offset,
        });
    }

    fn stop(&mut self) {
        if self.started {
            self.started = false;
            self.record(BackendCall::Stop {
                buffer: self.buffer,
            });
        }
    }
}

/// Encode `duration_secs` of 16-bit mono silence as a WAV file
pub fn silent_wav(duration_secs: f64, sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = (duration_secs * f64::from(sample_rate)).round() as u64;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| PlaybackError::decode(format!("failed to write WAV header: {e}")))?;
        for _ in 0..frames {
            writer
                .write_sample(0i16)
                .map_err(|e| PlaybackError::decode(format!("failed to write sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| PlaybackError::decode(format!("failed to finalize WAV: {e}")))?;
    }
    Ok(cursor.into_inner())
}
