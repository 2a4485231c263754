//! Platform audio backend traits
//!
//! The scheduler never touches samples. It decodes through the backend,
//! creates single-use nodes from decoded buffers and tells them when to
//! start against the backend's monotonic clock.

use crate::error::Result;
use async_trait::async_trait;

/// Handle to audio decoded by a backend
///
/// The samples stay inside the backend; the scheduler only needs the
/// identity and the decoded duration.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    id: u64,
    duration: f64,
}

impl DecodedBuffer {
    pub fn new(id: u64, duration_secs: f64) -> Self {
        Self {
            id,
            duration: duration_secs,
        }
    }

    /// Backend-assigned identity
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Decoded duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Single-use playback node created from a decoded buffer
pub trait PlayableNode: Send {
    /// Start at clock time `at`, `offset` seconds into the buffer
    fn start(&mut self, at: f64, offset: f64);

    /// Stop immediately; a node that never started ignores this
    fn stop(&mut self);
}

/// Platform audio backend
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Decode raw asset bytes
    ///
    /// # Returns
    /// * `Ok(buffer)` - Decoded audio with known duration
    /// * `Err(PlaybackError::Decode)` - Bytes are not playable audio
    async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedBuffer>;

    /// Create a fresh node routed through the shared gain stage
    fn create_node(&self, buffer: &DecodedBuffer) -> Box<dyn PlayableNode>;

    /// Set the shared output gain from clock time `at` onwards
    fn set_gain_at(&self, gain: f32, at: f64);

    /// Monotonic audio clock in seconds
    fn now(&self) -> f64;
}
