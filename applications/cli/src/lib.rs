//! Pacer CLI Library
//!
//! Library management, bulk export/import and headless simulated playback
//! behind the `pacer` binary.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod library;
pub mod simulate;

pub use config::{CliConfig, LibrarySettings};
pub use error::{CliError, Result};
pub use library::Library;
pub use simulate::SimulationSummary;
