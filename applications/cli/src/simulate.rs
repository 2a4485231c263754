//! Headless playback of a stored program on the simulated backend

use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::library::Library;
use pacer_playback::{AudioBackend, ChannelNotifier, PlaybackState, Scheduler, SimulatedBackend};
use std::io::Write;
use std::sync::Arc;

/// What a finished simulation went through
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationSummary {
    /// Songs in the order they became current
    pub songs: Vec<String>,

    /// Virtual seconds from first play to the end of the program
    pub elapsed_secs: f64,

    /// Load failures reported along the way
    pub notifications: Vec<String>,
}

/// Play `program` to the end on a virtual clock
///
/// A status line is written every `report_every_secs` of virtual time, as
/// well as whenever the current song changes. The interval must be positive.
pub async fn run<W: Write>(
    library: &Library,
    config: &CliConfig,
    program: &str,
    report_every_secs: f64,
    out: &mut W,
) -> Result<SimulationSummary> {
    let report_every_secs = parse_report_interval(report_every_secs)?;
    let backend = SimulatedBackend::new();
    let (notifier, mut notes) = ChannelNotifier::channel();
    let scheduler = Scheduler::new(
        library.store.clone(),
        library.assets.clone(),
        Arc::new(backend.clone()),
        Arc::new(notifier),
        config.playback.clone(),
    )?;

    scheduler.choose_program_by_name(program).await?;
    scheduler.play().await?;
    tracing::info!(program, "Simulation started");

    let dt = config.tick_secs();
    let mut summary = SimulationSummary::default();
    let mut next_report = 0.0;

    loop {
        backend.advance(dt);
        let frame = scheduler.tick();
        scheduler.wait_for_preload().await;
        summary.elapsed_secs = backend.now();

        while let Ok(note) = notes.try_recv() {
            writeln!(out, "! {}", note.message)?;
            summary.notifications.push(note.message);
        }

        match scheduler.state() {
            PlaybackState::Finished | PlaybackState::Empty => break,
            PlaybackState::Stopped => {
                // The handoff had no buffer ready; restart from the new cursor
                scheduler.play().await?;
                continue;
            }
            PlaybackState::Playing => {}
        }

        if summary.songs.last() != Some(&frame.song_name) {
            writeln!(
                out,
                "[{}] {} ({} BPM)",
                clock_label(summary.elapsed_secs),
                frame.song_name,
                frame.current_tempo
            )?;
            summary.songs.push(frame.song_name.clone());
        }

        if summary.elapsed_secs >= next_report {
            let mut line = format!(
                "[{}]   {} left, beat {}",
                clock_label(summary.elapsed_secs),
                frame.remaining_label(),
                frame.beat
            );
            if let Some(intro) = frame.intro_label() {
                line.push_str(&format!(", {intro}"));
            }
            if let Some(instruction) = frame.instruction_label() {
                line.push_str(&format!(", {instruction}"));
            }
            writeln!(out, "{line}")?;
            next_report += report_every_secs;
        }
    }

    writeln!(
        out,
        "[{}] {} finished",
        clock_label(summary.elapsed_secs),
        program
    )?;
    tracing::info!(
        program,
        songs = summary.songs.len(),
        elapsed = summary.elapsed_secs,
        "Simulation finished"
    );
    Ok(summary)
}

/// Accept only finite, positive report intervals
pub fn parse_report_interval(secs: f64) -> Result<f64> {
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(CliError::Config(format!(
            "report interval must be positive, got {secs}"
        )))
    }
}

/// Elapsed virtual time as `m:ss`
fn clock_label(secs: f64) -> String {
    let whole = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
