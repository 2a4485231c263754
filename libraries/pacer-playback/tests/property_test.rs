//! Property-based tests for render projection and program flattening

use pacer_core::{flatten, Cue, Program, ProgramInstance, TrackInstance};
use pacer_playback::render::{active_cue, beat_number, intro_countdown};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// ===== Helpers =====

/// Up to eight programs, each with one track and random sub-program references
fn arbitrary_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..8).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..4), n))
}

fn build_programs(graph: &[Vec<usize>]) -> HashMap<String, Program> {
    graph
        .iter()
        .enumerate()
        .map(|(i, edges)| {
            let program = edges.iter().fold(
                Program::new(format!("p{i}")).with_entry(TrackInstance::new(format!("t{i}"))),
                |program, edge| program.with_entry(ProgramInstance::new(format!("p{edge}"))),
            );
            (format!("p{i}"), program)
        })
        .collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: the beat always lies within the bar
    #[test]
    fn beat_is_within_bar(offset in 0.0f64..10_000.0, tempo in 1.0f64..300.0) {
        let beat = beat_number(offset, tempo);
        prop_assert!((1..=4).contains(&beat), "beat {} out of range", beat);
    }

    /// Property: the intro countdown never exceeds the intro length and
    /// reaches zero once the intro is over
    #[test]
    fn intro_countdown_is_bounded(
        offset in 0.0f64..600.0,
        tempo in 1.0f64..300.0,
        intro in 0.0f64..64.0,
    ) {
        let countdown = intro_countdown(offset, tempo, intro);
        prop_assert!(f64::from(countdown) <= intro);

        let total_beats = offset * tempo / 15.0;
        if total_beats >= intro {
            prop_assert_eq!(countdown, 0);
        }
    }

    /// Property: the active cue is always the earliest cue still ahead
    #[test]
    fn active_cue_is_first_future_cue(
        mut times in prop::collection::vec(0.0f64..300.0, 0..10),
        offset in 0.0f64..300.0,
    ) {
        times.sort_by(f64::total_cmp);
        let cues: Vec<Cue> = times.iter().map(|t| Cue::new(*t, format!("at {t}"))).collect();

        match active_cue(&cues, offset) {
            Some((cue, countdown)) => {
                prop_assert!(cue.time > offset);
                prop_assert!(cues.iter().filter(|c| c.time > offset).all(|c| c.time >= cue.time));
                prop_assert!(countdown >= 1);
            }
            None => prop_assert!(times.iter().all(|t| *t <= offset)),
        }
    }

    /// Property: flattening terminates on any reference graph and expands each program once
    #[test]
    fn flatten_expands_each_program_once(graph in arbitrary_graph()) {
        let programs = build_programs(&graph);
        let root = &programs["p0"];

        let playable = flatten(root, |name| Ok(programs.get(name).cloned())).unwrap();

        let names: Vec<&str> = playable.content.iter().map(|i| i.song_name.as_str()).collect();
        let distinct: HashSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(distinct.len(), names.len(), "a program was expanded twice");
        prop_assert!(names.len() <= graph.len());
        prop_assert_eq!(names[0], "t0");
    }
}
