//! Flattening of nested programs into playable form
//!
//! Every distinct sub-program is expanded at most once. The root counts as
//! already visited, so cyclic and diamond-shaped references terminate.

use crate::error::{PacerError, Result};
use crate::storage::TrackStore;
use crate::types::{PlayableProgram, Program, ProgramEntry, TrackInstance};
use std::collections::{HashMap, HashSet};

/// Expand `root` into a flat sequence of track instances
///
/// `lookup` resolves a sub-program by name; a miss aborts with `NotFound`.
pub fn flatten<F>(root: &Program, mut lookup: F) -> Result<PlayableProgram>
where
    F: FnMut(&str) -> Result<Option<Program>>,
{
    let mut visited = HashSet::from([root.name.clone()]);
    let mut content = Vec::new();
    expand(root, &mut lookup, &mut visited, &mut content)?;
    Ok(PlayableProgram::new(root.name.clone(), content))
}

fn expand<F>(
    program: &Program,
    lookup: &mut F,
    visited: &mut HashSet<String>,
    out: &mut Vec<TrackInstance>,
) -> Result<()>
where
    F: FnMut(&str) -> Result<Option<Program>>,
{
    for entry in &program.content {
        match entry {
            ProgramEntry::Track(instance) => out.push(instance.clone()),
            ProgramEntry::Program(reference) => {
                let name = reference.training_name.as_str();
                if !visited.insert(name.to_string()) {
                    tracing::debug!(
                        program = %program.name,
                        sub = name,
                        "skipping visited sub-program"
                    );
                    continue;
                }
                let sub = lookup(name)?.ok_or_else(|| PacerError::not_found("Program", name))?;
                expand(&sub, lookup, visited, out)?;
            }
        }
    }
    Ok(())
}

/// The root plus every transitively referenced program, de-duplicated by name
pub fn collect_programs<F>(root: &Program, mut lookup: F) -> Result<Vec<Program>>
where
    F: FnMut(&str) -> Result<Option<Program>>,
{
    let mut visited = HashSet::from([root.name.clone()]);
    let mut collected = vec![root.clone()];
    let mut cursor = 0;

    while cursor < collected.len() {
        let names: Vec<String> = collected[cursor]
            .sub_program_names()
            .map(str::to_string)
            .collect();
        for name in names {
            if visited.insert(name.clone()) {
                let sub =
                    lookup(&name)?.ok_or_else(|| PacerError::not_found("Program", &name))?;
                collected.push(sub);
            }
        }
        cursor += 1;
    }

    Ok(collected)
}

/// Resolve every program reachable from `root` through an async store
pub async fn collect_programs_from_store(
    store: &dyn TrackStore,
    root: &Program,
) -> Result<Vec<Program>> {
    let mut visited = HashSet::from([root.name.clone()]);
    let mut collected = vec![root.clone()];
    let mut cursor = 0;

    while cursor < collected.len() {
        let names: Vec<String> = collected[cursor]
            .sub_program_names()
            .map(str::to_string)
            .collect();
        for name in names {
            if visited.insert(name.clone()) {
                collected.push(store.require_program(&name).await?);
            }
        }
        cursor += 1;
    }

    Ok(collected)
}

/// Flatten `root`, resolving sub-programs from the store
pub async fn flatten_with_store(store: &dyn TrackStore, root: &Program) -> Result<PlayableProgram> {
    let programs: HashMap<String, Program> = collect_programs_from_store(store, root)
        .await?
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect();
    flatten(root, |name| Ok(programs.get(name).cloned()))
}
