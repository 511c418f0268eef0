//! Expansion of a move request into an ordered list of operations.

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::core::errors::{MvpkgError, Result};
use crate::core::module::{clean_slash, escapes_root, join_slash, to_slash, GoModule};

/// One relocation, both sides relative to the module root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOperation {
    /// Source directory
    pub source: String,
    /// Destination directory
    pub destination: String,
}

impl MoveOperation {
    /// Create an operation
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for MoveOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Plan the operations for moving `source` to `destination`.
///
/// The root operation always comes first. In recursive mode every directory
/// below the source follows in sorted pre-order, mapped to the same relative
/// location under the destination.
pub fn plan_moves(
    module: &GoModule,
    source: &str,
    destination: &str,
    recursive: bool,
) -> Result<Vec<MoveOperation>> {
    for (label, path) in [("source", source), ("destination", destination)] {
        if path.trim().is_empty() {
            return Err(MvpkgError::planning(format!("{label} path is empty")));
        }
        if escapes_root(path) {
            return Err(MvpkgError::planning(format!(
                "{label} path {path} is outside module {}",
                module.path
            )));
        }
    }

    let source = clean_slash(source);
    let destination = clean_slash(destination);
    let mut plan = vec![MoveOperation::new(source.clone(), destination.clone())];
    if !recursive {
        return Ok(plan);
    }

    let source_dir = module.dir_of(&source);
    if !source_dir.is_dir() {
        return Err(MvpkgError::planning(format!(
            "source {} is not a directory",
            source_dir.display()
        )));
    }

    for entry in WalkDir::new(&source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            MvpkgError::planning(format!("failed to walk {}: {e}", source_dir.display()))
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let relative = entry.path().strip_prefix(&source_dir).map_err(|_| {
            MvpkgError::planning(format!(
                "cannot compute path of {} relative to {}",
                entry.path().display(),
                source_dir.display()
            ))
        })?;
        let relative = to_slash(relative);
        plan.push(MoveOperation::new(
            join_slash(&source, &relative),
            join_slash(&destination, &relative),
        ));
    }

    Ok(plan)
}
