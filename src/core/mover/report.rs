//! Record of what a run did, or would do under dry-run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::planner::MoveOperation;
use crate::core::errors::Result;

/// One executed (or projected) action, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MoveAction {
    /// Destination directory ensured
    CreateDir {
        /// Directory path
        dir: PathBuf,
    },
    /// File relocated
    MoveFile {
        /// Previous location
        from: PathBuf,
        /// New location
        to: PathBuf,
    },
    /// Import path rewritten in an importing file
    RewriteImports {
        /// Rewritten file
        file: PathBuf,
        /// Qualified references renamed alongside
        references: usize,
    },
    /// `package` clause renamed in a moved file
    RenamePackageClause {
        /// Moved file
        file: PathBuf,
        /// Previous package name
        from: String,
        /// New package name
        to: String,
    },
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { dir } => write!(f, "create {}", dir.display()),
            Self::MoveFile { from, to } => write!(f, "move {} -> {}", from.display(), to.display()),
            Self::RewriteImports { file, references } => write!(
                f,
                "rewrite imports in {} ({references} references)",
                file.display()
            ),
            Self::RenamePackageClause { file, from, to } => {
                write!(f, "rename package {from} -> {to} in {}", file.display())
            }
        }
    }
}

/// Outcome of `move_package`.
#[derive(Debug, Clone, Serialize)]
pub struct MoveReport {
    /// Module path
    pub module: String,
    /// Whether actions were only projected
    pub dry_run: bool,
    /// Operations in execution order
    pub plan: Vec<MoveOperation>,
    /// Actions in execution order
    pub actions: Vec<MoveAction>,
}

impl MoveReport {
    /// Number of files relocated.
    pub fn files_moved(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, MoveAction::MoveFile { .. }))
            .count()
    }

    /// Number of importing files rewritten.
    pub fn files_rewritten(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, MoveAction::RewriteImports { .. }))
            .count()
    }

    /// Whether the run changed (or would change) nothing.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
