//! Rewriting of importers when a package moves.

use std::path::PathBuf;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use super::planner::MoveOperation;
use super::report::MoveAction;
use super::PackageMover;
use crate::core::errors::{MvpkgError, Result};
use crate::core::module::base_name;
use crate::io::fs::FileSystem;

impl<F: FileSystem> PackageMover<F> {
    /// Point every direct importer of the operation's source at its destination.
    ///
    /// Files that do not import the current source path literally are left
    /// untouched. Indirect importers are not visited.
    pub fn fix_imports(&mut self, op: &MoveOperation) -> Result<()> {
        let from = self
            .ledger
            .resolve_package(&self.module.canonical(&op.source))
            .to_string();
        let to = self.module.canonical(&op.destination);
        let old_name = base_name(&from).to_string();
        let new_name = base_name(&to).to_string();
        let rename = (old_name != new_name).then_some((old_name.as_str(), new_name.as_str()));

        let importers: Vec<&str> = self
            .graph
            .importers_of(&from, &self.ledger)
            .map(|pkg| pkg.path.as_str())
            .collect();
        info!("Updating packages: {}", importers.len());
        debug!("Importers of {from}: {importers:?}");

        let files: IndexSet<PathBuf> = self
            .graph
            .importers_of(&from, &self.ledger)
            .flat_map(|pkg| pkg.files.iter())
            .map(|file| self.ledger.resolve_file(file).to_path_buf())
            .collect();

        for file in files {
            let source = self
                .fs
                .read_to_string(&file)
                .map_err(|e| MvpkgError::io(format!("failed to read {}", file.display()), e))?;

            let Some(rewrite) = self
                .parser
                .rewrite_import(source, &file, &from, &to, rename)?
            else {
                debug!("{} does not import {from}", file.display());
                continue;
            };

            for reference in rewrite.references.iter().filter(|r| r.captured) {
                warn!(
                    "{}:{}: renamed reference to {new_name} is shadowed by a local declaration",
                    file.display(),
                    reference.line
                );
            }

            if self.fs.is_dry_run() {
                info!("Would rewrite {}", file.display());
            } else {
                info!("Rewriting {}", file.display());
            }
            self.fs
                .write(&file, &rewrite.source)
                .map_err(|e| MvpkgError::io(format!("failed to write {}", file.display()), e))?;

            self.actions.push(MoveAction::RewriteImports {
                file,
                references: rewrite.references.len(),
            });
        }

        Ok(())
    }
}
