//! Physical relocation of a package's files.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, info};

use super::planner::MoveOperation;
use super::report::MoveAction;
use super::PackageMover;
use crate::core::errors::{MvpkgError, Result};
use crate::core::module::base_name;
use crate::io::fs::FileSystem;
use crate::lang::go::EXTERNAL_TEST_SUFFIX;

impl<F: FileSystem> PackageMover<F> {
    /// Move the source package and its external test into the destination.
    ///
    /// A source with no files is a successful no-op.
    pub fn relocate(&mut self, op: &MoveOperation) -> Result<()> {
        let from = self
            .ledger
            .resolve_package(&self.module.canonical(&op.source))
            .to_string();
        let to = self.module.canonical(&op.destination);
        let old_name = base_name(&from).to_string();
        let new_name = base_name(&to).to_string();

        let files: IndexSet<PathBuf> = self
            .graph
            .packages_at(&from, &self.ledger)
            .inspect(|pkg| {
                debug!(
                    "Relocating {} package {} from {}",
                    pkg.kind_label(),
                    pkg.name,
                    pkg.dir.display()
                );
            })
            .flat_map(|pkg| pkg.files.iter())
            .map(|file| self.ledger.resolve_file(file).to_path_buf())
            .collect();
        if files.is_empty() {
            info!("No files found for {from}, nothing to move");
            return Ok(());
        }

        let target_dir = self.module.dir_of(&op.destination);
        if !self.fs.is_dry_run() && !target_dir.is_dir() {
            info!("Creating directory {}", target_dir.display());
        }
        self.fs.create_dir_all(&target_dir).map_err(|e| {
            MvpkgError::io(format!("failed to create {}", target_dir.display()), e)
        })?;
        self.actions.push(MoveAction::CreateDir {
            dir: target_dir.clone(),
        });

        for file in files {
            let file_name = file.file_name().ok_or_else(|| {
                MvpkgError::internal(format!("{} has no file name", file.display()))
            })?;
            let target = target_dir.join(file_name);

            if file != target {
                if self.fs.is_dry_run() {
                    info!("Would move {} to {}", file.display(), target.display());
                } else {
                    info!("Moving {} to {}", file.display(), target.display());
                }
                self.fs.rename(&file, &target).map_err(|e| {
                    MvpkgError::io(
                        format!("failed to move {} to {}", file.display(), target.display()),
                        e,
                    )
                })?;
                self.actions.push(MoveAction::MoveFile {
                    from: file.clone(),
                    to: target.clone(),
                });
            }

            if old_name != new_name {
                self.rename_package_clause(&target, &old_name, &new_name)?;
            }
            self.ledger.record_file(&file, &target);
        }

        self.ledger.record_package(&from, &to);
        self.ledger.record_package(
            &format!("{from}{EXTERNAL_TEST_SUFFIX}"),
            &format!("{to}{EXTERNAL_TEST_SUFFIX}"),
        );
        Ok(())
    }

    fn rename_package_clause(&mut self, file: &Path, old_name: &str, new_name: &str) -> Result<()> {
        let source = self
            .fs
            .read_to_string(file)
            .map_err(|e| MvpkgError::io(format!("failed to read {}", file.display()), e))?;
        let parsed = self.parser.parse(source, file)?;

        let Some((rewritten, from, to)) = parsed.rename_package_clause(old_name, new_name)? else {
            debug!("{} does not declare package {old_name}", file.display());
            return Ok(());
        };

        info!("Renaming package {from} to {to} in {}", file.display());
        self.fs
            .write(file, &rewritten)
            .map_err(|e| MvpkgError::io(format!("failed to write {}", file.display()), e))?;
        self.actions.push(MoveAction::RenamePackageClause {
            file: file.to_path_buf(),
            from,
            to,
        });
        Ok(())
    }
}
