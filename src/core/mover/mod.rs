//! Move orchestration.
//!
//! ```text
//! GoModule::discover -> PackageGraph::load -> plan_moves
//!     -> for each operation: fix_imports, relocate  (ledger threaded through)
//! ```
//!
//! Every error aborts the run. Writes already made stay on disk.

pub mod imports;
pub mod planner;
pub mod relocate;
pub mod report;

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::core::config::MoverConfig;
use crate::core::dependency::PackageGraph;
use crate::core::errors::{MvpkgError, Result};
use crate::core::ledger::RenameLedger;
use crate::core::module::GoModule;
use crate::io::fs::{DryRunFs, FileSystem, LocalFs};
use crate::lang::go::GoParser;

pub use planner::{plan_moves, MoveOperation};
pub use report::{MoveAction, MoveReport};

/// Move `source` to `destination` inside the module enclosing `working_dir`.
pub fn move_package(
    working_dir: &Path,
    source: &str,
    destination: &str,
    config: &MoverConfig,
) -> Result<MoveReport> {
    let started = Instant::now();
    config.validate()?;

    let module = GoModule::discover(working_dir)?;
    let graph = PackageGraph::load(&module, &config.build_context()?)?;
    let plan = plan_moves(&module, source, destination, config.recursive)?;
    for op in &plan {
        info!("Move plan: {op}");
    }

    let actions = if config.dry_run {
        let mut mover = PackageMover::new(module.clone(), graph, DryRunFs::new())?;
        mover.run(&plan)?;
        mover.into_actions()
    } else {
        let mut mover = PackageMover::new(module.clone(), graph, LocalFs)?;
        mover.run(&plan)?;
        mover.into_actions()
    };

    info!("done in {:?}", started.elapsed());
    Ok(MoveReport {
        module: module.path,
        dry_run: config.dry_run,
        plan,
        actions,
    })
}

/// Executes move operations against one loaded graph.
///
/// Owns the rename ledger for the run. `F` decides whether mutations reach
/// the disk.
pub struct PackageMover<F: FileSystem> {
    module: GoModule,
    graph: PackageGraph,
    ledger: RenameLedger,
    fs: F,
    parser: GoParser,
    actions: Vec<MoveAction>,
}

impl<F: FileSystem> PackageMover<F> {
    /// Create a mover with an empty ledger.
    pub fn new(module: GoModule, graph: PackageGraph, fs: F) -> Result<Self> {
        Ok(Self {
            module,
            graph,
            ledger: RenameLedger::new(),
            fs,
            parser: GoParser::new()?,
            actions: Vec::new(),
        })
    }

    /// Execute operations in order.
    pub fn run(&mut self, plan: &[MoveOperation]) -> Result<()> {
        for op in plan {
            self.execute(op)?;
        }
        Ok(())
    }

    /// Fix importers, then relocate files, for one operation.
    pub fn execute(&mut self, op: &MoveOperation) -> Result<()> {
        info!("Processing {op}");
        self.fix_imports(op).map_err(|e| {
            MvpkgError::operation("fix imports", &op.source, &op.destination, e)
        })?;
        self.relocate(op)
            .map_err(|e| MvpkgError::operation("move", &op.source, &op.destination, e))
    }

    /// Ledger state so far.
    pub fn ledger(&self) -> &RenameLedger {
        &self.ledger
    }

    /// File system collaborator.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Actions so far.
    pub fn actions(&self) -> &[MoveAction] {
        &self.actions
    }

    /// Consume the mover, keeping its actions.
    pub fn into_actions(self) -> Vec<MoveAction> {
        self.actions
    }
}
