//! # mvpkg-rs: Go Package Mover
//!
//! Moves a Go package to another directory inside its module and keeps the
//! rest of the module compiling:
//!
//! - **Import rewriting**: every direct importer is pointed at the new path
//! - **Identifier rewriting**: `pkg.Member` references follow a short-name
//!   change, with local shadowing resolved by scope
//! - **Relocation**: files (and the external `_test` package) move together,
//!   `package` clauses follow the new directory name
//! - **Recursive moves**: nested packages move along, in parent-first order
//! - **Dry run**: the full run is projected in memory and reported
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     move_package / CLI                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core            │  Language         │  I/O                  │
//! │ • Module         │ • Go parsing      │ • FileSystem port     │
//! │ • Package graph  │ • Scope resolver  │ • LocalFs / DryRunFs  │
//! │ • Ledger         │ • Build tags      │                       │
//! │ • Planner/Mover  │                   │                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mvpkg_rs::{move_package, MoverConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MoverConfig::default().with_dry_run(true);
//!     let report = move_package(
//!         std::path::Path::new("."),
//!         "source/testpkg",
//!         "destination/testpkg2",
//!         &config,
//!     )?;
//!
//!     for action in &report.actions {
//!         println!("{action}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core move engine
pub mod core {
    //! Module discovery, package graph, ledger and move orchestration.

    pub mod config;
    pub mod dependency;
    pub mod errors;
    pub mod ledger;
    pub mod module;
    pub mod mover;
}

// Go language support
pub mod lang {
    //! Go parsing, scope resolution and build constraints.

    pub mod build;
    pub mod go;
    pub mod go_scope;
    pub mod registry;
}

// File system access
pub mod io {
    //! File system port and the dry-run overlay.

    pub mod fs;
}

// Re-export primary types for convenience
pub use core::config::MoverConfig;
pub use core::dependency::{GoPackage, PackageGraph, PackageKind};
pub use core::errors::{MvpkgError, Result, ResultExt};
pub use core::ledger::RenameLedger;
pub use core::module::GoModule;
pub use core::mover::{
    move_package, plan_moves, MoveAction, MoveOperation, MoveReport, PackageMover,
};
pub use io::fs::{DryRunFs, FileSystem, LocalFs};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
