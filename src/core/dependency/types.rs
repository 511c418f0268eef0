//! Types for the package graph.
//!
//! This module contains the data structures describing one loaded package:
//! its canonical path, member files and import set.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

/// Which compilation unit of a directory a package is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// The directory's package, including its in-package `_test.go` files.
    Library,
    /// The `<name>_test` package built from `_test.go` files in the same directory.
    ExternalTest,
}

/// A package discovered in the module.
#[derive(Debug, Clone)]
pub struct GoPackage {
    /// Canonical path (module prefix + relative directory, `_test` suffixed
    /// for external tests).
    pub path: String,
    /// Declared package name.
    pub name: String,
    /// Directory holding the files.
    pub dir: PathBuf,
    /// Library or external test.
    pub kind: PackageKind,
    /// Absolute source file paths, in directory order.
    pub files: IndexSet<PathBuf>,
    /// Canonical paths of imported packages.
    pub imports: IndexSet<String>,
}

impl GoPackage {
    /// Create an empty package.
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        kind: PackageKind,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            dir: dir.into(),
            kind,
            files: IndexSet::new(),
            imports: IndexSet::new(),
        }
    }

    /// Add a member file and its imports.
    pub fn add_file<I>(&mut self, file: &Path, imports: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.files.insert(file.to_path_buf());
        self.imports.extend(imports);
    }

    /// Whether this is an external test package.
    pub fn is_external_test(&self) -> bool {
        self.kind == PackageKind::ExternalTest
    }

    /// Short description of the compilation unit, for logs.
    pub fn kind_label(&self) -> &'static str {
        if self.is_external_test() {
            "external test"
        } else {
            "library"
        }
    }

    /// Whether any file in this package imports `path`.
    pub fn imports_path(&self, path: &str) -> bool {
        self.imports.contains(path)
    }
}
