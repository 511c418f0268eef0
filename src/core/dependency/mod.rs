//! Package graph of a Go module.
//!
//! Loaded once per run by walking the module tree and parsing every file
//! that takes part in the build. Test files are always included, so packages
//! only reachable from tests are part of the graph.

pub mod types;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::errors::{MvpkgError, Result};
use crate::core::ledger::RenameLedger;
use crate::core::module::{GoModule, MODULE_DESCRIPTOR};
use crate::lang::build::BuildContext;
use crate::lang::go::{GoParser, EXTERNAL_TEST_SUFFIX};

pub use types::{GoPackage, PackageKind};

/// Directories never searched for packages.
const SKIP_DIRS: &[&str] = &["testdata", "vendor"];

/// All packages of one module.
#[derive(Debug, Default, Clone)]
pub struct PackageGraph {
    packages: Vec<GoPackage>,
}

/// One parsed file awaiting assignment to a package.
struct LoadedFile {
    path: PathBuf,
    package_name: String,
    imports: Vec<String>,
    is_test: bool,
}

impl PackageGraph {
    /// Build a graph from already known packages.
    pub fn from_packages(packages: Vec<GoPackage>) -> Self {
        Self { packages }
    }

    /// Load every package under the module root.
    pub fn load(module: &GoModule, ctx: &BuildContext) -> Result<Self> {
        info!("Loading {}/...", module.path);
        let mut parser = GoParser::new()?;
        let mut packages = Vec::new();

        for (dir, files) in collect_go_files(&module.root)? {
            let Some(relative) = module.relative_of(&dir) else {
                continue;
            };

            let mut loaded = Vec::new();
            for path in files {
                if let Some(file) = load_file(&mut parser, ctx, &path)? {
                    loaded.push(file);
                }
            }
            if loaded.is_empty() {
                continue;
            }

            packages.extend(assemble_packages(&module.canonical(&relative), &dir, loaded));
        }

        info!("Loaded {} packages", packages.len());
        Ok(Self { packages })
    }

    /// All packages in load order.
    pub fn packages(&self) -> &[GoPackage] {
        &self.packages
    }

    /// Packages with an import that currently resolves to `target`.
    pub fn importers_of<'a>(
        &'a self,
        target: &'a str,
        ledger: &'a RenameLedger,
    ) -> impl Iterator<Item = &'a GoPackage> + 'a {
        self.packages.iter().filter(move |pkg| {
            pkg.imports
                .iter()
                .any(|import| ledger.resolve_package(import) == target)
        })
    }

    /// Packages whose current path is `target` or its external test.
    pub fn packages_at<'a>(
        &'a self,
        target: &'a str,
        ledger: &'a RenameLedger,
    ) -> impl Iterator<Item = &'a GoPackage> + 'a {
        self.packages.iter().filter(move |pkg| {
            let current = ledger.resolve_package(&pkg.path);
            current == target
                || current
                    .strip_suffix(EXTERNAL_TEST_SUFFIX)
                    .is_some_and(|base| base == target)
        })
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no packages were found
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Group candidate `.go` files by directory, in sorted walk order.
fn collect_go_files(root: &Path) -> Result<IndexMap<PathBuf, Vec<PathBuf>>> {
    let mut dirs: IndexMap<PathBuf, Vec<PathBuf>> = IndexMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || keep_dir(e.path()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let message = format!("failed to walk {}", root.display());
            match e.into_io_error() {
                Some(io) => MvpkgError::io(message, io),
                None => MvpkgError::graph(message),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".go") || name.starts_with('.') || name.starts_with('_') {
            continue;
        }

        let path = entry.path();
        if let Some(parent) = path.parent() {
            dirs.entry(parent.to_path_buf())
                .or_default()
                .push(path.to_path_buf());
        }
    }

    Ok(dirs)
}

fn keep_dir(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with('.') || name.starts_with('_') || SKIP_DIRS.iter().any(|d| name == *d) {
        return false;
    }
    if path.join(MODULE_DESCRIPTOR).is_file() {
        debug!("Skipping nested module {}", path.display());
        return false;
    }
    true
}

fn load_file(parser: &mut GoParser, ctx: &BuildContext, path: &Path) -> Result<Option<LoadedFile>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !ctx.matches_file_name(&file_name) {
        debug!("Excluding {} for {}/{}", path.display(), ctx.goos, ctx.goarch);
        return Ok(None);
    }

    let source = std::fs::read_to_string(path)
        .map_err(|e| MvpkgError::io(format!("failed to read {}", path.display()), e))?;
    if !ctx.matches_header(&source)? {
        debug!("Excluding {} by build constraint", path.display());
        return Ok(None);
    }

    let file = parser.parse(source, path)?;
    if let Some((line, column)) = file.first_syntax_error() {
        debug!("{}:{line}:{column}: syntax error, loading leniently", path.display());
    }

    let clause = file.package_clause()?.ok_or_else(|| {
        MvpkgError::parse_with_location(
            "go",
            format!("{}: expected package clause", path.display()),
            path.display().to_string(),
            Some(1),
            Some(1),
        )
    })?;
    let imports = file.imports()?.into_iter().map(|import| import.path).collect();

    Ok(Some(LoadedFile {
        path: path.to_path_buf(),
        package_name: clause.name,
        imports,
        is_test: file_name.ends_with("_test.go"),
    }))
}

/// Split one directory's files into its library and external test packages.
fn assemble_packages(canonical: &str, dir: &Path, files: Vec<LoadedFile>) -> Vec<GoPackage> {
    let name = primary_package_name(&files);
    let external_name = format!("{name}{EXTERNAL_TEST_SUFFIX}");

    let mut library = GoPackage::new(canonical, name.clone(), dir, PackageKind::Library);
    let mut external = GoPackage::new(
        format!("{canonical}{EXTERNAL_TEST_SUFFIX}"),
        external_name.clone(),
        dir,
        PackageKind::ExternalTest,
    );

    for file in files {
        if file.is_test && file.package_name == external_name {
            external.add_file(&file.path, file.imports);
            continue;
        }
        if file.package_name != name {
            warn!(
                "{}: found package {} in directory of package {}",
                file.path.display(),
                file.package_name,
                name
            );
        }
        library.add_file(&file.path, file.imports);
    }

    [library, external]
        .into_iter()
        .filter(|pkg| !pkg.files.is_empty())
        .collect()
}

/// The name declared by the first non-test file, else by the first test file.
fn primary_package_name(files: &[LoadedFile]) -> String {
    if let Some(file) = files.iter().find(|f| !f.is_test) {
        return file.package_name.clone();
    }
    let first = files
        .iter()
        .find(|f| !f.package_name.ends_with(EXTERNAL_TEST_SUFFIX))
        .or_else(|| files.first());
    match first {
        Some(file) => file
            .package_name
            .strip_suffix(EXTERNAL_TEST_SUFFIX)
            .unwrap_or(&file.package_name)
            .to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn module(dir: &TempDir) -> GoModule {
        GoModule::new("example.com", dir.path())
    }

    fn package<'a>(graph: &'a PackageGraph, path: &str) -> &'a GoPackage {
        graph
            .packages()
            .iter()
            .find(|pkg| pkg.path == path)
            .unwrap()
    }

    #[test]
    fn test_load_library_and_external_test() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com\n");
        write(dir.path(), "a/a.go", "package a\n\nimport \"fmt\"\n");
        write(
            dir.path(),
            "a/a_internal_test.go",
            "package a\n\nimport \"testing\"\n",
        );
        write(
            dir.path(),
            "a/a_test.go",
            "package a_test\n\nimport \"example.com/a\"\n",
        );

        let graph = PackageGraph::load(&module(&dir), &BuildContext::host()).unwrap();
        assert_eq!(graph.len(), 2);

        let lib = package(&graph, "example.com/a");
        assert_eq!(lib.kind, PackageKind::Library);
        assert_eq!(lib.files.len(), 2);
        assert!(lib.imports_path("fmt") && lib.imports_path("testing"));

        let ext = package(&graph, "example.com/a_test");
        assert!(ext.is_external_test());
        assert_eq!(ext.name, "a_test");
        assert!(ext.imports_path("example.com/a"));
    }

    #[test]
    fn test_load_skips_special_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com\n");
        write(dir.path(), "main.go", "package main\n");
        write(dir.path(), "testdata/x.go", "package x\n");
        write(dir.path(), "vendor/v/v.go", "package v\n");
        write(dir.path(), ".hidden/h.go", "package h\n");
        write(dir.path(), "_skip/s.go", "package s\n");
        write(dir.path(), "sub/go.mod", "module example.com/sub\n");
        write(dir.path(), "sub/s.go", "package sub\n");
        write(dir.path(), "b/_ignored.go", "package b\n");

        let graph = PackageGraph::load(&module(&dir), &BuildContext::host()).unwrap();
        let paths: Vec<&str> = graph.packages().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["example.com"]);
    }

    #[test]
    fn test_load_only_takes_go_sources() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com\n");
        write(dir.path(), "a/a.go", "package a\n");
        write(dir.path(), "a/notes.go.txt", "package notes\n");
        write(dir.path(), "a/gen.GO", "package gen\n");
        write(dir.path(), "b/README", "package b\n");

        let graph = PackageGraph::load(&module(&dir), &BuildContext::host()).unwrap();
        let paths: Vec<&str> = graph.packages().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["example.com/a"]);
        assert_eq!(package(&graph, "example.com/a").files.len(), 1);
    }

    #[test]
    fn test_load_honours_build_tags() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com\n");
        write(
            dir.path(),
            "user/special.go",
            "//go:build special\n\npackage user\n\nimport \"example.com/lib\"\n",
        );
        write(dir.path(), "user/user.go", "package user\n");

        let plain = PackageGraph::load(&module(&dir), &BuildContext::host()).unwrap();
        assert!(!package(&plain, "example.com/user").imports_path("example.com/lib"));

        let tagged = PackageGraph::load(
            &module(&dir),
            &BuildContext::host().with_tag("special"),
        )
        .unwrap();
        let user = package(&tagged, "example.com/user");
        assert!(user.imports_path("example.com/lib"));
        assert_eq!(user.files.len(), 2);
    }

    #[test]
    fn test_missing_package_clause_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com\n");
        write(dir.path(), "a/a.go", "func main() {}\n");

        let err = PackageGraph::load(&module(&dir), &BuildContext::host()).unwrap_err();
        assert!(matches!(err, MvpkgError::Parse { .. }));
    }

    #[test]
    fn test_importers_follow_ledger() {
        let mut user = GoPackage::new("m/user", "user", "/m/user", PackageKind::Library);
        user.add_file(Path::new("/m/user/u.go"), vec!["m/a".to_string()]);
        let graph = PackageGraph::from_packages(vec![user]);

        let mut ledger = RenameLedger::new();
        assert_eq!(graph.importers_of("m/a", &ledger).count(), 1);

        ledger.record_package("m/a", "m/b");
        assert_eq!(graph.importers_of("m/a", &ledger).count(), 0);
        assert_eq!(graph.importers_of("m/b", &ledger).count(), 1);
    }

    #[test]
    fn test_packages_at_includes_external_test() {
        let lib = GoPackage::new("m/a", "a", "/m/a", PackageKind::Library);
        let ext = GoPackage::new("m/a_test", "a_test", "/m/a", PackageKind::ExternalTest);
        let other = GoPackage::new("m/ab", "ab", "/m/ab", PackageKind::Library);
        let graph = PackageGraph::from_packages(vec![lib, ext, other]);

        let ledger = RenameLedger::new();
        let found: Vec<&str> = graph
            .packages_at("m/a", &ledger)
            .map(|p| p.path.as_str())
            .collect();
        assert_eq!(found, vec!["m/a", "m/a_test"]);
    }
}
