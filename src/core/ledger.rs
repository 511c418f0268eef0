//! Run-scoped record of everything moved so far.
//!
//! Every path comparison made while executing a plan goes through the ledger,
//! so an operation planned against the original tree still addresses the
//! right package after earlier operations relocated it.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Mapping from original to current package paths and file paths.
///
/// Entries are never removed. Recording `a -> b` also retargets every entry
/// currently pointing at `a`, so lookups are a single hop.
#[derive(Debug, Default, Clone)]
pub struct RenameLedger {
    packages: HashMap<String, String>,
    files: HashMap<PathBuf, PathBuf>,
}

impl RenameLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current canonical path of a package; identity for unmoved packages.
    pub fn resolve_package<'a>(&'a self, path: &'a str) -> &'a str {
        self.packages.get(path).map_or(path, String::as_str)
    }

    /// Current on-disk path of a file; identity for unmoved files.
    pub fn resolve_file<'a>(&'a self, path: &'a Path) -> &'a Path {
        self.files.get(path).map_or(path, PathBuf::as_path)
    }

    /// Record that the package currently at `from` now lives at `to`.
    pub fn record_package(&mut self, from: &str, to: &str) {
        record(&mut self.packages, from.to_string(), to.to_string());
    }

    /// Record that the file currently at `from` now lives at `to`.
    pub fn record_file(&mut self, from: &Path, to: &Path) {
        record(&mut self.files, from.to_path_buf(), to.to_path_buf());
    }

    /// Number of package entries.
    pub fn package_entries(&self) -> usize {
        self.packages.len()
    }

    /// Number of file entries.
    pub fn file_entries(&self) -> usize {
        self.files.len()
    }
}

fn record<K>(map: &mut HashMap<K, K>, from: K, to: K)
where
    K: Eq + Hash + Clone,
{
    for current in map.values_mut() {
        if *current == from {
            *current = to.clone();
        }
    }
    map.insert(from, to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_fallback() {
        let ledger = RenameLedger::new();
        assert_eq!(ledger.resolve_package("example.com/a"), "example.com/a");
        assert_eq!(ledger.resolve_file(Path::new("/m/a/a.go")), Path::new("/m/a/a.go"));
    }

    #[test]
    fn test_chained_moves_resolve_in_one_hop() {
        let mut ledger = RenameLedger::new();
        ledger.record_package("m/a", "m/b");
        ledger.record_package("m/b", "m/c");

        assert_eq!(ledger.resolve_package("m/a"), "m/c");
        assert_eq!(ledger.resolve_package("m/b"), "m/c");
        assert_eq!(ledger.package_entries(), 2);
    }

    #[test]
    fn test_move_back_to_origin() {
        let mut ledger = RenameLedger::new();
        ledger.record_file(Path::new("/m/a/x.go"), Path::new("/m/b/x.go"));
        ledger.record_file(Path::new("/m/b/x.go"), Path::new("/m/a/x.go"));

        assert_eq!(ledger.resolve_file(Path::new("/m/a/x.go")), Path::new("/m/a/x.go"));
        assert_eq!(ledger.file_entries(), 2);
    }

    proptest! {
        #[test]
        fn prop_resolves_to_last_hop(hops in proptest::collection::vec("[a-e]", 1..8)) {
            let mut ledger = RenameLedger::new();
            let mut current = "start".to_string();
            for hop in &hops {
                ledger.record_package(&current, hop);
                current = hop.clone();
            }
            let resolved = ledger.resolve_package("start");
            prop_assert_eq!(resolved, current.as_str());
        }
    }
}
