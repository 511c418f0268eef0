//! Module discovery and module-relative path arithmetic.
//!
//! A run operates on exactly one Go module: the nearest `go.mod` at or above
//! the working directory. Package addresses inside it are slash-separated
//! strings (`example.com/source/testpkg`) independent of the host separator.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::errors::{MvpkgError, Result};

/// File name of the module descriptor.
pub const MODULE_DESCRIPTOR: &str = "go.mod";

/// The module a run operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Canonical namespace prefix declared by the `module` directive
    pub path: String,
    /// Absolute root directory (the directory holding `go.mod`)
    pub root: PathBuf,
}

impl GoModule {
    /// Build a module from known parts.
    pub fn new(path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Search `start` and each ancestor for a `go.mod` file.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = std::path::absolute(start).map_err(|e| {
            MvpkgError::io(
                format!("failed to resolve working directory {}", start.display()),
                e,
            )
        })?;

        for dir in start.ancestors() {
            let descriptor = dir.join(MODULE_DESCRIPTOR);
            match fs::read_to_string(&descriptor) {
                Ok(contents) => {
                    let path = parse_module_directive(&contents)
                        .ok_or_else(|| MvpkgError::manifest(&descriptor, "no module directive"))?;
                    debug!("Found module {} at {}", path, dir.display());
                    return Ok(Self::new(path, dir));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) if e.kind() == io::ErrorKind::IsADirectory => continue,
                Err(e) => {
                    return Err(MvpkgError::io(
                        format!("failed to read {}", descriptor.display()),
                        e,
                    ))
                }
            }
        }

        Err(MvpkgError::NoModule { start })
    }

    /// Canonical package path for a module-relative directory.
    pub fn canonical(&self, relative: &str) -> String {
        join_slash(&self.path, relative)
    }

    /// On-disk directory for a module-relative directory.
    pub fn dir_of(&self, relative: &str) -> PathBuf {
        let cleaned = clean_slash(relative);
        if cleaned == "." {
            return self.root.clone();
        }
        cleaned
            .split('/')
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Module-relative slash path of a directory below the root.
    pub fn relative_of(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        Some(to_slash(rel))
    }
}

/// Extract the namespace prefix from a `go.mod` body.
///
/// Takes the rest of the first `module` line, drops trailing `//` comments
/// and surrounding quotes.
pub fn parse_module_directive(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.split("//").next().unwrap_or_default().trim();
        let rest = rest.trim_matches(|c| c == '"' || c == '`');
        (!rest.is_empty()).then(|| rest.to_string())
    })
}

/// Lexically clean a slash path the way Go's `path.Clean` does.
pub fn clean_slash(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join two slash paths and clean the result.
pub fn join_slash(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return clean_slash(base);
    }
    clean_slash(&format!("{base}/{relative}"))
}

/// Last element of a slash path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Whether a cleaned relative path leaves its root (`..`) or is absolute.
pub fn escapes_root(path: &str) -> bool {
    let cleaned = clean_slash(path);
    cleaned.starts_with('/') || cleaned == ".." || cleaned.starts_with("../")
}

/// Render a relative filesystem path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
