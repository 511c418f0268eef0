//! File system port used by the mover.
//!
//! `LocalFs` touches the disk. `DryRunFs` reads through to the disk but keeps
//! every mutation in memory, so a dry run follows exactly the same code path
//! as a real one and later operations observe earlier (simulated) effects.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Permission bits for files we create.
pub const FILE_MODE: u32 = 0o644;

/// File operations the mover performs.
pub trait FileSystem {
    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents.
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;

    /// Create a directory and its parents.
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Move a file.
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Whether mutations are only simulated.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// The real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(FILE_MODE);
        }
        let mut file = options.open(path)?;
        file.write_all(contents.as_bytes())
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

/// In-memory overlay over the real file system.
#[derive(Debug, Default, Clone)]
pub struct DryRunFs {
    contents: HashMap<PathBuf, String>,
    removed: HashSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
}

impl DryRunFs {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected contents of a file written or moved during the run.
    pub fn projected(&self, path: &Path) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    /// Whether a file has been moved away during the run.
    pub fn is_removed(&self, path: &Path) -> bool {
        self.removed.contains(path)
    }

    /// Directories that would be created.
    pub fn created_dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

impl FileSystem for DryRunFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.removed.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was moved earlier in this run", path.display()),
            ));
        }
        match self.contents.get(path) {
            Some(contents) => Ok(contents.clone()),
            None => fs::read_to_string(path),
        }
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        debug!("[dry-run] write {} ({} bytes)", path.display(), contents.len());
        self.removed.remove(path);
        self.contents.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        if !path.is_dir() && self.dirs.insert(path.to_path_buf()) {
            info!("Would create directory {}", path.display());
        }
        Ok(())
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = self.read_to_string(from)?;
        self.contents.remove(from);
        self.removed.insert(from.to_path_buf());
        self.removed.remove(to);
        self.contents.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
