//! Shared fixtures for integration tests: throwaway Go modules on disk.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

/// A Go module in a temporary directory.
pub struct GoFixture {
    dir: TempDir,
}

impl GoFixture {
    /// Create a module with the given path.
    pub fn new(module: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let fixture = Self { dir };
        fixture.write("go.mod", &format!("module {module}\n\ngo 1.21\n"));
        fixture
    }

    /// Module root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a module-relative file.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
        fs::write(path, contents).expect("write fixture file");
        self
    }

    /// Create an empty directory.
    pub fn mkdir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.path(rel)).expect("create dir");
        self
    }

    /// Read a module-relative file.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
    }

    /// Whether a module-relative path exists.
    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every file and directory below the root, with file contents.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        WalkDir::new(self.root())
            .into_iter()
            .map(|entry| entry.expect("walk fixture"))
            .map(|entry| {
                let contents = entry
                    .file_type()
                    .is_file()
                    .then(|| fs::read(entry.path()).expect("read fixture file"));
                (entry.path().to_path_buf(), contents)
            })
            .collect()
    }
}

pub const TESTPKG: &str = r#"package testpkg

// Foo returns a greeting.
func Foo() string {
	return "foo"
}
"#;

pub const USER: &str = r#"package user

import (
	"fmt"

	"example.com/source/testpkg"
)

type holder struct {
	Name string
}

func Use() {
	fmt.Println(testpkg.Foo())
}

func Shadow(testpkg holder) string {
	return testpkg.Name
}

func Later() string {
	var h holder
	{
		testpkg := h
		_ = testpkg.Name
	}
	return testpkg.Foo()
}
"#;

pub const HELPER: &str = r#"package user

import "strings"

func upper(s string) string {
	return strings.ToUpper(s)
}
"#;

pub const OTHER: &str = r#"package other

import "fmt"

func Print() {
	fmt.Println("other")
}
"#;

/// Module `example.com` with `source/testpkg`, an importer and a bystander.
pub fn scenario_module() -> GoFixture {
    let fixture = GoFixture::new("example.com");
    fixture
        .write("source/testpkg/testpkg.go", TESTPKG)
        .write("user/user.go", USER)
        .write("user/helper.go", HELPER)
        .write("other/other.go", OTHER);
    fixture
}
