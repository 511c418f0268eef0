//! Configuration types for a move run.
//!
//! `MoverConfig` can be built in code, loaded from YAML, or assembled by the
//! CLI from flags and environment variables.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{MvpkgError, Result};
use crate::lang::build::{BuildContext, KNOWN_ARCH, KNOWN_OS};

/// Options for one `move_package` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverConfig {
    /// Report actions without touching the disk
    pub dry_run: bool,

    /// Also move every package below the source directory
    pub recursive: bool,

    /// Build flags forwarded to the graph loader (`-tags=...`)
    pub build_flags: Vec<String>,

    /// Target OS; host OS when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goos: Option<String>,

    /// Target architecture; host architecture when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goarch: Option<String>,

    /// Whether cgo files take part in the build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgo_enabled: Option<bool>,
}

impl MoverConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MvpkgError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            MvpkgError::io(format!("Failed to write config file: {}", path.display()), e)
        })
    }

    /// Builder: toggle dry-run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: toggle recursive moves
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Builder: append a build flag
    pub fn with_build_flag(mut self, flag: impl Into<String>) -> Self {
        self.build_flags.push(flag.into());
        self
    }

    /// Builder: set the target OS
    pub fn with_goos(mut self, goos: impl Into<String>) -> Self {
        self.goos = Some(goos.into());
        self
    }

    /// Builder: set the target architecture
    pub fn with_goarch(mut self, goarch: impl Into<String>) -> Self {
        self.goarch = Some(goarch.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(goos) = &self.goos {
            if !KNOWN_OS.contains(&goos.as_str()) {
                return Err(MvpkgError::config_field(
                    format!("unknown GOOS '{goos}'"),
                    "goos",
                ));
            }
        }
        if let Some(goarch) = &self.goarch {
            if !KNOWN_ARCH.contains(&goarch.as_str()) {
                return Err(MvpkgError::config_field(
                    format!("unknown GOARCH '{goarch}'"),
                    "goarch",
                ));
            }
        }
        parse_build_tags(&self.build_flags)?;
        Ok(())
    }

    /// Build context the graph loader evaluates constraints against.
    pub fn build_context(&self) -> Result<BuildContext> {
        let host = BuildContext::host();
        let mut ctx = host.clone();
        if let Some(goos) = &self.goos {
            ctx.goos = goos.clone();
        }
        if let Some(goarch) = &self.goarch {
            ctx.goarch = goarch.clone();
        }
        ctx.cgo = self
            .cgo_enabled
            .unwrap_or(ctx.goos == host.goos && ctx.goarch == host.goarch);
        ctx.tags = parse_build_tags(&self.build_flags)?;
        Ok(ctx)
    }
}

/// Extract the tag set from build flags.
///
/// Each element is one command-line argument: `-tags=a,b`, `--tags=a b`, or
/// `-tags` followed by its value in the next element. Anything else is
/// ignored.
pub fn parse_build_tags(flags: &[String]) -> Result<BTreeSet<String>> {
    let mut tags = BTreeSet::new();
    let mut iter = flags.iter();

    while let Some(flag) = iter.next() {
        let flag = flag.trim();
        let value = if let Some(value) = flag
            .strip_prefix("--tags=")
            .or_else(|| flag.strip_prefix("-tags="))
        {
            value
        } else if flag == "-tags" || flag == "--tags" {
            iter.next().map(String::as_str).ok_or_else(|| {
                MvpkgError::config_field("-tags requires a value", "build_flags")
            })?
        } else {
            if !flag.is_empty() {
                debug!("Ignoring build flag {flag}");
            }
            continue;
        };

        tags.extend(
            value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        );
    }

    Ok(tags)
}
