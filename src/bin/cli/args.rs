//! CLI Argument Structures
//!
//! Argument definitions for the mvpkg binary.

use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Move a Go package and update every import of it
#[derive(Parser, Debug)]
#[command(name = "mvpkg")]
#[command(version = VERSION)]
#[command(about = "Move a Go package to a new directory and fix its importers")]
#[command(long_about = "
Move a Go package to another directory inside its module. Every package
importing it is updated, qualified references follow a package-name change,
and the package's own files (including its external _test package) move
together.

Common Usage:

  # Move a package, renaming it after the new directory
  mvpkg source/testpkg destination/testpkg2

  # Move a package and everything below it
  mvpkg -r source/testpkg destination/testpkg

  # Show what would happen without touching any file
  mvpkg --dry-run source/testpkg destination/testpkg2

  # Include files behind a build tag
  mvpkg --build-flags=-tags=integration source/a dest/a
")]
pub struct Cli {
    /// Source package directory, relative to the module root
    pub source: String,

    /// Destination package directory, relative to the module root
    pub destination: String,

    /// Print the actions without executing them
    #[arg(long, env = "MVPKG_DRY_RUN")]
    pub dry_run: bool,

    /// Also move every package below the source directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Enable verbose logging for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Build flag passed to the package loader (repeatable)
    #[arg(long = "build-flags", value_name = "FLAG", allow_hyphen_values = true)]
    pub build_flags: Vec<String>,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target operating system for build constraints
    #[arg(long, env = "GOOS")]
    pub goos: Option<String>,

    /// Target architecture for build constraints
    #[arg(long, env = "GOARCH")]
    pub goarch: Option<String>,

    /// Whether cgo files take part in the build (0 or 1)
    #[arg(long = "cgo-enabled", env = "CGO_ENABLED", value_name = "0|1", hide = true)]
    pub cgo_enabled: Option<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Directory to start module discovery from
    #[arg(short = 'C', long = "directory", value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeatable_build_flags() {
        let cli = Cli::try_parse_from([
            "mvpkg",
            "--build-flags",
            "-tags=a",
            "--build-flags=-tags=b",
            "-r",
            "src",
            "dst",
        ])
        .unwrap();
        assert_eq!(cli.build_flags, vec!["-tags=a", "-tags=b"]);
        assert!(cli.recursive);
        assert_eq!(cli.source, "src");
        assert_eq!(cli.destination, "dst");
    }

    #[test]
    fn test_requires_both_paths() {
        assert!(Cli::try_parse_from(["mvpkg", "only-source"]).is_err());
    }
}
