//! Command execution for the mvpkg binary.

use anyhow::{bail, Context};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mvpkg_rs::{move_package, MoverConfig};

use super::args::Cli;

/// Install the tracing subscriber.
///
/// Verbose runs log at DEBUG, dry runs at INFO so the projected actions are
/// visible, anything else only at WARN. `RUST_LOG` takes precedence.
pub fn init_logging(verbose: bool, dry_run: bool) {
    let default_level = if verbose {
        "debug"
    } else if dry_run {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the optional config file with command-line flags.
///
/// Flags win: booleans are OR-ed in, build flags are appended, platform
/// overrides replace the file's values.
pub fn build_config(cli: &Cli) -> anyhow::Result<MoverConfig> {
    let mut config = match &cli.config {
        Some(path) => MoverConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MoverConfig::default(),
    };

    config.dry_run |= cli.dry_run;
    config.recursive |= cli.recursive;
    config.build_flags.extend(cli.build_flags.iter().cloned());
    if let Some(goos) = &cli.goos {
        config.goos = Some(goos.clone());
    }
    if let Some(goarch) = &cli.goarch {
        config.goarch = Some(goarch.clone());
    }
    if let Some(cgo) = &cli.cgo_enabled {
        config.cgo_enabled = Some(parse_cgo_enabled(cgo)?);
    }

    config.validate()?;
    Ok(config)
}

fn parse_cgo_enabled(value: &str) -> anyhow::Result<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => bail!("invalid CGO_ENABLED value '{other}'"),
    }
}

/// Run the move described by `cli` with an already built configuration.
pub fn run_move(cli: &Cli, config: &MoverConfig) -> anyhow::Result<()> {
    debug!("Configuration: {config:?}");
    let report = move_package(&cli.directory, &cli.source, &cli.destination, config)
        .with_context(|| format!("failed to move {} to {}", cli.source, cli.destination))?;

    if cli.json {
        println!("{}", report.to_json()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_flags_extend_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mvpkg.yml");
        std::fs::write(&path, "recursive: true\nbuild_flags:\n  - -tags=a\n").unwrap();

        let cli = Cli::try_parse_from([
            "mvpkg",
            "--config",
            path.to_str().unwrap(),
            "--dry-run",
            "--build-flags=-tags=b",
            "src",
            "dst",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert!(config.recursive);
        assert!(config.dry_run);
        assert_eq!(config.build_flags, vec!["-tags=a", "-tags=b"]);
    }

    #[test]
    fn test_parse_cgo_enabled() {
        assert!(parse_cgo_enabled("1").unwrap());
        assert!(!parse_cgo_enabled("0").unwrap());
        assert!(parse_cgo_enabled("maybe").is_err());
    }
}
