//! mvpkg CLI - move a Go package and fix everything that imports it.

use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli::build_config(&cli)?;
    cli::init_logging(cli.verbose, config.dry_run);

    cli::run_move(&cli, &config)
}
