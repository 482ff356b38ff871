mod cli;
mod display;
mod prompts;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use projtrack_core::StoreConfig;

use crate::cli::Cli;
use crate::prompts::{InquirePrompter, LinePrompter};
use crate::shell::Shell;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = StoreConfig::load(cli.config.as_deref())
        .context("Failed to load store configuration")?
        .with_overrides(cli.projects_file.clone(), cli.tasks_file.clone());
    info!(
        projects = %config.projects_file.display(),
        tasks = %config.tasks_file.display(),
        "using stores"
    );

    let today = chrono::Local::now().date_naive();
    if cli.plain || !io::stdin().is_terminal() {
        let stdin = io::stdin();
        Shell::new(LinePrompter::new(stdin.lock(), io::stdout()), config, today)
            .run()
            .context("Interactive session failed")?;
    } else {
        Shell::new(InquirePrompter, config, today)
            .run()
            .context("Interactive session failed")?;
    }

    Ok(())
}

/// Log lines go to stderr; `RUST_LOG` wins over `-v`
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
