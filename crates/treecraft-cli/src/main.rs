//! Treecraft CLI: the `treecraft` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TREECRAFT_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let settings = support::settings_or_exit(&cli.global);

    match cli.command {
        Commands::Tree { command } => commands::tree::run(command, &settings),

        Commands::Node { command } => commands::node::run(command, &settings),

        Commands::Validate { tree_id, json } => commands::validate::run(tree_id, json, &settings),

        Commands::Export { tree_id, out } => commands::exchange::run_export(tree_id, out, &settings),

        Commands::Import {
            file,
            no_validate,
            json,
        } => commands::exchange::run_import(file, no_validate, json, &settings),
    }
}

/// Logs go to stderr so `--json` stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
