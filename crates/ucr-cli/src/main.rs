//! UCR CLI: the `ucr` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Modules { config, json } => commands::modules::run(config, json),

        Commands::Check {
            record,
            module,
            config,
            json,
        } => commands::check::run(record, module, config, json),

        Commands::Score { record, json } => commands::score::run(record, json),

        Commands::Scan { record, text, json } => commands::scan::run(record, text, json),

        Commands::Save {
            record,
            store,
            json,
        } => commands::save::run(record, store, json),

        Commands::History {
            lineage,
            store,
            json,
        } => commands::history::run(lineage, store, json),

        Commands::Diff {
            lineage,
            from,
            to,
            store,
            json,
        } => commands::diff::run(lineage, from, to, store, json),

        Commands::Restore {
            lineage,
            version,
            store,
            json,
        } => commands::restore::run(lineage, version, store, json),
    }
}

/// Logs go to stderr so `--json` stdout stays parseable. `RUST_LOG` overrides
/// the default `warn` filter.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
