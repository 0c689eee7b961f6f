use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ucr",
    about = "UCR: governance checks, quality scoring and snapshot history for Context Records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered modules and their requirements
    Modules {
        /// Module requirements TOML (defaults to the built-in registry)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the lifecycle gate and preflight for one module, with an audit trace
    Check {
        /// Path to a Context Record JSON file
        record: String,

        /// Module ID to admit the record for
        #[arg(long)]
        module: String,

        /// Module requirements TOML (defaults to the built-in registry)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the quality score of a record
    Score {
        /// Path to a Context Record JSON file
        record: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan candidate text against the record's negative scope and competitors
    Scan {
        /// Path to a Context Record JSON file
        record: String,

        /// Candidate text to scan
        #[arg(long)]
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save a record as the next snapshot of its lineage
    Save {
        /// Path to a Context Record JSON file
        record: String,

        /// Path to snapshot history JSONL
        #[arg(long, default_value = ".ucr/history.jsonl")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the snapshot versions of a lineage
    History {
        /// Lineage ID (UUID)
        lineage: String,

        /// Path to snapshot history JSONL
        #[arg(long, default_value = ".ucr/history.jsonl")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Field-level diff between two versions of a lineage
    Diff {
        /// Lineage ID (UUID)
        lineage: String,

        /// Version to diff from
        from: u64,

        /// Version to diff to
        to: u64,

        /// Path to snapshot history JSONL
        #[arg(long, default_value = ".ucr/history.jsonl")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore an older version as a new snapshot
    Restore {
        /// Lineage ID (UUID)
        lineage: String,

        /// Version to restore
        version: u64,

        /// Path to snapshot history JSONL
        #[arg(long, default_value = ".ucr/history.jsonl")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
