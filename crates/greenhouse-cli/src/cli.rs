use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "greenhouse")]
#[command(about = "Record greenhouse field observations offline and sync them later")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the local queue
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend for the queue
    #[arg(long, global = true, value_enum, default_value_t = StorageBackend::File)]
    pub backend: StorageBackend,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a new observation to the offline queue
    #[command(alias = "new")]
    Add {
        /// Crop type (e.g. tomato, cucumber)
        #[arg(long, default_value = "tomato")]
        crop: String,
        /// Growth stage (e.g. seedling, flowering)
        #[arg(long, default_value = "flowering")]
        stage: String,
        /// Plant height in centimetres
        #[arg(long, allow_negative_numbers = true)]
        height: f64,
        /// Number of pests counted
        #[arg(long, allow_negative_numbers = true)]
        pests: Option<i64>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List queued observations, newest first
    List {
        /// Only show records waiting for upload
        #[arg(long)]
        pending: bool,
        /// Maximum number of records to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show pending and synced counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload pending observations to the greenhouse backend
    Sync {
        /// Mark every record synced without contacting the backend
        #[arg(long)]
        mark_only: bool,
        /// API base URL (overrides GREENHOUSE_API_BASE_URL)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove observations that were already uploaded
    ClearSynced {
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StorageBackend {
    /// One JSON file per key
    File,
    /// Local libSQL database
    Libsql,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
