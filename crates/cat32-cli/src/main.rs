//! cat32 CLI - canonical keys and bucket assignment from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod input;
mod output;

use commands::{assign, canonicalize};
use output::FormatArgs;

#[derive(Parser)]
#[command(name = "cat32")]
#[command(about = "Deterministic canonical keys and 32-way categorization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign input text to a bucket
    Assign {
        /// Input text; words are joined with single spaces (stdin if omitted)
        key: Vec<String>,
        /// Domain separation salt
        #[arg(long)]
        salt: Option<String>,
        /// Sub-domain separation namespace; the default empty namespace still
        /// selects the salt-and-namespace key prefix
        #[arg(long, default_value = "")]
        namespace: String,
        /// Unicode normalization: none, nfc, nfd, nfkc or nfkd
        #[arg(long, default_value = "nfkc")]
        normalize: String,
        #[command(flatten)]
        format: FormatArgs,
    },
    /// Show the canonical key for a JSON document
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        #[command(flatten)]
        format: FormatArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assign {
            key,
            salt,
            namespace,
            normalize,
            format,
        } => assign::run(key, salt, namespace, &normalize, format.resolve()),
        Commands::Canonicalize { input, format } => canonicalize::run(input, format.resolve()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
