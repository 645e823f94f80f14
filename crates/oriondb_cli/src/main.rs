//! OrionDB CLI
//!
//! Command-line tools for OrionDB databases.
//!
//! # Commands
//!
//! - `inspect` - List collections, schemas and shards
//! - `verify` - Decode every shard and report corruption
//! - `insert`, `search`, `match`, `update`, `remove`, `get` - Record operations

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// OrionDB command-line database tools.
#[derive(Parser)]
#[command(name = "oriondb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List collections, their schemas and shards
    Inspect {
        /// Only inspect this collection
        #[arg(short, long)]
        collection: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Decode every shard of a collection
    Verify {
        /// Collection to verify
        #[arg(short, long)]
        collection: String,
    },

    /// Insert records from a JSON file (one object or an array of objects)
    Insert {
        /// Target collection
        #[arg(short, long)]
        collection: String,

        /// File holding the records
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print records equal to a query
    Search {
        /// Collection to search
        #[arg(short, long)]
        collection: String,

        /// Query object, e.g. '{"id": 7}'
        #[arg(short, long, default_value = "{}")]
        query: String,

        /// Scan shards on a worker pool
        #[arg(long)]
        parallel: bool,
    },

    /// Print records whose field matches a regular expression
    Match {
        /// Collection to scan
        #[arg(short, long)]
        collection: String,

        /// Field to test
        #[arg(long)]
        field: String,

        /// Regular expression
        #[arg(long)]
        pattern: String,
    },

    /// Merge a patch into every record equal to a query
    Update {
        /// Collection to update
        #[arg(short, long)]
        collection: String,

        /// Query object
        #[arg(short, long)]
        query: String,

        /// Fields to set
        #[arg(long)]
        patch: String,
    },

    /// Delete every record equal to a query
    Remove {
        /// Collection to prune
        #[arg(short, long)]
        collection: String,

        /// Query object
        #[arg(short, long)]
        query: String,
    },

    /// Print every record of a collection
    Get {
        /// Collection to read
        #[arg(short, long)]
        collection: String,

        /// Group records by shard
        #[arg(long)]
        grouped: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("OrionDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("OrionDB Core v{}", oriondb_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Database path required (--path)")?;
    match cli.command {
        Commands::Inspect { collection, format } => {
            commands::inspect::run(&path, collection.as_deref(), format == Format::Json)?;
        }
        Commands::Verify { collection } => {
            commands::verify::run(&path, &collection)?;
        }
        Commands::Insert { collection, file } => {
            commands::records::insert(&path, &collection, &file)?;
        }
        Commands::Search {
            collection,
            query,
            parallel,
        } => {
            commands::records::search(&path, &collection, &query, parallel)?;
        }
        Commands::Match {
            collection,
            field,
            pattern,
        } => {
            commands::records::match_field(&path, &collection, &field, &pattern)?;
        }
        Commands::Update {
            collection,
            query,
            patch,
        } => {
            commands::records::update(&path, &collection, &query, &patch)?;
        }
        Commands::Remove { collection, query } => {
            commands::records::remove(&path, &collection, &query)?;
        }
        Commands::Get {
            collection,
            grouped,
        } => {
            commands::records::get(&path, &collection, grouped)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
