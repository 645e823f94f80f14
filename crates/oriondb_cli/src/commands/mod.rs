//! CLI command implementations.

pub mod inspect;
pub mod records;
pub mod verify;

use oriondb_core::{Config, Database};
use std::path::Path;

/// Opens an existing database; the CLI never creates one implicitly.
fn open_database(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    let config = Config::new().create_if_missing(false);
    Ok(Database::open_with_config(path, config)?)
}

/// Formats a byte count for humans.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
