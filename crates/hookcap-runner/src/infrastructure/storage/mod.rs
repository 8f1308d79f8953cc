//! Filesystem concerns: configuration persistence and workspace bootstrap.

use std::io;
use std::path::Path;

use tracing::debug;

pub mod config;

/// Creates the helper output directory if it does not exist yet.
///
/// Called once per run, before the first build writes into it.
///
/// # Errors
///
/// Propagates the underlying I/O error when the directory cannot be
/// created.
pub fn ensure_output_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        debug!("created output directory {}", path.display());
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
