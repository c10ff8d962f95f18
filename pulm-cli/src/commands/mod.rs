//! CLI command implementations.

pub mod diff;
pub mod new;
pub mod open;
pub mod save;
pub mod verify;

pub use diff::diff_notes;
pub use new::new_note;
pub use open::open_note;
pub use save::save_note;
pub use verify::verify_notes;

use anyhow::{Context, Result};
use pulm_core::{ConvertConfig, Diagnostic};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = "pulm.yml";

/// Load the configuration, falling back to defaults when no file is given
/// and none exists in the current directory.
pub fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => {
            tracing::debug!("no configuration file, using defaults");
            return Ok(ConvertConfig::default());
        }
    };
    ConvertConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Pretty JSON to `out`, or stdout when absent
pub(crate) fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, payload + "\n")
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", payload);
            Ok(())
        }
    }
}

/// One line per diagnostic on stderr
pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let block = diag
            .block_id
            .as_ref()
            .map(|b| format!(" [{}]", b))
            .unwrap_or_default();
        eprintln!("- {:?} {}{}: {}", diag.severity, diag.code, block, diag.message);
        if let Some(ctx) = &diag.context {
            eprintln!("  context: {}", ctx);
        }
    }
}
