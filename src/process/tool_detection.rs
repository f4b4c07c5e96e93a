//! External tool detection.
//!
//! The pipeline needs the SAM CLI for packaging and the AWS CLI for storage
//! operations. Both are looked up on `PATH` before any stage runs, so a missing
//! tool fails the run before anything is uploaded.

use crate::error::{CliError, Result};
use std::path::PathBuf;

/// Resolves every executable in `tools`, failing on the first one missing.
///
/// Returns the resolved paths in the order given.
pub fn ensure_tools_available(tools: &[&str]) -> Result<Vec<PathBuf>> {
    tools.iter().map(|tool| locate(tool)).collect()
}

fn locate(tool: &str) -> Result<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {tool} at: {}", path.display());
            Ok(path)
        }
        Err(e) => {
            log::debug!("{tool} not found in PATH: {e}");
            Err(CliError::MissingTool {
                tool: tool.to_string(),
                reason: format!("{e}; install it or pass its location explicitly"),
            }
            .into())
        }
    }
}
