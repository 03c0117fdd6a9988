//! CLI implementation for `distforge clean` command
//!
//! Removes the configured output directory.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::print_success;
use crate::core::clean::clean_output;
use crate::core::config::PipelineConfig;
use crate::error::DistforgeError;
use crate::infra::filesystem::LocalFs;

/// Execute the clean command
pub async fn execute(project_dir: &Path, config: &PipelineConfig) -> Result<()> {
    config.validate(project_dir).map_err(DistforgeError::from)?;
    let output_dir = config.output_dir(project_dir);

    let result = clean_output(&LocalFs, &output_dir)
        .with_context(|| format!("Failed to clean {}", output_dir.display()))?;

    if result.removed.is_empty() {
        print_success("Nothing to clean");
    } else {
        for dir in &result.removed {
            print_success(&format!("Removed {dir}"));
        }
    }

    Ok(())
}
