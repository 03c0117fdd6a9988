//! Output directory lifecycle
//!
//! Every build starts from an empty output directory so files from an earlier
//! run never leak into a new deployment. The `clean` command removes it.

use std::path::Path;

use crate::error::FilesystemError;
use crate::infra::filesystem::FileSystem;

/// Result of a clean operation
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<String>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Remove and recreate the output directory
///
/// Returns `true` when a previous output was removed.
pub fn prepare_output_dir(fs: &dyn FileSystem, output_dir: &Path) -> Result<bool, FilesystemError> {
    let existed = fs.exists(output_dir);
    if existed {
        tracing::debug!("Removing previous output {}", output_dir.display());
        fs.remove_dir_all(output_dir)?;
    }
    fs.create_dir_all(output_dir)?;
    Ok(existed)
}

/// Remove the output directory if it exists
pub fn clean_output(fs: &dyn FileSystem, output_dir: &Path) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();
    let name = output_dir.display().to_string();

    if fs.exists(output_dir) {
        fs.remove_dir_all(output_dir)?;
        result.removed.push(name);
    } else {
        result.skipped.push(name);
    }

    Ok(result)
}
