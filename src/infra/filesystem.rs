//! Filesystem operations
//!
//! Handles file and directory operations behind the [`FileSystem`] trait so
//! that pipeline stages can be exercised against alternative implementations.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Filesystem handle passed to every pipeline stage
pub trait FileSystem {
    /// Whether the path exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether the path is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<(), FilesystemError>;

    /// Remove a directory and all its contents (no-op when absent)
    fn remove_dir_all(&self, path: &Path) -> Result<(), FilesystemError>;

    /// Write content to a file, creating parent directories
    fn write_file(&self, path: &Path, content: &str) -> Result<(), FilesystemError>;

    /// Read a file into a string
    fn read_to_string(&self, path: &Path) -> Result<String, FilesystemError>;

    /// Copy a single file, creating parent directories of the destination
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FilesystemError>;

    /// Recursively copy a directory tree; returns the number of files copied
    fn copy_tree(&self, from: &Path, to: &Path) -> Result<usize, FilesystemError>;
}

/// The real, local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
        create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
        remove_dir_all(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FilesystemError> {
        write_file(path, content)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FilesystemError> {
        read_file(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FilesystemError> {
        if let Some(parent) = to.parent() {
            create_dir_all(parent)?;
        }
        std::fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| copy_error(from, to, &e.to_string()))
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<usize, FilesystemError> {
        let mut copied = 0;

        for entry in WalkDir::new(from).follow_links(false) {
            let entry = entry.map_err(|e| copy_error(from, to, &e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .map_err(|e| copy_error(from, to, &e.to_string()))?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                create_dir_all(&target)?;
            } else {
                self.copy_file(entry.path(), &target)?;
                copied += 1;
            }
        }

        Ok(copied)
    }
}

fn copy_error(from: &Path, to: &Path, error: &str) -> FilesystemError {
    FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: error.to_string(),
    }
}

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Lexically normalize a path (resolves `.` and `..` without touching disk)
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
