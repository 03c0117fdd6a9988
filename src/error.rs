//! Error types for distforge
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Source manifest (package.json) errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file does not exist
    #[error("Manifest not found at '{path}'")]
    NotFound { path: PathBuf },

    /// Manifest content does not have the expected shape
    #[error("Malformed manifest '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// Manifest exists but could not be read
    #[error("IO error reading manifest '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Pipeline configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Config file could not be parsed
    #[error("Failed to parse config '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Native registry uses an unknown schema version
    #[error("Unsupported native registry version {found} (supported: {supported})")]
    UnsupportedRegistryVersion { found: u32, supported: u32 },

    /// Same native dependency declared twice
    #[error("Native dependency '{name}' is declared more than once")]
    DuplicateNativeDependency { name: String },

    /// Native dependency minimum is not a valid constraint
    #[error("Native dependency '{name}' has invalid min_version '{constraint}': {reason}")]
    InvalidNativeConstraint {
        name: String,
        constraint: String,
        reason: String,
    },

    /// Output directory would wipe the project
    #[error("Output directory '{path}' must not be the project root or one of its parents")]
    UnsafeOutputDir { path: PathBuf },

    /// Output directory would wipe or recurse into backend sources
    #[error("Output directory '{path}' overlaps backend source directory '{source_dir}'")]
    OutputOverlapsSources { path: PathBuf, source_dir: PathBuf },

    /// Invalid value for a setting
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Stage execution errors (external process and filesystem failures)
#[derive(Error, Debug)]
pub enum StageError {
    /// External tool exited unsuccessfully
    #[error("'{program}' exited with {}: {diagnostic}", code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        diagnostic: String,
    },

    /// External tool could not be started
    #[error("Failed to execute '{program}': {error}. Is it installed?")]
    Spawn { program: String, error: String },

    /// Required directory missing from the project
    #[error("Required directory '{path}' does not exist")]
    MissingDirectory { path: PathBuf },

    /// Required file missing from the project
    #[error("Required file '{path}' does not exist")]
    MissingFile { path: PathBuf },

    /// Filesystem operation failed
    #[error("{0}")]
    Io(#[from] FilesystemError),

    /// Production manifest could not be written
    #[error("{0}")]
    Serialization(#[from] SerializationError),
}

/// Production manifest could not be written
#[derive(Error, Debug)]
pub enum SerializationError {
    /// JSON encoding failed
    #[error("Failed to encode production manifest: {error}")]
    Encode { error: String },

    /// Output path not writable
    #[error("Failed to write production manifest to '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Verification gate errors
#[derive(Error, Debug)]
pub enum VerificationError {
    /// One or more checks failed
    #[error("{failed} of {total} deployment checks failed")]
    ChecksFailed { failed: usize, total: usize },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file or tree
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Top-level distforge error type
#[derive(Error, Debug)]
pub enum DistforgeError {
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Config error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A build stage failed
    #[error("Stage '{stage}' failed: {diagnostic}")]
    StageFailed { stage: String, diagnostic: String },

    /// Serialization error
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Verification error
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl DistforgeError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Manifest(_) => 3,
            Self::StageFailed { .. } => 4,
            Self::Serialization(_) => 5,
            Self::Verification(_) => 6,
            Self::Config(_) | Self::Filesystem(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_failure_class() {
        let manifest = DistforgeError::from(ManifestError::NotFound {
            path: PathBuf::from("package.json"),
        });
        let stage = DistforgeError::StageFailed {
            stage: "frontend".to_string(),
            diagnostic: "boom".to_string(),
        };
        let verification = DistforgeError::from(VerificationError::ChecksFailed {
            failed: 1,
            total: 3,
        });

        assert_eq!(manifest.exit_code(), 3);
        assert_eq!(stage.exit_code(), 4);
        assert_eq!(verification.exit_code(), 6);
    }

    #[test]
    fn test_process_failed_message_keeps_diagnostic() {
        let err = StageError::ProcessFailed {
            program: "npx".to_string(),
            code: Some(2),
            diagnostic: "src/App.tsx:3:1: ERROR: Unexpected }".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code 2"));
        assert!(msg.contains("src/App.tsx:3:1: ERROR: Unexpected }"));
    }

    #[test]
    fn test_wrapped_errors_report_message_once() {
        let err = anyhow::Error::from(DistforgeError::from(VerificationError::ChecksFailed {
            failed: 1,
            total: 2,
        }));

        assert_eq!(err.to_string(), "1 of 2 deployment checks failed");
        assert_eq!(err.chain().count(), 1);
    }
}
