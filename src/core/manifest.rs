//! Source manifest (package.json) reading
//!
//! Only the fields the pipeline needs are modeled: project identity, the
//! module format flag and the runtime dependency set. Everything else in the
//! file is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::infra::filesystem::FileSystem;

/// Node module format (`type` field of package.json)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// ECMAScript modules
    Module,
    /// CommonJS
    Commonjs,
}

impl ModuleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Commonjs => "commonjs",
        }
    }
}

impl std::str::FromStr for ModuleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" | "esm" => Ok(Self::Module),
            "commonjs" | "cjs" => Ok(Self::Commonjs),
            other => Err(format!("unknown module format '{other}' (expected module or commonjs)")),
        }
    }
}

/// The project's own dependency declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceManifest {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Module format flag; absent means the runtime default
    #[serde(default, rename = "type")]
    pub module_format: Option<ModuleFormat>,

    /// Runtime dependencies: name -> version constraint
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl SourceManifest {
    /// Read and parse a manifest from disk
    pub fn read(fs: &dyn FileSystem, path: &Path) -> Result<Self, ManifestError> {
        if !fs.exists(path) {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs.read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_json(&content).map_err(|e| ManifestError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a manifest from a JSON string
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
