//! Native dependency registry
//!
//! Dependencies with compiled, platform-specific code cannot be inlined by a
//! bundler. They are marked external at bundle time, force-included in the
//! production manifest and checked for presence on the deployment host.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::version::parse_constraint;
use crate::error::ConfigError;
use crate::infra::filesystem::FileSystem;

/// A dependency that must never be bundled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDependencySpec {
    /// Package name
    pub name: String,

    /// Minimum acceptable version constraint (e.g. `^6.0.0`)
    pub min_version: String,

    /// Directory to look for under the installed module root (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_path: Option<PathBuf>,
}

impl NativeDependencySpec {
    /// Create a spec whose presence path is its name
    pub fn new(name: &str, min_version: &str) -> Self {
        Self {
            name: name.to_string(),
            min_version: min_version.to_string(),
            presence_path: None,
        }
    }

    /// Path checked under the installed module root
    pub fn presence_path(&self) -> PathBuf {
        self.presence_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }

    /// Command that installs this dependency at its minimum version
    pub fn install_hint(&self) -> String {
        format!("{} {}@{}", defaults::INSTALL_COMMAND, self.name, self.min_version)
    }
}

/// Validated, immutable set of native dependencies for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRegistry {
    specs: Vec<NativeDependencySpec>,
}

impl NativeRegistry {
    /// Build a registry, rejecting duplicate names and unparseable minimums
    pub fn new(specs: Vec<NativeDependencySpec>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateNativeDependency {
                    name: spec.name.clone(),
                });
            }
            parse_constraint(&spec.min_version).map_err(|e| {
                ConfigError::InvalidNativeConstraint {
                    name: spec.name.clone(),
                    constraint: spec.min_version.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(Self { specs })
    }

    /// The built-in registry
    pub fn builtin() -> Self {
        Self {
            specs: defaults::NATIVE_DEPENDENCIES
                .iter()
                .map(|(name, min)| NativeDependencySpec::new(name, min))
                .collect(),
        }
    }

    /// All registered native dependencies
    pub fn list(&self) -> &[NativeDependencySpec] {
        &self.specs
    }

    /// Registered names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Whether the dependency is installed under `module_root`
    pub fn is_present(
        &self,
        fs: &dyn FileSystem,
        spec: &NativeDependencySpec,
        module_root: &Path,
    ) -> bool {
        fs.is_dir(&module_root.join(spec.presence_path()))
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
