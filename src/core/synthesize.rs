//! Production manifest synthesis
//!
//! Derives the package.json shipped with the build. Whatever the policy,
//! every registered native dependency ends up in `dependencies` with a
//! constraint that satisfies its minimum: bundlers cannot see how native
//! modules are loaded, so their static analysis is never trusted here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::artifacts;
use crate::core::backend::BackendStrategy;
use crate::core::config::{ManifestPolicy, PipelineConfig};
use crate::core::manifest::{ModuleFormat, SourceManifest};
use crate::core::native::NativeRegistry;
use crate::core::stage::{BuildStage, StageContext};
use crate::core::version::constraint_meets_minimum;
use crate::error::{SerializationError, StageError};
use crate::infra::filesystem::FileSystem;

/// `scripts` block of the production manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scripts {
    pub start: String,
}

/// The package.json written to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionManifest {
    pub name: String,
    pub version: String,

    #[serde(rename = "type")]
    pub module_format: ModuleFormat,

    pub scripts: Scripts,

    pub dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub engines: BTreeMap<String, String>,
}

/// Strategy-dependent fields of the production manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTarget {
    pub module_format: ModuleFormat,
    pub start_command: String,
    pub engines: BTreeMap<String, String>,
}

impl ManifestTarget {
    /// Derive the target from the configured backend strategy
    ///
    /// Source-copy output runs unbundled sources, so it pins a runtime
    /// engine unless `[manifest.engines]` is configured.
    pub fn for_strategy(
        strategy: &BackendStrategy,
        config: &PipelineConfig,
        source: &SourceManifest,
    ) -> Self {
        let mut engines = config.manifest.engines.clone();
        if engines.is_empty() && matches!(strategy, BackendStrategy::SourceCopy { .. }) {
            let (runtime, constraint) = defaults::SOURCE_COPY_ENGINE;
            engines.insert(runtime.to_string(), constraint.to_string());
        }

        Self {
            module_format: strategy.module_format(config, source),
            start_command: strategy.start_command(config),
            engines,
        }
    }
}

/// Build the production manifest
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use distforge::core::config::ManifestPolicy;
/// use distforge::core::manifest::{ModuleFormat, SourceManifest};
/// use distforge::core::native::{NativeDependencySpec, NativeRegistry};
/// use distforge::core::synthesize::{synthesize, ManifestTarget};
///
/// let source = SourceManifest::from_json(
///     r#"{"name": "app", "version": "1.0.0", "dependencies": {"framework": "^2.0.0"}}"#,
/// ).unwrap();
/// let registry = NativeRegistry::new(vec![NativeDependencySpec::new("nativehash", "^6.0.0")]).unwrap();
/// let target = ManifestTarget {
///     module_format: ModuleFormat::Module,
///     start_command: "node index.js".to_string(),
///     engines: BTreeMap::new(),
/// };
///
/// let minimal = synthesize(&source, &registry, ManifestPolicy::Minimal, &target);
/// assert_eq!(minimal.dependencies.len(), 1);
/// assert_eq!(minimal.dependencies["nativehash"], "^6.0.0");
/// ```
pub fn synthesize(
    source: &SourceManifest,
    registry: &NativeRegistry,
    policy: ManifestPolicy,
    target: &ManifestTarget,
) -> ProductionManifest {
    let mut dependencies = match policy {
        ManifestPolicy::Minimal => BTreeMap::new(),
        ManifestPolicy::Full => source.dependencies.clone(),
    };

    for spec in registry.list() {
        match dependencies.get(&spec.name) {
            Some(declared) => match constraint_meets_minimum(declared, &spec.min_version) {
                Ok(true) => {
                    tracing::debug!("Keeping declared {}@{declared}", spec.name);
                    continue;
                }
                Ok(false) => tracing::warn!(
                    "{}@{declared} is below the required {}; using the minimum",
                    spec.name,
                    spec.min_version
                ),
                Err(e) => tracing::warn!(
                    "Cannot interpret {}@{declared} ({e}); using {}",
                    spec.name,
                    spec.min_version
                ),
            },
            None => tracing::info!(
                "Forcing native dependency {}@{} into production manifest",
                spec.name,
                spec.min_version
            ),
        }
        dependencies.insert(spec.name.clone(), spec.min_version.clone());
    }

    ProductionManifest {
        name: source.name.clone(),
        version: source.version.clone(),
        module_format: target.module_format,
        scripts: Scripts {
            start: target.start_command.clone(),
        },
        dependencies,
        engines: target.engines.clone(),
    }
}

impl ProductionManifest {
    /// Pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String, SerializationError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| SerializationError::Encode {
                error: e.to_string(),
            })
    }

    /// Serialize into `output_dir`, returning the written path
    pub fn write(
        &self,
        fs: &dyn FileSystem,
        output_dir: &Path,
    ) -> Result<PathBuf, SerializationError> {
        let path = output_dir.join(defaults::PRODUCTION_MANIFEST);
        let json = self.to_json()?;
        fs.write_file(&path, &json)
            .map_err(|e| SerializationError::Write {
                path: path.clone(),
                error: e.to_string(),
            })?;
        Ok(path)
    }
}

/// Synthesizes and writes the production manifest plus auxiliary artifacts
pub struct ManifestStage<'a> {
    pub source: &'a SourceManifest,
    pub registry: &'a NativeRegistry,
    pub policy: ManifestPolicy,
    pub target: ManifestTarget,
}

impl ManifestStage<'_> {
    pub const NAME: &'static str = "manifest";

    /// The manifest this stage writes
    pub fn manifest(&self) -> ProductionManifest {
        synthesize(self.source, self.registry, self.policy, &self.target)
    }
}

impl BuildStage for ManifestStage<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<String, StageError> {
        let manifest = self.manifest();
        let path = manifest.write(ctx.fs, ctx.output_dir)?;
        tracing::info!(
            "Wrote {} ({} policy, {} dependencies)",
            path.display(),
            self.policy.as_str(),
            manifest.dependencies.len()
        );

        let copied = artifacts::copy_auxiliary_files(
            ctx.fs,
            ctx.project_dir,
            ctx.output_dir,
            &ctx.config.build.auxiliary_files,
        )?;

        if ctx.config.deploy.notes {
            let notes = artifacts::deployment_notes(&manifest, self.registry, ctx.config);
            ctx.fs
                .write_file(&ctx.output_dir.join(defaults::DEPLOY_NOTES), &notes)?;
        }

        let mut summary = format!(
            "{} dependencies ({} policy)",
            manifest.dependencies.len(),
            self.policy.as_str()
        );
        if !copied.is_empty() {
            summary.push_str(&format!(", copied {}", copied.join(", ")));
        }
        Ok(summary)
    }
}
