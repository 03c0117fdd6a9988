//! Pipeline configuration (distforge.toml)
//!
//! The file is optional: every section falls back to defaults that match a
//! Vite frontend plus an esbuild-bundled Node backend. String values support
//! `${VAR}` environment substitution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::manifest::ModuleFormat;
use crate::core::native::{NativeDependencySpec, NativeRegistry};
use crate::error::ConfigError;
use crate::infra::filesystem::normalize;

/// Backend build strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Bundle the backend entry, keeping native dependencies external
    #[default]
    Bundle,
    /// Ship backend and shared sources verbatim
    SourceCopy,
}

impl StrategyKind {
    /// Manifest policy matching this strategy
    pub fn default_policy(self) -> ManifestPolicy {
        match self {
            Self::Bundle => ManifestPolicy::Minimal,
            Self::SourceCopy => ManifestPolicy::Full,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundle => "bundle",
            Self::SourceCopy => "source-copy",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bundle" => Ok(Self::Bundle),
            "source-copy" | "source" => Ok(Self::SourceCopy),
            other => Err(format!("unknown strategy '{other}' (expected bundle or source-copy)")),
        }
    }
}

/// Production manifest dependency policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestPolicy {
    /// Only the forced native set
    Minimal,
    /// The entire source dependency set
    Full,
}

impl ManifestPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }
}

impl std::str::FromStr for ManifestPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(Self::Minimal),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown policy '{other}' (expected minimal or full)")),
        }
    }
}

/// Bundler output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    #[default]
    Esm,
    Cjs,
}

impl BundleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Cjs => "cjs",
        }
    }

    /// Module format the bundled output requires at runtime
    pub fn module_format(self) -> ModuleFormat {
        match self {
            Self::Esm => ModuleFormat::Module,
            Self::Cjs => ModuleFormat::Commonjs,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub build: BuildSection,
    pub frontend: FrontendSection,
    pub backend: BackendSection,
    pub manifest: ManifestSection,
    pub native: NativeSection,
    pub verify: VerifySection,
    pub deploy: DeploySection,
}

/// `[build]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Output directory, relative to the project root
    pub output_dir: PathBuf,

    /// Backend strategy
    pub strategy: StrategyKind,

    /// Manifest policy; derived from the strategy when unset
    pub policy: Option<ManifestPolicy>,

    /// Configuration files copied into the output when present
    pub auxiliary_files: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            strategy: StrategyKind::default(),
            policy: None,
            auxiliary_files: to_strings(defaults::AUXILIARY_FILES),
        }
    }
}

/// `[frontend]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendSection {
    pub program: String,
    pub args: Vec<String>,

    /// Asset directory the bundler produces, relative to the output dir
    pub assets_dir: PathBuf,
}

impl Default for FrontendSection {
    fn default() -> Self {
        Self {
            program: defaults::FRONTEND_PROGRAM.to_string(),
            args: to_strings(defaults::FRONTEND_ARGS),
            assets_dir: PathBuf::from(defaults::FRONTEND_ASSETS_DIR),
        }
    }
}

/// `[backend]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Entry point, relative to the project root
    pub entry: PathBuf,
    pub platform: String,
    pub target: String,
    pub format: BundleFormat,
    pub bundler_program: String,
    pub bundler_args: Vec<String>,

    /// Native helper modules kept external besides the registry
    pub helper_externals: Vec<String>,

    /// Source trees shipped by the source-copy strategy
    pub source_dirs: Vec<PathBuf>,

    /// Compile-time constant replacements
    pub define: BTreeMap<String, String>,
    pub sourcemap: bool,
    pub minify: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        let mut define = BTreeMap::new();
        define.insert(
            "process.env.NODE_ENV".to_string(),
            "\"production\"".to_string(),
        );

        Self {
            entry: PathBuf::from(defaults::BACKEND_ENTRY),
            platform: defaults::BACKEND_PLATFORM.to_string(),
            target: defaults::BACKEND_TARGET.to_string(),
            format: BundleFormat::default(),
            bundler_program: defaults::BUNDLER_PROGRAM.to_string(),
            bundler_args: to_strings(defaults::BUNDLER_ARGS),
            helper_externals: to_strings(defaults::HELPER_EXTERNALS),
            source_dirs: defaults::SOURCE_DIRS.iter().map(PathBuf::from).collect(),
            define,
            sourcemap: true,
            minify: false,
        }
    }
}

/// `[manifest]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestSection {
    /// Source manifest path, relative to the project root
    pub source: PathBuf,
    pub module_format: Option<ModuleFormat>,
    pub start_command: Option<String>,

    /// Engine constraints, runtime -> version constraint
    pub engines: BTreeMap<String, String>,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            source: PathBuf::from(defaults::SOURCE_MANIFEST),
            module_format: None,
            start_command: None,
            engines: BTreeMap::new(),
        }
    }
}

/// `[native]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSection {
    /// Registry schema version
    pub version: u32,
    pub dependencies: Vec<NativeDependencySpec>,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            version: defaults::NATIVE_REGISTRY_VERSION,
            dependencies: NativeRegistry::builtin().list().to_vec(),
        }
    }
}

/// `[verify]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifySection {
    /// Run the verifier at the end of the pipeline
    pub enabled: bool,

    /// Failed checks fail the pipeline
    pub gate: bool,

    /// Installed module root; `<project>/node_modules` when unset
    pub module_root: Option<PathBuf>,
    pub smoke_test: bool,
    pub runtime: String,
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            enabled: false,
            gate: false,
            module_root: None,
            smoke_test: false,
            runtime: defaults::SMOKE_RUNTIME.to_string(),
        }
    }
}

/// `[deploy]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySection {
    /// Environment variables the application reads at runtime
    pub env: Vec<String>,

    /// Write deployment notes into the output
    pub notes: bool,
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            env: to_strings(defaults::RUNTIME_ENV),
            notes: true,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl PipelineConfig {
    /// Load the project configuration
    ///
    /// An explicitly given path must exist; the default `distforge.toml` is
    /// optional and defaults are used when it is absent.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => project_dir.join(p),
            None => {
                let default_path = project_dir.join(defaults::CONFIG_FILE);
                if !default_path.exists() {
                    tracing::debug!("No {} found, using defaults", defaults::CONFIG_FILE);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            error: e.to_string(),
        })?;

        let config = Self::from_toml(&content, &path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML, substituting `${VAR}` references
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let parse_err = |error: String| ConfigError::Parse {
            path: origin.to_path_buf(),
            error,
        };

        let mut value: toml::Value =
            toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
        substitute_in_value(&mut value);

        Self::deserialize(value).map_err(|e| parse_err(e.to_string()))
    }

    /// Validate settings that serde cannot check on its own
    pub fn validate(&self, project_dir: &Path) -> Result<(), ConfigError> {
        if self.native.version != defaults::NATIVE_REGISTRY_VERSION {
            return Err(ConfigError::UnsupportedRegistryVersion {
                found: self.native.version,
                supported: defaults::NATIVE_REGISTRY_VERSION,
            });
        }

        if self.build.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "build.output_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let project = normalize(&absolute(project_dir));
        let output = normalize(&self.output_dir(project_dir));
        if project.starts_with(&output) {
            return Err(ConfigError::UnsafeOutputDir { path: output });
        }

        for dir in &self.backend.source_dirs {
            let source = normalize(&project.join(dir));
            if output.starts_with(&source) || source.starts_with(&output) {
                return Err(ConfigError::OutputOverlapsSources {
                    path: output,
                    source_dir: source,
                });
            }
        }

        self.registry().map(|_| ())
    }

    /// Validated native registry
    pub fn registry(&self) -> Result<NativeRegistry, ConfigError> {
        NativeRegistry::new(self.native.dependencies.clone())
    }

    /// Effective manifest policy
    pub fn policy(&self) -> ManifestPolicy {
        self.build
            .policy
            .unwrap_or_else(|| self.build.strategy.default_policy())
    }

    /// Absolute output directory
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        absolute(project_dir).join(&self.build.output_dir)
    }

    /// Absolute installed module root used by the in-pipeline verifier
    ///
    /// The output directory is recreated on every build, so the default
    /// looks at the project's own `node_modules`.
    pub fn module_root(&self, project_dir: &Path) -> PathBuf {
        let project = absolute(project_dir);
        match &self.verify.module_root {
            Some(root) => project.join(root),
            None => project.join(defaults::MODULES_DIR),
        }
    }

    /// Full external list for the bundler: registry names then helpers
    pub fn externals(&self) -> Vec<String> {
        let mut externals: Vec<String> = self
            .native
            .dependencies
            .iter()
            .map(|d| d.name.clone())
            .collect();
        for helper in &self.backend.helper_externals {
            if !externals.contains(helper) {
                externals.push(helper.clone());
            }
        }
        externals
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Substitute environment variables in a string using ${VAR} syntax
///
/// Unset variables are replaced with an empty string.
///
/// # Examples
/// ```
/// use distforge::core::config::substitute_env_vars;
///
/// std::env::set_var("DISTFORGE_DOC_VAR", "hello");
/// assert_eq!(substitute_env_vars("prefix_${DISTFORGE_DOC_VAR}_suffix"), "prefix_hello_suffix");
/// std::env::remove_var("DISTFORGE_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> String {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s);
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item);
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v);
            }
        }
        _ => {}
    }
}
