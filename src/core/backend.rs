//! Backend build stage
//!
//! Two interchangeable strategies behind one stage:
//!
//! - [`BackendStrategy::Bundle`] runs the backend bundler on the entry point
//!   with every native dependency (and native helper module) marked external,
//!   so a real install on the target host resolves them.
//! - [`BackendStrategy::SourceCopy`] copies the backend and shared source
//!   trees verbatim and leaves compilation to the deployment host.

use std::path::{Path, PathBuf};

use crate::core::config::{PipelineConfig, StrategyKind};
use crate::core::manifest::{ModuleFormat, SourceManifest};
use crate::core::stage::{BuildStage, StageContext};
use crate::error::StageError;
use crate::infra::process::{run_checked, Invocation};

/// Backend build strategy, selected by configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStrategy {
    /// Bundle the entry point, keeping `externals` unbundled
    Bundle {
        entry: PathBuf,
        externals: Vec<String>,
    },
    /// Copy source trees into the output directory
    SourceCopy { dirs: Vec<PathBuf> },
}

impl BackendStrategy {
    pub const NAME: &'static str = "backend";

    /// Select the strategy from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        match config.build.strategy {
            StrategyKind::Bundle => Self::Bundle {
                entry: config.backend.entry.clone(),
                externals: config.externals(),
            },
            StrategyKind::SourceCopy => Self::SourceCopy {
                dirs: config.backend.source_dirs.clone(),
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Bundle { .. } => StrategyKind::Bundle,
            Self::SourceCopy { .. } => StrategyKind::SourceCopy,
        }
    }

    /// Bundler command line for the bundle strategy
    pub fn bundle_invocation(
        config: &PipelineConfig,
        entry: &Path,
        externals: &[String],
        project_dir: &Path,
        output_dir: &Path,
    ) -> Invocation {
        let backend = &config.backend;
        let mut inv = Invocation::new(&backend.bundler_program)
            .args(backend.bundler_args.iter().cloned())
            .arg(entry.to_string_lossy())
            .arg("--bundle")
            .arg(format!("--platform={}", backend.platform))
            .arg(format!("--format={}", backend.format.as_str()))
            .arg(format!("--target={}", backend.target))
            .arg(format!("--outdir={}", output_dir.display()));

        if backend.sourcemap {
            inv = inv.arg("--sourcemap");
        }
        if backend.minify {
            inv = inv.arg("--minify");
        }
        for name in externals {
            inv = inv.arg(format!("--external:{name}"));
        }
        for (key, value) in &backend.define {
            inv = inv.arg(format!("--define:{key}={value}"));
        }

        inv.current_dir(project_dir)
    }

    /// Command that starts the built backend on the deployment host
    pub fn start_command(&self, config: &PipelineConfig) -> String {
        if let Some(cmd) = &config.manifest.start_command {
            return cmd.clone();
        }

        let entry = &config.backend.entry;
        let script = match self {
            // the bundler writes `<stem>.js` at the top of the output dir
            Self::Bundle { .. } => {
                let stem = entry
                    .file_stem()
                    .map_or_else(|| "index".into(), |s| s.to_string_lossy());
                format!("{stem}.js")
            }
            Self::SourceCopy { .. } => entry.with_extension("js").to_string_lossy().into_owned(),
        };

        format!("{} {}", config.verify.runtime, script.replace('\\', "/"))
    }

    /// Module format recorded in the production manifest
    pub fn module_format(&self, config: &PipelineConfig, source: &SourceManifest) -> ModuleFormat {
        if let Some(format) = config.manifest.module_format {
            return format;
        }
        match self {
            Self::Bundle { .. } => config.backend.format.module_format(),
            Self::SourceCopy { .. } => source.module_format.unwrap_or(ModuleFormat::Module),
        }
    }

    fn bundle(
        ctx: &StageContext<'_>,
        entry: &Path,
        externals: &[String],
    ) -> Result<String, StageError> {
        let entry_path = ctx.project_dir.join(entry);
        if !ctx.fs.exists(&entry_path) {
            return Err(StageError::MissingFile { path: entry_path });
        }

        let invocation =
            Self::bundle_invocation(ctx.config, entry, externals, ctx.project_dir, ctx.output_dir);
        tracing::info!(
            "Bundling backend {} (external: {})",
            entry.display(),
            externals.join(", ")
        );

        run_checked(ctx.runner, &invocation)?;

        Ok(format!("bundled {} ({} external)", entry.display(), externals.len()))
    }

    fn copy_sources(ctx: &StageContext<'_>, dirs: &[PathBuf]) -> Result<String, StageError> {
        // check everything up front so a missing tree does not leave a half copy
        for dir in dirs {
            let src = ctx.project_dir.join(dir);
            if !ctx.fs.is_dir(&src) {
                return Err(StageError::MissingDirectory { path: src });
            }
        }

        let mut total = 0;
        for dir in dirs {
            let copied = ctx
                .fs
                .copy_tree(&ctx.project_dir.join(dir), &ctx.output_dir.join(dir))?;
            tracing::info!("Copied {} ({copied} files)", dir.display());
            total += copied;
        }

        Ok(format!("copied {total} source files"))
    }
}

impl BuildStage for BackendStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<String, StageError> {
        match self {
            Self::Bundle { entry, externals } => Self::bundle(ctx, entry, externals),
            Self::SourceCopy { dirs } => Self::copy_sources(ctx, dirs),
        }
    }
}
