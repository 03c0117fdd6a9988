//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod plan;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::core::config::{ManifestPolicy, PipelineConfig, StrategyKind};
use crate::error::DistforgeError;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the frontend, backend and production manifest (default)
    Build(BuildArgs),

    /// Check an installed deployment for its native dependencies
    Verify {
        /// Deployment directory (default: the configured output directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Installed module root (default: <dir>/node_modules)
        #[arg(long)]
        module_root: Option<PathBuf>,

        /// Also import every native dependency with the runtime
        #[arg(long)]
        smoke_test: bool,
    },

    /// Show what a build would do without running it
    Plan,

    /// Remove the output directory
    Clean,
}

/// Overrides for the `build` command
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    /// Backend strategy (bundle, source-copy)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Manifest policy (minimal, full)
    #[arg(long)]
    pub policy: Option<ManifestPolicy>,

    /// Output directory, relative to the project
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Verify the deployment after building
    #[arg(long)]
    pub verify: bool,

    /// Fail the build when verification fails (implies --verify)
    #[arg(long)]
    pub verify_gate: bool,

    /// Run the native smoke-import check (implies --verify)
    #[arg(long)]
    pub smoke_test: bool,
}

impl BuildArgs {
    /// Apply the flags on top of the loaded configuration
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(strategy) = self.strategy {
            config.build.strategy = strategy;
        }
        if let Some(policy) = self.policy {
            config.build.policy = Some(policy);
        }
        if let Some(out_dir) = &self.out_dir {
            config.build.output_dir.clone_from(out_dir);
        }
        if self.verify || self.verify_gate || self.smoke_test {
            config.verify.enabled = true;
        }
        if self.verify_gate {
            config.verify.gate = true;
        }
        if self.smoke_test {
            config.verify.smoke_test = true;
        }
    }
}

impl Commands {
    /// Execute the command
    pub async fn run(self, project_dir: &Path, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(project_dir, config_path)?;

        match self {
            Self::Build(args) => build::execute(project_dir, config, &args).await,
            Self::Verify {
                dir,
                module_root,
                smoke_test,
            } => {
                let options = verify::VerifyOptions {
                    dir,
                    module_root,
                    smoke_test,
                };
                verify::execute(project_dir, &config, &options).await
            }
            Self::Plan => plan::execute(project_dir, config).await,
            Self::Clean => clean::execute(project_dir, &config).await,
        }
    }
}

fn load_config(project_dir: &Path, config_path: Option<&Path>) -> Result<PipelineConfig> {
    PipelineConfig::load(project_dir, config_path)
        .map_err(|e| DistforgeError::from(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = PipelineConfig::default();
        let args = BuildArgs {
            strategy: Some(StrategyKind::SourceCopy),
            out_dir: Some(PathBuf::from("build/prod")),
            smoke_test: true,
            ..BuildArgs::default()
        };

        args.apply(&mut config);

        assert_eq!(config.build.strategy, StrategyKind::SourceCopy);
        assert_eq!(config.policy(), ManifestPolicy::Full);
        assert_eq!(config.build.output_dir, PathBuf::from("build/prod"));
        assert!(config.verify.enabled);
        assert!(config.verify.smoke_test);
        assert!(!config.verify.gate);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = PipelineConfig::default();
        config.build.policy = Some(ManifestPolicy::Full);
        let before = config.clone();

        BuildArgs::default().apply(&mut config);

        assert_eq!(config, before);
    }
}
