//! Pipeline orchestration
//!
//! Sequences the stages and owns every failure decision:
//!
//! ```text
//! Idle -> FrontendBuilding -> BackendBuilding -> ManifestSynthesizing -> [Verifying] -> Done
//!   \___________________\____________________\____________________\_______> Aborted
//! ```
//!
//! A stage advances the machine only on success. The first failure moves to
//! `Aborted` and nothing after it runs. Completed output is left on disk; the
//! next run starts from an empty output directory anyway.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::backend::BackendStrategy;
use crate::core::clean::prepare_output_dir;
use crate::core::config::{ManifestPolicy, PipelineConfig, StrategyKind};
use crate::core::frontend::FrontendStage;
use crate::core::manifest::SourceManifest;
use crate::core::native::NativeRegistry;
use crate::core::stage::{BuildStage, BuildStageResult, StageContext};
use crate::core::synthesize::{ManifestStage, ManifestTarget, ProductionManifest};
use crate::core::verify::{SmokeTest, VerificationReport, Verifier};
use crate::error::{DistforgeError, StageError, VerificationError};
use crate::infra::filesystem::FileSystem;
use crate::infra::process::ProcessRunner;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    Idle,
    FrontendBuilding,
    BackendBuilding,
    ManifestSynthesizing,
    Verifying,
    Done,
    Aborted,
}

impl PipelineState {
    /// Whether the machine can no longer move
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// State entered while the named stage runs
    fn for_stage(stage: &str) -> Self {
        match stage {
            FrontendStage::NAME => Self::FrontendBuilding,
            BackendStrategy::NAME => Self::BackendBuilding,
            _ => Self::ManifestSynthesizing,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::FrontendBuilding => "frontend-building",
            Self::BackendBuilding => "backend-building",
            Self::ManifestSynthesizing => "manifest-synthesizing",
            Self::Verifying => "verifying",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Receives progress events from a running pipeline
pub trait PipelineObserver {
    fn stage_started(&self, _stage: &str) {}

    fn stage_finished(&self, _result: &BuildStageResult) {}

    fn verification_finished(&self, _report: &VerificationReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub results: Vec<BuildStageResult>,
    pub manifest: ProductionManifest,
    pub manifest_path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,

    /// SHA-256 of the written production manifest
    pub digest: String,
}

/// What a run would do, without doing it
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    pub output_dir: PathBuf,
    pub strategy: StrategyKind,
    pub policy: ManifestPolicy,
    pub stages: Vec<String>,
    pub externals: Vec<String>,
    pub manifest: ProductionManifest,
    pub verify: bool,
}

/// The staged build pipeline
pub struct Pipeline<'a> {
    project_dir: PathBuf,
    config: PipelineConfig,
    runner: &'a dyn ProcessRunner,
    fs: &'a dyn FileSystem,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        config: PipelineConfig,
        runner: &'a dyn ProcessRunner,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            config,
            runner,
            fs,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir(&self.project_dir)
    }

    fn prepare(&self) -> Result<(NativeRegistry, SourceManifest), DistforgeError> {
        self.config.validate(&self.project_dir)?;
        let registry = self.config.registry()?;
        let source = SourceManifest::read(
            self.fs,
            &self.project_dir.join(&self.config.manifest.source),
        )?;
        Ok((registry, source))
    }

    /// Describe the run without touching the output directory
    pub fn plan(&self) -> Result<PipelinePlan, DistforgeError> {
        let (registry, source) = self.prepare()?;
        let strategy = BackendStrategy::from_config(&self.config);
        let policy = self.config.policy();
        let target = ManifestTarget::for_strategy(&strategy, &self.config, &source);
        let manifest = ManifestStage {
            source: &source,
            registry: &registry,
            policy,
            target,
        }
        .manifest();

        let externals = match &strategy {
            BackendStrategy::Bundle { externals, .. } => externals.clone(),
            BackendStrategy::SourceCopy { .. } => Vec::new(),
        };

        Ok(PipelinePlan {
            output_dir: self.output_dir(),
            strategy: strategy.kind(),
            policy,
            stages: [FrontendStage::NAME, BackendStrategy::NAME, ManifestStage::NAME]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            externals,
            manifest,
            verify: self.config.verify.enabled,
        })
    }

    /// Run every stage in order
    ///
    /// Returns the first failure; the observer has already seen it as a
    /// failed [`BuildStageResult`].
    pub fn run(&self, observer: &dyn PipelineObserver) -> Result<PipelineReport, DistforgeError> {
        let (registry, source) = self.prepare()?;
        let output_dir = self.output_dir();

        if prepare_output_dir(self.fs, &output_dir)? {
            tracing::info!("Cleared previous output in {}", output_dir.display());
        }

        let ctx = StageContext {
            project_dir: &self.project_dir,
            output_dir: &output_dir,
            config: &self.config,
            runner: self.runner,
            fs: self.fs,
        };

        let backend = BackendStrategy::from_config(&self.config);
        let manifest_stage = ManifestStage {
            source: &source,
            registry: &registry,
            policy: self.config.policy(),
            target: ManifestTarget::for_strategy(&backend, &self.config, &source),
        };
        let stages: [&dyn BuildStage; 3] = [&FrontendStage, &backend, &manifest_stage];

        let mut state = PipelineState::Idle;
        tracing::debug!("Pipeline state: {state}");
        let mut results = Vec::with_capacity(stages.len());

        for stage in stages {
            state = PipelineState::for_stage(stage.name());
            tracing::debug!("Pipeline state: {state}");
            observer.stage_started(stage.name());

            let outcome = stage.execute(&ctx);
            let result = BuildStageResult::from_outcome(stage.name(), &outcome);
            observer.stage_finished(&result);
            results.push(result);

            if let Err(error) = outcome {
                tracing::error!("Stage '{}' failed; pipeline {}", stage.name(), PipelineState::Aborted);
                return Err(abort(stage.name(), error));
            }
        }

        let manifest = manifest_stage.manifest();
        let manifest_path = output_dir.join(crate::config::defaults::PRODUCTION_MANIFEST);
        let digest = self.digest(&manifest_path)?;

        let verification = if self.config.verify.enabled {
            state = PipelineState::Verifying;
            tracing::debug!("Pipeline state: {state}");
            let report = self.verify(&registry, &manifest_path);
            observer.verification_finished(&report);

            if self.config.verify.gate && !report.all_passed() {
                tracing::error!("Verification gate failed; pipeline {}", PipelineState::Aborted);
                return Err(VerificationError::ChecksFailed {
                    failed: report.failed_count(),
                    total: report.checks.len(),
                }
                .into());
            }
            Some(report)
        } else {
            None
        };

        debug_assert!(!state.is_terminal());
        Ok(PipelineReport {
            state: PipelineState::Done,
            results,
            manifest,
            manifest_path,
            verification,
            digest,
        })
    }

    fn verify(&self, registry: &NativeRegistry, manifest_path: &Path) -> VerificationReport {
        let smoke = self.config.verify.smoke_test.then(|| SmokeTest {
            runtime: self.config.verify.runtime.clone(),
        });
        Verifier::new(registry, self.fs, self.runner)
            .with_smoke_test(smoke)
            .verify(&self.config.module_root(&self.project_dir), manifest_path)
    }

    fn digest(&self, manifest_path: &Path) -> Result<String, DistforgeError> {
        let content = self.fs.read_to_string(manifest_path)?;
        Ok(manifest_digest(&content))
    }
}

/// Hex SHA-256 of manifest content
pub fn manifest_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

fn abort(stage: &str, error: StageError) -> DistforgeError {
    match error {
        StageError::Serialization(e) => DistforgeError::Serialization(e),
        other => DistforgeError::StageFailed {
            stage: stage.to_string(),
            diagnostic: other.to_string(),
        },
    }
}
