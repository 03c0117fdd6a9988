//! Build stage abstraction
//!
//! A stage is one opaque unit of work (an external bundler run, a tree copy,
//! manifest synthesis). Stages never retry and never roll back; the
//! orchestrator decides what happens after a failure.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::core::config::PipelineConfig;
use crate::error::StageError;
use crate::infra::filesystem::FileSystem;
use crate::infra::process::ProcessRunner;

/// Outcome of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
}

/// Result of one stage invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStageResult {
    /// Stage name
    pub stage: String,
    pub status: StageStatus,

    /// Summary on success, the underlying tool or I/O error text on failure
    pub diagnostic: String,
}

impl BuildStageResult {
    pub fn success(stage: &str, summary: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Success,
            diagnostic: summary.into(),
        }
    }

    pub fn failed(stage: &str, diagnostic: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageStatus::Failed,
            diagnostic: diagnostic.into(),
        }
    }

    /// Build from a stage's raw outcome
    pub fn from_outcome(stage: &str, outcome: &Result<String, StageError>) -> Self {
        match outcome {
            Ok(summary) => Self::success(stage, summary.clone()),
            Err(e) => Self::failed(stage, e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }
}

impl fmt::Display for BuildStageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            StageStatus::Success => write!(f, "{}: ok", self.stage),
            StageStatus::Failed => write!(f, "{}: failed: {}", self.stage, self.diagnostic),
        }
    }
}

/// Handles and paths shared by every stage of one run
pub struct StageContext<'a> {
    pub project_dir: &'a Path,
    pub output_dir: &'a Path,
    pub config: &'a PipelineConfig,
    pub runner: &'a dyn ProcessRunner,
    pub fs: &'a dyn FileSystem,
}

/// One step of the build pipeline
pub trait BuildStage {
    /// Stable stage name used in progress lines and results
    fn name(&self) -> &'static str;

    /// Do the work; `Ok` carries a short human summary
    fn execute(&self, ctx: &StageContext<'_>) -> Result<String, StageError>;

    /// Run the stage and fold the outcome into a [`BuildStageResult`]
    fn run(&self, ctx: &StageContext<'_>) -> BuildStageResult {
        BuildStageResult::from_outcome(self.name(), &self.execute(ctx))
    }
}
