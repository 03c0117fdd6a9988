//! Build command implementation
//!
//! Implements `distforge build`: runs the pipeline and reports each stage as
//! it is attempted, succeeds or fails.

use std::cell::RefCell;
use std::path::Path;

use anyhow::Result;
use indicatif::ProgressBar;

use super::BuildArgs;
use crate::cli::output::{
    create_spinner, is_json, print_detail, print_error, print_info, print_success, print_warning,
};
use crate::core::config::PipelineConfig;
use crate::core::pipeline::{Pipeline, PipelineObserver, PipelineReport};
use crate::core::stage::BuildStageResult;
use crate::core::verify::VerificationReport;
use crate::infra::filesystem::LocalFs;
use crate::infra::process::SystemProcessRunner;

/// Prints stage progress with a spinner while a stage runs
#[derive(Default)]
struct ProgressObserver {
    spinner: RefCell<Option<ProgressBar>>,
}

impl PipelineObserver for ProgressObserver {
    fn stage_started(&self, stage: &str) {
        print_info(&format!("Running {stage} stage"));
        *self.spinner.borrow_mut() = Some(create_spinner(&format!("{stage}...")));
    }

    fn stage_finished(&self, result: &BuildStageResult) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }

        if result.is_success() {
            print_success(&format!("{}: {}", result.stage, result.diagnostic));
        } else {
            print_error(&format!("{} stage failed", result.stage));
            // the tool's own output, unmodified
            for line in result.diagnostic.lines() {
                eprintln!("    {line}");
            }
        }
    }

    fn verification_finished(&self, report: &VerificationReport) {
        print_verification(report);
    }
}

/// Print verification results, one line per check
pub fn print_verification(report: &VerificationReport) {
    for check in &report.checks {
        if check.passed() {
            print_success(&format!("{}: {}", check.name, check.message));
        } else {
            print_warning(&format!("{}: {}", check.name, check.message));
            if let Some(remediation) = &check.remediation {
                print_detail(remediation);
            }
        }
    }
}

/// Execute the build command
pub async fn execute(project_dir: &Path, mut config: PipelineConfig, args: &BuildArgs) -> Result<()> {
    args.apply(&mut config);

    let runner = SystemProcessRunner;
    let pipeline = Pipeline::new(project_dir, config, &runner, &LocalFs);
    let observer = ProgressObserver::default();

    tracing::info!(
        "Building {} into {}",
        project_dir.display(),
        pipeline.output_dir().display()
    );

    match pipeline.run(&observer) {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            if let Some(spinner) = observer.spinner.borrow_mut().take() {
                spinner.finish_and_clear();
            }
            print_error("Build failed");
            Err(e.into())
        }
    }
}

fn print_summary(report: &PipelineReport) {
    if is_json() {
        println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        return;
    }

    let output_dir = report
        .manifest_path
        .parent()
        .map_or_else(|| report.manifest_path.display().to_string(), |p| p.display().to_string());

    println!();
    print_success(&format!(
        "Built {} {} into {output_dir}",
        report.manifest.name, report.manifest.version
    ));
    print_detail(&format!(
        "{} production dependencies, start: {}",
        report.manifest.dependencies.len(),
        report.manifest.scripts.start
    ));
    print_detail(&format!("manifest sha256: {}", report.digest));

    if let Some(verification) = &report.verification {
        if !verification.all_passed() {
            print_warning(&format!(
                "{} of {} deployment checks failed",
                verification.failed_count(),
                verification.checks.len()
            ));
        }
    }
}
