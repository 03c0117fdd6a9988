//! Verify command implementation
//!
//! Implements `distforge verify`: checks an installed deployment for its
//! native dependencies. Any failed check fails the command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::build::print_verification;
use crate::cli::output::{is_json, print_info, print_success};
use crate::config::defaults;
use crate::core::config::PipelineConfig;
use crate::core::verify::{SmokeTest, Verifier};
use crate::error::{DistforgeError, VerificationError};
use crate::infra::filesystem::LocalFs;
use crate::infra::process::SystemProcessRunner;

/// Verify options
#[derive(Debug, Default)]
pub struct VerifyOptions {
    /// Deployment directory holding the production manifest
    pub dir: Option<PathBuf>,
    /// Installed module root
    pub module_root: Option<PathBuf>,
    /// Run the smoke-import check
    pub smoke_test: bool,
}

/// Execute the verify command
pub async fn execute(
    project_dir: &Path,
    config: &PipelineConfig,
    options: &VerifyOptions,
) -> Result<()> {
    let registry = config.registry().map_err(DistforgeError::from)?;

    let deploy_dir = options
        .dir
        .as_ref()
        .map_or_else(|| config.output_dir(project_dir), |d| project_dir.join(d));
    // an installed deployment keeps its modules next to its manifest
    let module_root = options
        .module_root
        .as_ref()
        .or(config.verify.module_root.as_ref())
        .map_or_else(|| deploy_dir.join(defaults::MODULES_DIR), |root| project_dir.join(root));
    let manifest_path = deploy_dir.join(defaults::PRODUCTION_MANIFEST);

    let smoke = (options.smoke_test || config.verify.smoke_test).then(|| SmokeTest {
        runtime: config.verify.runtime.clone(),
    });

    print_info(&format!("Verifying deployment in {}", deploy_dir.display()));

    let runner = SystemProcessRunner;
    let report = Verifier::new(&registry, &LocalFs, &runner)
        .with_smoke_test(smoke)
        .verify(&module_root, &manifest_path);

    if is_json() {
        let value = serde_json::json!({
            "status": if report.all_passed() { "success" } else { "error" },
            "checks": report.checks,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        print_verification(&report);
    }

    if report.all_passed() {
        print_success(&format!("All {} checks passed", report.checks.len()));
        Ok(())
    } else {
        Err(DistforgeError::from(VerificationError::ChecksFailed {
            failed: report.failed_count(),
            total: report.checks.len(),
        })
        .into())
    }
}
