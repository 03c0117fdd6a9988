//! Plan command implementation
//!
//! Implements `distforge plan`: shows the resolved strategy, the bundler
//! external list and the manifest a build would write.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{is_json, is_quiet, print_detail, print_info};
use crate::config::defaults;
use crate::core::config::PipelineConfig;
use crate::core::pipeline::Pipeline;
use crate::infra::filesystem::LocalFs;
use crate::infra::process::SystemProcessRunner;

/// Execute the plan command
pub async fn execute(project_dir: &Path, config: PipelineConfig) -> Result<()> {
    let runner = SystemProcessRunner;
    let plan = Pipeline::new(project_dir, config, &runner, &LocalFs).plan()?;

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    if is_quiet() {
        return Ok(());
    }

    print_info(&format!("Output directory: {}", plan.output_dir.display()));
    print_detail(&format!(
        "strategy: {}, policy: {}",
        plan.strategy.as_str(),
        plan.policy.as_str()
    ));
    print_detail(&format!("stages: {}", plan.stages.join(" -> ")));
    if !plan.externals.is_empty() {
        print_detail(&format!("external: {}", plan.externals.join(", ")));
    }
    if plan.verify {
        print_detail("verification: enabled");
    }

    println!();
    print_info(&format!("{} would contain:", defaults::PRODUCTION_MANIFEST));
    println!("{}", plan.manifest.to_json()?);

    Ok(())
}
