//! Auxiliary build artifacts
//!
//! Configuration files that must travel with the build, the deployment notes
//! and the native smoke-test script.

use std::path::Path;

use crate::config::defaults;
use crate::core::config::PipelineConfig;
use crate::core::native::NativeRegistry;
use crate::core::synthesize::ProductionManifest;
use crate::error::FilesystemError;
use crate::infra::filesystem::FileSystem;

/// Copy the listed files from the project root into the output when present
///
/// Returns the names that were copied; absent files are skipped.
pub fn copy_auxiliary_files(
    fs: &dyn FileSystem,
    project_dir: &Path,
    output_dir: &Path,
    files: &[String],
) -> Result<Vec<String>, FilesystemError> {
    let mut copied = Vec::new();

    for file in files {
        let src = project_dir.join(file);
        if !fs.exists(&src) {
            tracing::debug!("Skipping {file} (not present)");
            continue;
        }
        fs.copy_file(&src, &output_dir.join(file))?;
        copied.push(file.clone());
    }

    Ok(copied)
}

/// Deployment notes written next to the production manifest
pub fn deployment_notes(
    manifest: &ProductionManifest,
    registry: &NativeRegistry,
    config: &PipelineConfig,
) -> String {
    let mut notes = String::new();
    notes.push_str(&format!("# {} {} (production build)\n\n", manifest.name, manifest.version));

    notes.push_str("## Setup\n\n1. Install dependencies:\n\n```bash\n");
    notes.push_str(defaults::INSTALL_COMMAND);
    notes.push_str("\n```\n\n");

    let mut step = 2;
    if !config.deploy.env.is_empty() {
        notes.push_str(&format!("{step}. Set environment variables:\n\n"));
        step += 1;
        for var in &config.deploy.env {
            notes.push_str(&format!("   - `{var}`\n"));
        }
        notes.push('\n');
    }

    notes.push_str(&format!("{step}. Start the application:\n\n```bash\n"));
    notes.push_str(&manifest.scripts.start);
    notes.push_str("\n```\n");

    if !registry.is_empty() {
        notes.push_str("\n## Native dependencies\n\n");
        notes.push_str(
            "These packages contain compiled code and are installed on this host rather than bundled:\n\n",
        );
        for spec in registry.list() {
            notes.push_str(&format!("- `{}` {}\n", spec.name, spec.min_version));
        }
        notes.push_str(&format!(
            "\nRun `node {}` after installing to check that they load.\n",
            defaults::SMOKE_SCRIPT
        ));
    }

    notes
}

/// Script that imports every native dependency, stopping with exit code 1
/// at the first one that fails to load
pub fn smoke_script(registry: &NativeRegistry) -> String {
    let names: Vec<&str> = registry.names().collect();
    let list = serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"// Checks that native dependencies load on this host.
const deps = {list};
for (const name of deps) {{
  try {{
    await import(name);
    console.log(`${{name}}: OK`);
  }} catch (err) {{
    console.error(`${{name}}: ${{err.message}}`);
    process.exit(1);
  }}
}}
"#
    )
}
