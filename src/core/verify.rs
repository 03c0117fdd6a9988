//! Deployment verification
//!
//! Post-build sanity checks against an installed deployment. Every check
//! runs and is reported; nothing stops early, so an operator sees all
//! problems in one pass.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::defaults;
use crate::core::artifacts::smoke_script;
use crate::core::native::{NativeDependencySpec, NativeRegistry};
use crate::core::version::constraint_meets_minimum;
use crate::infra::filesystem::FileSystem;
use crate::infra::process::{run_checked, Invocation, ProcessRunner};

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Check name, e.g. `installed:bcrypt`
    pub name: String,
    pub status: CheckStatus,
    pub message: String,

    /// Command that fixes a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            message: message.into(),
            remediation: None,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, message: impl Into<String>, remediation: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            message: message.into(),
            remediation,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Aggregated verification results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.len() - self.passed_count()
    }

    /// All failed checks
    pub fn failed(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed()).collect()
    }
}

/// Smoke-import settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTest {
    /// Runtime used to execute the script (`node`)
    pub runtime: String,
}

/// Runs the deployment checks
pub struct Verifier<'a> {
    registry: &'a NativeRegistry,
    fs: &'a dyn FileSystem,
    runner: &'a dyn ProcessRunner,
    smoke: Option<SmokeTest>,
}

impl<'a> Verifier<'a> {
    pub fn new(
        registry: &'a NativeRegistry,
        fs: &'a dyn FileSystem,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            registry,
            fs,
            runner,
            smoke: None,
        }
    }

    /// Enable the smoke-import check
    #[must_use]
    pub fn with_smoke_test(mut self, smoke: Option<SmokeTest>) -> Self {
        self.smoke = smoke;
        self
    }

    /// Run every check
    ///
    /// The smoke-test script is always written next to the manifest so it
    /// can be run by hand on the target host; it is only executed when the
    /// smoke test is enabled.
    pub fn verify(&self, module_root: &Path, manifest_path: &Path) -> VerificationReport {
        let mut report = VerificationReport::default();

        for spec in self.registry.list() {
            report.checks.push(self.check_installed(spec, module_root));
        }
        report.checks.extend(self.check_manifest(manifest_path));

        let deploy_dir = manifest_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let script = self.write_smoke_script(&deploy_dir);

        if let Some(smoke) = &self.smoke {
            report.checks.push(self.check_smoke(smoke, &deploy_dir, script));
        }

        tracing::info!(
            "Verification: {}/{} checks passed",
            report.passed_count(),
            report.checks.len()
        );
        report
    }

    /// Check (a): the dependency is installed under the module root
    pub fn check_installed(&self, spec: &NativeDependencySpec, module_root: &Path) -> CheckResult {
        let name = format!("installed:{}", spec.name);
        let path = module_root.join(spec.presence_path());

        if self.registry.is_present(self.fs, spec, module_root) {
            CheckResult::pass(&name, format!("{} found at {}", spec.name, path.display()))
        } else {
            CheckResult::fail(
                &name,
                format!("{} not found in {}", spec.name, module_root.display()),
                Some(format!("Run: {}", spec.install_hint())),
            )
        }
    }

    /// Check (b): the produced manifest lists every native dependency
    pub fn check_manifest(&self, manifest_path: &Path) -> Vec<CheckResult> {
        let value = self
            .fs
            .read_to_string(manifest_path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<serde_json::Value>(&content).map_err(|e| e.to_string())
            });

        let value = match value {
            Ok(v) => v,
            Err(error) => {
                return vec![CheckResult::fail(
                    "manifest",
                    format!("Cannot read {}: {error}", manifest_path.display()),
                    Some("Re-run the build to regenerate the production manifest".to_string()),
                )];
            }
        };

        let dependencies = value.get("dependencies").and_then(|d| d.as_object());

        self.registry
            .list()
            .iter()
            .map(|spec| {
                let name = format!("manifest:{}", spec.name);
                let declared = dependencies
                    .and_then(|deps| deps.get(&spec.name))
                    .and_then(|v| v.as_str());

                match declared {
                    Some(constraint)
                        if constraint_meets_minimum(constraint, &spec.min_version)
                            .unwrap_or(false) =>
                    {
                        CheckResult::pass(&name, format!("{}@{constraint} declared", spec.name))
                    }
                    Some(constraint) => CheckResult::fail(
                        &name,
                        format!(
                            "{}@{constraint} does not satisfy the required {}",
                            spec.name, spec.min_version
                        ),
                        Some(format!("Set \"{}\": \"{}\" in dependencies", spec.name, spec.min_version)),
                    ),
                    None => CheckResult::fail(
                        &name,
                        format!("{} missing from {} dependencies", spec.name, manifest_path.display()),
                        Some(format!("Set \"{}\": \"{}\" in dependencies", spec.name, spec.min_version)),
                    ),
                }
            })
            .collect()
    }

    fn write_smoke_script(&self, deploy_dir: &Path) -> Option<PathBuf> {
        let path = deploy_dir.join(defaults::SMOKE_SCRIPT);
        match self.fs.write_file(&path, &smoke_script(self.registry)) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Could not write smoke-test script: {e}");
                None
            }
        }
    }

    /// Check (c): every native dependency loads in the current environment
    fn check_smoke(
        &self,
        smoke: &SmokeTest,
        deploy_dir: &Path,
        script: Option<PathBuf>,
    ) -> CheckResult {
        const NAME: &str = "smoke-import";

        let Some(script) = script else {
            return CheckResult::fail(NAME, "Smoke-test script could not be written", None);
        };

        let invocation = Invocation::new(&smoke.runtime)
            .arg(script.to_string_lossy())
            .current_dir(deploy_dir);

        match run_checked(self.runner, &invocation) {
            Ok(_) => CheckResult::pass(NAME, "native dependencies load"),
            Err(e) => CheckResult::fail(
                NAME,
                e.to_string(),
                Some(format!(
                    "Run '{}' in {} on the target host",
                    defaults::INSTALL_COMMAND,
                    deploy_dir.display()
                )),
            ),
        }
    }
}
