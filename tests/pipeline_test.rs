//! Library-level pipeline tests with an injected process runner

mod common;

use std::cell::RefCell;
use std::io;

use assert_fs::prelude::*;
use predicates::prelude::*;

use distforge::core::config::{PipelineConfig, StrategyKind};
use distforge::core::native::NativeDependencySpec;
use distforge::core::pipeline::{NoopObserver, Pipeline, PipelineState};
use distforge::infra::filesystem::LocalFs;
use distforge::infra::process::{Invocation, ProcessOutput, ProcessRunner};

/// Pretends to be vite and esbuild by writing their usual outputs
#[derive(Default)]
struct ToolchainStub {
    calls: RefCell<Vec<String>>,
    fail_bundler: bool,
}

impl ProcessRunner for ToolchainStub {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        self.calls.borrow_mut().push(invocation.display());

        if invocation.args.first().map(String::as_str) == Some("vite") {
            let cwd = invocation.cwd.clone().unwrap_or_default();
            std::fs::create_dir_all(cwd.join("dist/public"))?;
            std::fs::write(cwd.join("dist/public/index.html"), "<html></html>")?;
            return Ok(ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            });
        }

        if self.fail_bundler {
            return Ok(ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "✘ [ERROR] Could not resolve \"pg-native\"".to_string(),
            });
        }

        let outdir = invocation
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--outdir="))
            .unwrap_or("dist");
        std::fs::write(std::path::Path::new(outdir).join("index.js"), "console.log(1);")?;
        std::fs::write(std::path::Path::new(outdir).join("index.js.map"), "{}")?;
        Ok(ProcessOutput {
            code: Some(0),
            ..ProcessOutput::default()
        })
    }
}

fn project() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("package.json")
        .write_str(common::SAMPLE_PACKAGE_JSON)
        .unwrap();
    temp.child("server/index.ts").write_str("export {};").unwrap();
    temp.child("shared/schema.ts").write_str("export {};").unwrap();
    temp.child("drizzle.config.ts").write_str("export default {};").unwrap();
    temp
}

/// Test: the output layout of a bundle build
#[test]
fn test_bundle_output_layout() {
    let temp = project();
    let runner = ToolchainStub::default();
    let pipeline = Pipeline::new(temp.path(), PipelineConfig::default(), &runner, &LocalFs);

    let report = pipeline.run(&NoopObserver).unwrap();

    assert_eq!(report.state, PipelineState::Done);
    let dist = temp.child("dist");
    dist.child("public/index.html").assert(predicate::path::is_file());
    dist.child("index.js").assert(predicate::path::is_file());
    dist.child("index.js.map").assert(predicate::path::is_file());
    dist.child("drizzle.config.ts").assert("export default {};");
    dist.child("tsconfig.json").assert(predicate::path::missing());
    dist.child("package.json")
        .assert(predicate::str::contains("\"bcrypt\": \"^6.0.0\""));
    dist.child("README.md").assert(predicate::str::contains("DATABASE_URL"));
    dist.child("README.md").assert(predicate::str::contains("npm install"));
}

/// Test: a bundler error aborts with its diagnostic and no manifest
#[test]
fn test_bundler_error_keeps_diagnostic() {
    let temp = project();
    let runner = ToolchainStub {
        fail_bundler: true,
        ..ToolchainStub::default()
    };
    let pipeline = Pipeline::new(temp.path(), PipelineConfig::default(), &runner, &LocalFs);

    let err = pipeline.run(&NoopObserver).unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("Could not resolve \"pg-native\""));
    assert_eq!(runner.calls.borrow().len(), 2);
    temp.child("dist/package.json").assert(predicate::path::missing());
    // frontend output from the completed stage stays
    temp.child("dist/public/index.html").assert(predicate::path::exists());
}

/// Test: several native dependencies are all externalized and forced
#[test]
fn test_multiple_native_dependencies() {
    let temp = project();
    let runner = ToolchainStub::default();
    let mut config = PipelineConfig::default();
    config.native.dependencies = vec![
        NativeDependencySpec::new("bcrypt", "^6.0.0"),
        NativeDependencySpec::new("sharp", ">=0.33.0"),
    ];
    let pipeline = Pipeline::new(temp.path(), config, &runner, &LocalFs);

    let report = pipeline.run(&NoopObserver).unwrap();

    let bundler = &runner.calls.borrow()[1];
    assert!(bundler.contains("--external:bcrypt"));
    assert!(bundler.contains("--external:sharp"));
    assert_eq!(report.manifest.dependencies["sharp"], ">=0.33.0");
    assert_eq!(report.manifest.dependencies.len(), 2);
}

/// Test: source-copy never runs the backend bundler
#[test]
fn test_source_copy_skips_bundler() {
    let temp = project();
    let runner = ToolchainStub::default();
    let mut config = PipelineConfig::default();
    config.build.strategy = StrategyKind::SourceCopy;
    let pipeline = Pipeline::new(temp.path(), config, &runner, &LocalFs);

    let report = pipeline.run(&NoopObserver).unwrap();

    assert_eq!(runner.calls.borrow().len(), 1);
    assert_eq!(report.manifest.dependencies.len(), 3);
    temp.child("dist/server/index.ts").assert(predicate::path::exists());
}
