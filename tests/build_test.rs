//! Integration tests for `distforge build`
//!
//! The external bundlers are replaced by `sh -c` one-liners configured in
//! distforge.toml, so these tests need a POSIX shell.
#![cfg(unix)]

mod common;

use common::{combined_output, TestProject};

/// Test: a bundle build externalizes the native dependency and writes a
/// minimal manifest that still installs it
#[test]
fn test_bundle_build_writes_minimal_manifest() {
    let project = TestProject::sample();

    let output = project.run(&["build"]);

    assert!(output.status.success(), "{}", combined_output(&output));
    let manifest = project.read_json("dist/package.json");
    assert_eq!(manifest["name"], "rest-express");
    assert_eq!(manifest["type"], "module");
    assert_eq!(manifest["scripts"]["start"], "node index.js");
    let deps = manifest["dependencies"].as_object().unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps["bcrypt"], "^6.0.0");

    let args = project.read_file("bundler-args.txt");
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args[0], "server/index.ts");
    assert!(args.contains(&"--bundle"));
    assert!(args.contains(&"--external:bcrypt"));
    assert!(args.contains(&"--external:fsevents"));
    assert!(args.contains(&"--external:cpu-features"));

    assert!(project.file_exists("dist/public/index.html"));
    assert!(project.file_exists("dist/index.js"));
    assert!(project.file_exists("dist/tsconfig.json"));
    assert!(project.file_exists("dist/README.md"));
}

/// Test: running without a subcommand builds
#[test]
fn test_no_subcommand_runs_build() {
    let project = TestProject::sample();

    let output = project.run(&[]);

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(project.file_exists("dist/package.json"));
}

/// Test: source-copy ships the source trees and the full dependency set
#[test]
fn test_source_copy_build() {
    let project = TestProject::sample();

    let output = project.run(&["build", "--strategy", "source-copy"]);

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(project.file_exists("dist/server/index.ts"));
    assert!(project.file_exists("dist/shared/schema.ts"));
    assert!(!project.file_exists("bundler-args.txt"));

    let manifest = project.read_json("dist/package.json");
    assert_eq!(manifest["scripts"]["start"], "node server/index.js");
    assert_eq!(manifest["dependencies"]["express"], "^4.21.2");
    assert_eq!(manifest["dependencies"]["drizzle-orm"], "^0.39.1");
    // declared below the minimum, raised
    assert_eq!(manifest["dependencies"]["bcrypt"], "^6.0.0");
    // dev dependencies never ship
    assert!(manifest["dependencies"].get("vite").is_none());
}

/// Test: a failing frontend aborts before the backend runs
#[test]
fn test_frontend_failure_aborts_pipeline() {
    let project = TestProject::sample();
    project.create_file(
        "distforge.toml",
        r#"
[frontend]
program = "sh"
args = ["-c", "echo 'client/src/App.tsx:4:2: ERROR: Unexpected token' >&2; exit 1"]

[backend]
bundler_program = "sh"
bundler_args = ["-c", "touch bundler-ran", "esbuild"]
"#,
    );

    let output = project.run(&["build"]);

    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("frontend stage failed"), "{text}");
    assert!(text.contains("client/src/App.tsx:4:2: ERROR: Unexpected token"));
    assert!(!project.file_exists("bundler-ran"));
    assert!(!project.file_exists("dist/package.json"));
}

/// Test: missing source manifest has its own exit code
#[test]
fn test_missing_package_json() {
    let project = TestProject::sample();
    std::fs::remove_file(project.path().join("package.json")).unwrap();

    let output = project.run(&["build"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Manifest not found"));
}

/// Test: malformed source manifest
#[test]
fn test_malformed_package_json() {
    let project = TestProject::sample();
    project.create_file("package.json", "{ \"name\": ");

    let output = project.run(&["build"]);

    assert_eq!(output.status.code(), Some(3));
}

/// Test: rebuilding drops artifacts from the previous run
#[test]
fn test_rebuild_starts_from_empty_output() {
    let project = TestProject::sample();
    assert!(project.run(&["build"]).status.success());
    let first = project.read_file("dist/package.json");
    project.create_file("dist/stale-chunk.js", "old");

    let output = project.run(&["build"]);

    assert!(output.status.success());
    assert!(!project.file_exists("dist/stale-chunk.js"));
    assert_eq!(first, project.read_file("dist/package.json"));
}

/// Test: the summary prints the manifest digest
#[test]
fn test_summary_prints_digest() {
    let project = TestProject::sample();

    let output = project.run(&["build"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("manifest sha256: "), "{stdout}");
}

/// Test: the output directory may not contain the project
#[test]
fn test_unsafe_output_dir_rejected() {
    let project = TestProject::sample();

    let output = project.run(&["build", "--out-dir", "."]);

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("must not be the project root"));
    assert!(project.file_exists("package.json"));
}

/// Test: the output directory may not overlap the backend sources
#[test]
fn test_output_dir_inside_sources_rejected() {
    let project = TestProject::sample();

    let output = project.run(&["build", "--strategy", "source-copy", "--out-dir", "server"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("overlaps backend source directory"));
    assert!(project.file_exists("server/index.ts"));
}

/// Test: verification is reported but only gates when asked to
#[test]
fn test_verify_gate() {
    let project = TestProject::sample();

    let reported = project.run(&["build", "--verify"]);
    assert!(reported.status.success(), "{}", combined_output(&reported));
    assert!(combined_output(&reported).contains("npm install bcrypt@^6.0.0"));

    let gated = project.run(&["build", "--verify-gate"]);
    assert_eq!(gated.status.code(), Some(6));
}

/// Test: the gate passes when the project has the native module installed
#[test]
fn test_verify_gate_passes_with_installed_module() {
    let project = TestProject::sample();
    project.create_dir("node_modules/bcrypt");

    let output = project.run(&["build", "--verify-gate"]);

    let combined = combined_output(&output);
    assert!(output.status.success(), "{combined}");
    assert!(combined.contains("installed:bcrypt: bcrypt found at"), "{combined}");
    assert!(!combined.contains("deployment checks failed"));
}

/// Test: JSON summary
#[test]
fn test_json_report() {
    let project = TestProject::sample();

    let output = project.run(&["--json", "build"]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["state"], "done");
    assert_eq!(report["results"].as_array().unwrap().len(), 3);
    assert_eq!(report["manifest"]["dependencies"]["bcrypt"], "^6.0.0");
    assert_eq!(report["digest"].as_str().unwrap().len(), 64);
}
