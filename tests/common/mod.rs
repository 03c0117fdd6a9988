//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
#[allow(dead_code)]
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// A project with sources, a package.json and a distforge.toml whose
    /// external tools are shell one-liners
    pub fn sample() -> Self {
        let project = Self::new();
        project.create_file("package.json", SAMPLE_PACKAGE_JSON);
        project.create_file("distforge.toml", SAMPLE_CONFIG);
        project.create_file("server/index.ts", "import express from 'express';\n");
        project.create_file("shared/schema.ts", "export const users = {};\n");
        project.create_file("tsconfig.json", "{}\n");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Parse a JSON file from the test project
    pub fn read_json(&self, name: &str) -> serde_json::Value {
        serde_json::from_str(&self.read_file(name)).expect("Failed to parse JSON")
    }

    /// Run the distforge binary in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_distforge"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("DISTFORGE_CONFIG")
            .args(args)
            .output()
            .expect("Failed to execute distforge")
    }
}

#[allow(dead_code)]
impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// stdout and stderr of a finished command
#[allow(dead_code)]
pub fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Source manifest with one native dependency declared below the minimum
#[allow(dead_code)]
pub const SAMPLE_PACKAGE_JSON: &str = r#"{
  "name": "rest-express",
  "version": "1.0.0",
  "type": "module",
  "dependencies": {
    "bcrypt": "^5.1.1",
    "drizzle-orm": "^0.39.1",
    "express": "^4.21.2"
  },
  "devDependencies": {
    "esbuild": "^0.25.0",
    "vite": "^5.4.14"
  }
}
"#;

/// Pipeline config replacing vite and esbuild with shell commands
///
/// The "bundler" records its arguments in `bundler-args.txt` and writes
/// `dist/index.js`.
#[allow(dead_code)]
pub const SAMPLE_CONFIG: &str = r#"
[frontend]
program = "sh"
args = ["-c", "mkdir -p dist/public && echo '<html></html>' > dist/public/index.html"]

[backend]
bundler_program = "sh"
bundler_args = ["-c", "printf '%s\n' \"$@\" > bundler-args.txt && echo 'console.log(1)' > dist/index.js", "esbuild"]

[deploy]
env = ["DATABASE_URL"]
"#;
