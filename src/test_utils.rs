//! Test utilities
//!
//! Proptest generators and fake infrastructure used by unit tests.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid npm package name (lowercase alphanumeric with hyphens)
    pub fn package_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..20, 0u32..20, 0u32..20)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate an npm-style version constraint
    pub fn version_constraint() -> impl Strategy<Value = String> {
        (prop_oneof![Just("^"), Just("~"), Just(">="), Just("=")], semver_version())
            .prop_map(|(op, version)| format!("{op}{version}"))
    }

    /// Generate a dependency map with up to `max` entries
    pub fn dependency_map(
        max: usize,
    ) -> impl Strategy<Value = std::collections::BTreeMap<String, String>> {
        proptest::collection::btree_map(package_name(), version_constraint(), 0..max)
    }
}

#[cfg(test)]
pub mod fakes {
    use std::cell::RefCell;
    use std::io;
    use std::path::Path;

    use crate::error::FilesystemError;
    use crate::infra::filesystem::{FileSystem, LocalFs};
    use crate::infra::process::{Invocation, ProcessOutput, ProcessRunner};

    enum Response {
        Output(ProcessOutput),
        NotFound,
    }

    /// Scripted process runner that records every invocation
    ///
    /// Rules match when the rendered command line starts with the rule's
    /// prefix; unmatched invocations succeed with empty output.
    #[derive(Default)]
    pub struct FakeRunner {
        rules: Vec<(String, Response)>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail invocations starting with `prefix`
        #[must_use]
        pub fn fail_on(mut self, prefix: &str, code: i32, stderr: &str) -> Self {
            self.rules.push((
                prefix.to_string(),
                Response::Output(ProcessOutput {
                    code: Some(code),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
            ));
            self
        }

        /// Simulate a program that is not installed
        #[must_use]
        pub fn missing(mut self, prefix: &str) -> Self {
            self.rules.push((prefix.to_string(), Response::NotFound));
            self
        }

        /// Recorded invocations, in call order
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }

        /// Recorded command lines, in call order
        pub fn command_lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(Invocation::display).collect()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            let line = invocation.display();

            match self.rules.iter().find(|(prefix, _)| line.starts_with(prefix)) {
                Some((_, Response::Output(out))) => Ok(out.clone()),
                Some((_, Response::NotFound)) => {
                    Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
                }
                None => Ok(ProcessOutput {
                    code: Some(0),
                    ..ProcessOutput::default()
                }),
            }
        }
    }

    /// Local filesystem that refuses to write files with a given name
    pub struct ReadOnlyFileFs {
        pub file_name: &'static str,
    }

    impl FileSystem for ReadOnlyFileFs {
        fn exists(&self, path: &Path) -> bool {
            LocalFs.exists(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            LocalFs.is_dir(path)
        }

        fn create_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
            LocalFs.create_dir_all(path)
        }

        fn remove_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
            LocalFs.remove_dir_all(path)
        }

        fn write_file(&self, path: &Path, content: &str) -> Result<(), FilesystemError> {
            if path.file_name().is_some_and(|n| n == self.file_name) {
                return Err(FilesystemError::WriteFile {
                    path: path.to_path_buf(),
                    error: "Permission denied (os error 13)".to_string(),
                });
            }
            LocalFs.write_file(path, content)
        }

        fn read_to_string(&self, path: &Path) -> Result<String, FilesystemError> {
            LocalFs.read_to_string(path)
        }

        fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FilesystemError> {
            LocalFs.copy_file(from, to)
        }

        fn copy_tree(&self, from: &Path, to: &Path) -> Result<usize, FilesystemError> {
            LocalFs.copy_tree(from, to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_name_generator(name in package_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_version_constraint_generator_parses(constraint in version_constraint()) {
            prop_assert!(semver::VersionReq::parse(&constraint).is_ok());
        }
    }
}
