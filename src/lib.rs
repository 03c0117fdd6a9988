//! Distforge - staged production builds for full-stack JavaScript apps
//!
//! Builds the frontend and backend, keeps compiled native dependencies out
//! of the backend bundle and writes a production manifest that guarantees
//! they get installed on the deployment host.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (stages, synthesis, verification)
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
