//! Core business logic module
//!
//! Stages, manifest synthesis and verification. Side effects go through the
//! [`crate::infra`] traits handed in by the caller.
//!
//! # Submodules
//!
//! - [`config`] - Pipeline configuration (distforge.toml)
//! - [`manifest`] - Source manifest (package.json) parsing
//! - [`native`] - Native dependency registry
//! - [`version`] - Version constraint checks
//! - [`stage`] - Build stage abstraction
//! - [`frontend`] - Frontend build stage
//! - [`backend`] - Backend build strategies
//! - [`synthesize`] - Production manifest synthesis
//! - [`artifacts`] - Auxiliary files, deployment notes and smoke script
//! - [`verify`] - Deployment verification
//! - [`clean`] - Output directory lifecycle
//! - [`pipeline`] - Stage orchestration

pub mod artifacts;
pub mod backend;
pub mod clean;
pub mod config;
pub mod frontend;
pub mod manifest;
pub mod native;
pub mod pipeline;
pub mod stage;
pub mod synthesize;
pub mod verify;
pub mod version;
