//! fedprov CLI library.
//!
//! Exposes the orchestration, configuration and reporting modules so
//! integration tests can drive the provisioning workflow directly; the
//! binary entry point lives in `main.rs`.

pub mod commands;
pub mod config;
pub mod error;
pub mod names;
pub mod orchestrator;
pub mod report;
