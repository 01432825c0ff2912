//! Cross-module tests for the battle core.
//!
//! - **Determinism tests**: same seed and inputs give identical battles
//! - **Integration tests**: end-to-end scenarios through the scheduler and
//!   the action pipeline
//! - **Helper functions**: utilities for test setup
//!
//! # Test Structure
//!
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `integration.rs`: End-to-end battle scenarios
//! - `helpers.rs`: Test setup utilities and factory functions

mod determinism;
pub(crate) mod helpers;
mod integration;
