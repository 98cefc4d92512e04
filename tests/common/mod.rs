//! Common test utilities for the petlink CLI.
//!
//! This module provides infrastructure for end-to-end CLI testing with:
//! - `cli`: CLI runner with output verification and fluent assertions
//! - `fixtures`: Seeded database files for registry scenarios
#![allow(dead_code)]

pub mod cli;
pub mod fixtures;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
