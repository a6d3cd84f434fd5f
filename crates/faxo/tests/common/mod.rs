//! Shared test utilities for faxo integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with temp directories
//! - Builders for creating submissions programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{TestHarness, OWNER};
