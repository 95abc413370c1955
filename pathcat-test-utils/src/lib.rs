//! Test utilities for pathcat
//!
//! Builders for on-disk directory trees and the fixtures shared by the core
//! and CLI test suites.

pub mod builders;
pub mod fixtures;

// Re-export commonly used types
pub use builders::{TestTree, TestTreeBuilder};
