//! pathcat command line interface
//!
//! Thin shell over `pathcat_core`: configuration, output formatting, error
//! reporting and terminal handling. The binary in `main.rs` wires these to
//! the subcommands.

pub mod config;
pub mod error;
pub mod output;
pub mod progress;
pub mod terminal;
