//! Progress reporting for the CLI
//!
//! Builds are synchronous, so progress is a steadily ticking spinner on
//! stderr rather than a bar with known length.

mod spinner;
mod utils;

pub use spinner::CrawlSpinner;
pub use utils::format_elapsed;
