//! Library half of the `topology` CLI
//!
//! Configuration loading, client wiring, logging and output rendering live
//! here so they can be tested without running the binary.

pub mod logging;
pub mod output;
pub mod overrides;
pub mod session;

pub use output::{OutputFormat, render_view};
