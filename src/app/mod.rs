//! Application glue module
//!
//! Session configuration and logging setup.

mod config;
mod logging;

pub use config::SessionConfig;
pub use logging::init_logging;
