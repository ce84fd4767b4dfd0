pub mod config;
pub mod error;
pub mod logging;

pub use config::{AutoModeConfig, SelectionConfig};
pub use error::{AutoModeError, ErrorCategory};
