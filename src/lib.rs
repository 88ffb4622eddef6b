// pmadump Library - Public API

// Re-export error types
pub mod error;
pub use error::{ExportError, Result};

// Module declarations
pub mod commands;
pub mod core;

// Re-export commonly used types
pub use core::exporter::{Compression, ExportOptions, Exporter, DEFAULT_PREFIX_FORMAT};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
}
