//! SurfsUp Core Library
//!
//! Shared utilities for the climate API service:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Application constants

mod config;
pub mod fs;

pub use config::{find_config_file, get_xdg_data_dir, load_config, ConfigSource};
pub use fs::is_file;

/// Application name used for XDG paths
pub const APP_NAME: &str = "surfsup";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 5000;

/// File name of the climate database searched for in the data directories
pub const DEFAULT_DATABASE_FILE: &str = "hawaii.sqlite";
