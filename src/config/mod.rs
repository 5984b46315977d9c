//! Configuration module for certsync
//!
//! Handles loading and validating the JSON (or TOML) options file.

pub mod settings;

pub use settings::{AliyunOptions, CertOptions, Options, QcloudOptions};

use crate::utils::ConfigError;
use std::path::Path;

/// Load and validate options from `path`
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<Options, ConfigError> {
    let mut options = Options::load_from_file(path)?;
    options.validate()?;
    Ok(options)
}
