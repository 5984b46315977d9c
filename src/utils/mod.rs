//! Utility modules for certsync
//!
//! This module contains the error types shared by every layer.

pub mod error;

pub use error::{CertificateError, ConfigError, ProviderError, Result, SyncError};
