//! Custom error types for certsync
//!
//! One `thiserror` enum per failure domain, unified under [`SyncError`].
//! Nothing here is retried: a provider error aborts that provider's run,
//! except [`ProviderError::NoDeployableInstance`] which the replacement
//! engine treats as a completed replacement.

use thiserror::Error;

/// Top-level error type for a reconciliation run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("No cloud provider configured")]
    NoProvider,
}

/// Local certificate loading errors
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Invalid PEM: {message}")]
    InvalidPem { message: String },

    #[error("Failed to parse certificate: {message}")]
    ParseError { message: String },

    #[error("Certificate serial number is missing")]
    MissingSerial,

    #[error("Certificate expired at {not_after}")]
    Expired { not_after: String },
}

/// Errors reported by, or while talking to, a cloud provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} API error {code}: {message} (request id: {request_id})")]
    Api {
        provider: &'static str,
        code: String,
        message: String,
        request_id: String,
    },

    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} endpoint {endpoint} is not a valid URL: {message}")]
    InvalidEndpoint {
        provider: &'static str,
        endpoint: String,
        message: String,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("Certificate {certificate_id} has no deployable instance")]
    NoDeployableInstance { certificate_id: String },
}

impl ProviderError {
    /// Whether this is the tolerated "nothing deployed, nothing to migrate" condition
    pub fn is_no_deployable_instance(&self) -> bool {
        matches!(self, ProviderError::NoDeployableInstance { .. })
    }
}

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
