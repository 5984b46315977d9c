//! certsync library
//!
//! Keeps one local TLS certificate in service across cloud certificate
//! managers:
//! - Aliyun CAS: upload when the serial number is new, then bind every
//!   configured CDN domain to it
//! - Tencent Cloud SSL: upload when no certificate for the same domains and
//!   expiry exists, then move deployments off older certificates
//!
//! # Usage
//!
//! ```rust,ignore
//! use certsync::runner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let result = runner::run("config.json".as_ref(), &|_| {}, &|_| {}).await?;
//!     println!("{} provider(s) reconciled", result.reports.len());
//!     Ok(())
//! }
//! ```

pub mod cert_ops;
pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod providers;
pub mod reconcile;
pub mod runner;
pub mod utils;

// Re-export commonly used types
pub use cli::Cli;
pub use config::Options;
pub use models::{LocalCertificate, RemoteCertificateRecord, ResolvedCertificate};
pub use reconcile::{reconcile, CertificateProvider, ReconcileReport};
pub use utils::{Result, SyncError};
