//! Data models for certsync
//!
//! Every value here is built fresh for a single reconciliation run and is
//! never persisted; the cloud providers are the only source of state.

pub mod certificate;
pub mod fingerprint;
pub mod replacement;

pub use certificate::{LocalCertificate, RemoteCertificateRecord, ResolvedCertificate};
pub use fingerprint::DomainFingerprint;
pub use replacement::{DeploymentTargets, DomainBinding, ReplacementJob};
