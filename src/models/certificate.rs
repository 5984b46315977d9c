//! Certificate types on both sides of a reconciliation

use super::DomainFingerprint;
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::Serialize;

/// The locally supplied certificate and key
#[derive(Debug, Clone)]
pub struct LocalCertificate {
    /// Serial number as an unsigned integer
    pub serial_number: BigUint,
    /// Subject common name (may be empty)
    pub common_name: String,
    /// DNS subject alternative names, in certificate order
    pub dns_names: Vec<String>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// Certificate PEM, exactly as supplied
    pub pem_cert: String,
    /// Private key PEM, exactly as supplied
    pub pem_key: String,
    /// Name used when uploading to a provider
    pub display_name: String,
}

impl LocalCertificate {
    /// Fingerprint of the covered names.
    ///
    /// Uses the DNS SANs; a certificate without SANs falls back to its
    /// common name.
    pub fn fingerprint(&self) -> DomainFingerprint {
        if self.dns_names.is_empty() {
            DomainFingerprint::from_names([&self.common_name])
        } else {
            DomainFingerprint::from_names(&self.dns_names)
        }
    }

    /// Common name followed by every DNS name, for log lines
    pub fn all_names(&self) -> Vec<&str> {
        std::iter::once(self.common_name.as_str())
            .chain(self.dns_names.iter().map(String::as_str))
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// One entry of a provider's certificate listing.
///
/// Fields a provider may omit are optional; the matcher skips records that
/// lack whatever its strategy needs.
#[derive(Debug, Clone)]
pub struct RemoteCertificateRecord {
    /// Provider-assigned identifier, rendered as a string
    pub id: String,
    pub name: Option<String>,
    /// Serial number in the provider's native encoding
    pub serial_number: Option<String>,
    pub domains: Option<DomainFingerprint>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The remote certificate that represents the local one after upload-or-reuse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCertificate {
    pub id: String,
    pub name: String,
    /// Whether this run uploaded it
    pub uploaded: bool,
}
