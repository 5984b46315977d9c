//! Remote inventory matching
//!
//! Two rules live here and must stay separate:
//! - [`find_existing`] decides whether a remote record *is* the local
//!   certificate (strict: serial equality, or same domains within the expiry
//!   window).
//! - [`expiring_candidates`] finds *other* records for the same domains that
//!   the local certificate should supersede (loose: same domains, expiry not
//!   after the local one).
//!
//! Records missing the fields a rule needs are skipped. The first match in
//! listing order wins.

use crate::models::{LocalCertificate, RemoteCertificateRecord};
use chrono::Duration;
use num_bigint::BigUint;

/// Window within which a same-domain remote certificate counts as the local one
pub const EXPIRY_TOLERANCE_HOURS: i64 = 48;

/// How a provider renders certificate serial numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialEncoding {
    Hex,
    Decimal,
}

/// How a provider's records are compared against the local certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Numeric serial-number equality
    SerialNumber(SerialEncoding),
    /// Same domain fingerprint and expiry within `tolerance`
    DomainFingerprint { tolerance: Duration },
}

impl MatchStrategy {
    /// Fingerprint matching with the standard 48 hour window
    pub fn fingerprint_window() -> Self {
        MatchStrategy::DomainFingerprint {
            tolerance: Duration::hours(EXPIRY_TOLERANCE_HOURS),
        }
    }
}

/// Parse a provider serial string into an integer.
///
/// Tolerates surrounding whitespace, `:` separators and a `0x` prefix on hex
/// values. Returns `None` for anything unparseable.
pub fn parse_serial(raw: &str, encoding: SerialEncoding) -> Option<BigUint> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .collect();

    let (digits, radix) = match encoding {
        SerialEncoding::Hex => {
            let digits = cleaned
                .strip_prefix("0x")
                .or_else(|| cleaned.strip_prefix("0X"))
                .unwrap_or(&cleaned);
            (digits, 16)
        }
        SerialEncoding::Decimal => (cleaned.as_str(), 10),
    };

    if digits.is_empty() {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
}

/// Find the remote record that already represents `local`
pub fn find_existing<'a>(
    local: &LocalCertificate,
    records: &'a [RemoteCertificateRecord],
    strategy: MatchStrategy,
) -> Option<&'a RemoteCertificateRecord> {
    match strategy {
        MatchStrategy::SerialNumber(encoding) => records.iter().find(|record| {
            record
                .serial_number
                .as_deref()
                .and_then(|raw| parse_serial(raw, encoding))
                .is_some_and(|serial| serial == local.serial_number)
        }),
        MatchStrategy::DomainFingerprint { tolerance } => {
            let fingerprint = local.fingerprint();
            records.iter().find(|record| {
                let (Some(domains), Some(expires_at)) = (&record.domains, record.expires_at) else {
                    return false;
                };
                *domains == fingerprint && (expires_at - local.not_after).abs() <= tolerance
            })
        }
    }
}

/// Records for the same domains as `local` that expire no later than it does,
/// excluding the resolved certificate itself
pub fn expiring_candidates<'a>(
    local: &LocalCertificate,
    records: &'a [RemoteCertificateRecord],
    resolved_id: &str,
) -> Vec<&'a RemoteCertificateRecord> {
    let fingerprint = local.fingerprint();

    records
        .iter()
        .filter(|record| record.id != resolved_id)
        .filter(|record| record.domains.as_ref() == Some(&fingerprint))
        .filter(|record| {
            record
                .expires_at
                .is_some_and(|expires_at| expires_at <= local.not_after)
        })
        .collect()
}
