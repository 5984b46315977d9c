//! Certificate and key PEM reading
//!
//! Parses the leaf certificate with x509-parser and checks the invariants a
//! reconciliation relies on: a present serial number and a notAfter that is
//! still in the future.

use crate::models::LocalCertificate;
use crate::utils::CertificateError;
use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigUint;
use x509_parser::prelude::*;

/// Timestamp layout appended to display names
const NAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Load the local certificate from its PEM text and the matching key PEM.
///
/// The first PEM block must be the leaf certificate; any further blocks
/// (intermediates) are kept in `pem_cert` untouched.
pub fn load_local_certificate(
    cert_pem: &str,
    key_pem: &str,
    name_prefix: Option<&str>,
    now: DateTime<Utc>,
) -> Result<LocalCertificate, CertificateError> {
    let der = read_leaf_der(cert_pem)?;
    check_private_key(key_pem)?;

    let (_, cert) =
        X509Certificate::from_der(&der).map_err(|e| CertificateError::ParseError {
            message: format!("Failed to parse certificate: {:?}", e),
        })?;

    let raw_serial = cert.raw_serial();
    if raw_serial.is_empty() {
        return Err(CertificateError::MissingSerial);
    }
    let serial_number = BigUint::from_bytes_be(raw_serial);

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    let dns_names = extract_dns_names(&cert);
    let not_after = asn1_time_to_datetime(cert.validity().not_after)?;

    if now >= not_after {
        return Err(CertificateError::Expired {
            not_after: not_after.to_rfc3339(),
        });
    }

    let display_name = derive_display_name(name_prefix, &common_name, &dns_names, not_after);

    Ok(LocalCertificate {
        serial_number,
        common_name,
        dns_names,
        not_after,
        pem_cert: cert_pem.to_string(),
        pem_key: key_pem.to_string(),
        display_name,
    })
}

/// Build the upload name: `<prefix>-<notAfter as YYYYMMDDhhmmss>`.
///
/// Without a configured prefix the shortest of the certificate's names is
/// used, minus any leading `*.`, with dots replaced by dashes.
pub fn derive_display_name(
    name_prefix: Option<&str>,
    common_name: &str,
    dns_names: &[String],
    not_after: DateTime<Utc>,
) -> String {
    let prefix = match name_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => prefix.to_string(),
        None => {
            let shortest = std::iter::once(common_name)
                .chain(dns_names.iter().map(String::as_str))
                .filter(|n| !n.is_empty())
                .min_by_key(|n| n.len())
                .unwrap_or_default();
            shortest
                .strip_prefix("*.")
                .unwrap_or(shortest)
                .replace('.', "-")
        }
    };

    format!("{}-{}", prefix, not_after.format(NAME_TIME_FORMAT))
}

fn read_leaf_der(cert_pem: &str) -> Result<Vec<u8>, CertificateError> {
    let blocks = ::pem::parse_many(cert_pem).map_err(|e| CertificateError::InvalidPem {
        message: format!("Failed to parse certificate PEM: {}", e),
    })?;

    match blocks.into_iter().next() {
        Some(block) if block.tag() == "CERTIFICATE" => Ok(block.into_contents()),
        Some(block) => Err(CertificateError::InvalidPem {
            message: format!("Expected a CERTIFICATE block, found {}", block.tag()),
        }),
        None => Err(CertificateError::InvalidPem {
            message: "No PEM blocks found in certificate".to_string(),
        }),
    }
}

fn check_private_key(key_pem: &str) -> Result<(), CertificateError> {
    let blocks = ::pem::parse_many(key_pem).map_err(|e| CertificateError::InvalidPem {
        message: format!("Failed to parse key PEM: {}", e),
    })?;

    if blocks.iter().any(|b| b.tag().ends_with("PRIVATE KEY")) {
        Ok(())
    } else {
        Err(CertificateError::InvalidPem {
            message: "No PRIVATE KEY block found in key".to_string(),
        })
    }
}

fn extract_dns_names(cert: &X509Certificate) -> Vec<String> {
    let mut names = Vec::new();

    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for name in &san_ext.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                names.push(dns.to_string());
            }
        }
    }

    names
}

fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>, CertificateError> {
    Utc.timestamp_opt(time.timestamp(), 0)
        .single()
        .ok_or_else(|| CertificateError::ParseError {
            message: "Invalid timestamp in certificate".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, KeyPair, SerialNumber};

    fn generate(names: &[&str], serial: &[u8], year: i32) -> (String, String) {
        let mut params =
            CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
                .unwrap();
        params
            .distinguished_name
            .push(DnType::CommonName, names[0]);
        params.serial_number = Some(SerialNumber::from(serial.to_vec()));
        params.not_before = rcgen::date_time_ymd(2020, 1, 1);
        params.not_after = rcgen::date_time_ymd(year, 6, 1);

        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        (cert.pem(), key.serialize_pem())
    }

    #[test]
    fn test_load_extracts_attributes() {
        let (cert, key) = generate(&["a.example.com", "b.example.com"], &[0x0a, 0xbc, 0xde], 2099);
        let local = load_local_certificate(&cert, &key, Some("example"), Utc::now()).unwrap();

        assert_eq!(local.serial_number, BigUint::from(0x0abcdeu32));
        assert_eq!(local.common_name, "a.example.com");
        assert_eq!(local.dns_names, vec!["a.example.com", "b.example.com"]);
        assert_eq!(local.not_after.format("%Y-%m-%d").to_string(), "2099-06-01");
        assert_eq!(local.display_name, "example-20990601000000");
        assert_eq!(local.pem_cert, cert);
    }

    #[test]
    fn test_expired_certificate_rejected() {
        let (cert, key) = generate(&["old.example.com"], &[0x01], 2021);
        let err = load_local_certificate(&cert, &key, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CertificateError::Expired { .. }));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let (cert, key) = generate(&["edge.example.com"], &[0x02], 2099);
        let not_after = Utc.with_ymd_and_hms(2099, 6, 1, 0, 0, 0).unwrap();
        let err = load_local_certificate(&cert, &key, None, not_after).unwrap_err();
        assert!(matches!(err, CertificateError::Expired { .. }));
    }

    #[test]
    fn test_key_block_required() {
        let (cert, _) = generate(&["a.example.com"], &[0x03], 2099);
        let err = load_local_certificate(&cert, &cert, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CertificateError::InvalidPem { .. }));
    }

    #[test]
    fn test_key_first_is_invalid_cert() {
        let (_, key) = generate(&["a.example.com"], &[0x04], 2099);
        let err = load_local_certificate(&key, &key, None, Utc::now()).unwrap_err();
        assert!(matches!(err, CertificateError::InvalidPem { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = load_local_certificate("not a pem", "nor this", None, Utc::now()).unwrap_err();
        assert!(matches!(err, CertificateError::InvalidPem { .. }));
    }

    #[test]
    fn test_derived_name_uses_shortest_name() {
        let not_after = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let names = vec!["*.example.com".to_string(), "www.example.com".to_string()];
        assert_eq!(
            derive_display_name(None, "shop.example.com", &names, not_after),
            "example-com-20260304050607"
        );
    }

    #[test]
    fn test_empty_prefix_falls_back_to_derived() {
        let not_after = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            derive_display_name(Some(""), "example.org", &[], not_after),
            "example-org-20260304050607"
        );
    }
}
