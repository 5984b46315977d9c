//! Shared helpers for integration tests

#![allow(dead_code)]

use rcgen::{CertificateParams, DnType, KeyPair, SerialNumber};

/// Self-signed certificate and key PEM for `names`, the first name doubling
/// as the common name
pub fn generate_pem(names: &[&str], serial: &[u8], not_after: (i32, u8, u8)) -> (String, String) {
    let mut params =
        CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>()).unwrap();
    params.distinguished_name.push(DnType::CommonName, names[0]);
    params.serial_number = Some(SerialNumber::from(serial.to_vec()));
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);

    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    (cert.pem(), key.serialize_pem())
}
