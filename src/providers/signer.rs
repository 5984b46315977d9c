//! Request signing for the cloud APIs
//!
//! Aliyun uses `ACS3-HMAC-SHA256` over a form-encoded body; Tencent Cloud uses
//! `TC3-HMAC-SHA256` over a JSON body. Both are pure functions of their
//! inputs so they can be checked without a network.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ACS3_ALGORITHM: &str = "ACS3-HMAC-SHA256";
pub const TC3_ALGORITHM: &str = "TC3-HMAC-SHA256";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length is valid");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Encode parameters as a sorted `application/x-www-form-urlencoded` body
/// using RFC 3986 percent-encoding
pub fn form_encode(params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Headers for one signed Aliyun RPC call
#[derive(Debug, Clone)]
pub struct AcsSignedHeaders {
    pub headers: Vec<(&'static str, String)>,
}

/// Sign an Aliyun RPC POST whose form body is `body`
pub fn sign_acs3(
    access_key_id: &str,
    access_key_secret: &str,
    host: &str,
    action: &str,
    version: &str,
    body: &str,
    date: DateTime<Utc>,
    nonce: &str,
) -> AcsSignedHeaders {
    let payload_hash = sha256_hex(body.as_bytes());
    let date = date.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    // sorted by header name
    let signed: Vec<(&'static str, String)> = vec![
        ("content-type", FORM_CONTENT_TYPE.to_string()),
        ("host", host.to_string()),
        ("x-acs-action", action.to_string()),
        ("x-acs-content-sha256", payload_hash.clone()),
        ("x-acs-date", date),
        ("x-acs-signature-nonce", nonce.to_string()),
        ("x-acs-version", version.to_string()),
    ];

    let canonical_headers: String = signed
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
        .collect();
    let signed_names = signed
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers, signed_names, payload_hash
    );
    let string_to_sign = format!(
        "{}\n{}",
        ACS3_ALGORITHM,
        sha256_hex(canonical_request.as_bytes())
    );
    let signature = hex::encode(hmac_sha256(
        access_key_secret.as_bytes(),
        string_to_sign.as_bytes(),
    ));

    let mut headers = signed;
    headers.push((
        "authorization",
        format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ACS3_ALGORITHM, access_key_id, signed_names, signature
        ),
    ));

    AcsSignedHeaders { headers }
}

/// Build the `Authorization` header for a Tencent Cloud API 3.0 JSON POST
pub fn sign_tc3(
    secret_id: &str,
    secret_key: &str,
    service: &str,
    host: &str,
    action: &str,
    payload: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let date = timestamp.format("%Y-%m-%d").to_string();
    let signed_names = "content-type;host;x-tc-action";

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\nx-tc-action:{}\n\n{}\n{}",
        JSON_CONTENT_TYPE,
        host,
        action.to_lowercase(),
        signed_names,
        sha256_hex(payload.as_bytes())
    );

    let scope = format!("{}/{}/tc3_request", date, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        TC3_ALGORITHM,
        timestamp.timestamp(),
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{}", secret_key).as_bytes(), date.as_bytes());
    let secret_service = hmac_sha256(&secret_date, service.as_bytes());
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        TC3_ALGORITHM, secret_id, scope, signed_names, signature
    )
}
