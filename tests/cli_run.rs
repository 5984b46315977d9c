//! Integration tests for the certsync binary
//!
//! Provider calls go to a wiremock server through the endpoint overrides.

mod common;

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn certsync_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_certsync"))
}

fn run_with_config(content: &str, suffix: &str) -> Output {
    let mut config = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    config.write_all(content.as_bytes()).unwrap();

    Command::new(certsync_bin())
        .args(["--no-color", "--conf", config.path().to_str().unwrap()])
        .output()
        .expect("Failed to execute")
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_config_file() {
    let output = Command::new(certsync_bin())
        .args(["--conf", "/nonexistent/certsync.json"])
        .output()
        .expect("Failed to execute");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
    assert!(
        stderr.contains("/nonexistent/certsync.json"),
        "Should name the missing file: {}",
        stderr
    );
}

#[test]
fn test_no_provider_configured() {
    let output = run_with_config(r#"{"cert": {"cert_pem": "c", "key_pem": "k"}}"#, ".json");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("No cloud provider configured"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_missing_secret_in_toml() {
    let output = run_with_config(
        r#"
        [cert]
        cert_pem = "c"
        key_pem = "k"

        [qcloud]
        secret_id = "id"
        "#,
        ".toml",
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("qcloud.secret_key and qcloud.secret_key_file"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_expired_certificate_stops_before_providers() {
    let (cert, key) = common::generate_pem(&["expired.example.com"], &[0x01], (2021, 1, 1));
    let cert_file = write_temp(&cert);
    let key_file = write_temp(&key);

    let config = serde_json::json!({
        "cert": {
            "cert_pem_file": cert_file.path(),
            "key_pem_file": key_file.path(),
        },
        "aliyun": {
            "access_key_id": "id",
            "access_key_secret": "secret",
            "cdn_domains": ["cdn.example.com"],
            // unroutable so a stray request would fail loudly
            "cas_endpoint": "127.0.0.1:1",
            "cdn_endpoint": "127.0.0.1:1",
        },
    });
    let output = run_with_config(&config.to_string(), ".json");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("failed to load local certificate"),
        "stderr: {}",
        stderr
    );
    assert!(stderr.contains("expired"), "stderr: {}", stderr);
}

#[test]
fn test_help() {
    let output = Command::new(certsync_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--conf"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_report_for_successful_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-tc-action", "DescribeCertificates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Response": {"TotalCount": 0, "Certificates": [], "RequestId": "list"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-tc-action", "UploadCertificate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Response": {"CertificateId": "uploaded-1", "RequestId": "up"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (cert, key) = common::generate_pem(&["www.example.com"], &[0x42], (2099, 1, 1));
    let cert_file = write_temp(&cert);
    let key_file = write_temp(&key);
    let config = serde_json::json!({
        "cert": {
            "cert_pem_file": cert_file.path(),
            "key_pem_file": key_file.path(),
        },
        "qcloud": {
            "secret_id": "AKIDEXAMPLE",
            "secret_key": "secret",
            "resource_types": ["cdn"],
            "endpoint": server.uri(),
        },
    });

    let mut config_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    config_file.write_all(config.to_string().as_bytes()).unwrap();
    let output = Command::new(certsync_bin())
        .args(["--json", "--conf", config_file.path().to_str().unwrap()])
        .output()
        .expect("Failed to execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(report["certificate"]["name"], "www-example-com-20990101000000");
    assert_eq!(report["providers"][0]["provider"], "qcloud");
    assert_eq!(report["providers"][0]["certificate"]["id"], "uploaded-1");
    assert_eq!(report["providers"][0]["certificate"]["uploaded"], true);
    assert_eq!(
        report["providers"][0]["applied"],
        serde_json::json!({"kind": "replacements", "replaced": []})
    );
}
