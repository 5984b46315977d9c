//! Tencent Cloud SSL certificate service
//!
//! The SSL service stores certificates separately from the resources that
//! use them, and can move every deployment of one certificate onto another.
//! Its listing carries no serial numbers, so certificates are matched by
//! domain fingerprint and expiry, and older certificates for the same
//! domains are replaced through `UpdateCertificateInstance`.

use super::signer::{sign_tc3, JSON_CONTENT_TYPE};
use super::{build_http_client, Endpoint};
use crate::config::QcloudOptions;
use crate::models::{
    DeploymentTargets, DomainFingerprint, LocalCertificate, RemoteCertificateRecord,
    ReplacementJob, ResolvedCertificate,
};
use crate::reconcile::{
    ApplyReport, CertificateProvider, CertificateRedeployer, MatchStrategy, ReplacementEngine,
};
use crate::utils::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "qcloud";

const SSL_ENDPOINT: &str = "ssl.tencentcloudapi.com";
const SSL_SERVICE: &str = "ssl";
const SSL_VERSION: &str = "2019-12-05";

/// Server certificates, as opposed to CA certificates
const CERTIFICATE_TYPE: &str = "SVR";

/// Largest page DescribeCertificates accepts
const PAGE_SIZE: usize = 1000;

/// Returned by UpdateCertificateInstance when the old certificate has no
/// cloud resources bound to it
pub const NO_DEPLOYABLE_INSTANCE: &str = "FailedOperation.CertificateDeployInstanceEmpty";

/// CertEndTime is reported in China Standard Time
const CERT_TIME_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeCertificatesResponse {
    #[serde(default)]
    total_count: Option<usize>,
    #[serde(default)]
    certificates: Option<Vec<Certificate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Certificate {
    certificate_id: Option<String>,
    alias: Option<String>,
    domain: Option<String>,
    subject_alt_name: Option<Vec<String>>,
    cert_end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadCertificateResponse {
    certificate_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateCertificateInstanceResponse {
    deploy_record_id: Option<u64>,
}

/// TC3-signed JSON client for the SSL endpoint
struct Tc3Client {
    http: reqwest::Client,
    secret_id: String,
    secret_key: String,
    endpoint: Endpoint,
}

impl Tc3Client {
    async fn call<T: DeserializeOwned>(&self, action: &str, payload: &Value) -> Result<T, ProviderError> {
        let body = payload.to_string();
        let now = Utc::now();
        let authorization = sign_tc3(
            &self.secret_id,
            &self.secret_key,
            SSL_SERVICE,
            &self.endpoint.host,
            action,
            &body,
            now,
        );

        debug!("{} {} {}", PROVIDER, self.endpoint.host, action);

        let response = self
            .http
            .post(&self.endpoint.url)
            .header("authorization", authorization)
            .header("content-type", JSON_CONTENT_TYPE)
            .header("x-tc-action", action)
            .header("x-tc-timestamp", now.timestamp().to_string())
            .header("x-tc-version", SSL_VERSION)
            .body(body)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let text = response.text().await.map_err(|source| ProviderError::Http {
            provider: PROVIDER,
            source,
        })?;

        decode_response(&text)
    }
}

/// Unwrap the `{"Response": {...}}` envelope, surfacing `Response.Error`
fn decode_response<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    let decode_error = |message: String| ProviderError::Decode {
        provider: PROVIDER,
        message,
    };

    let mut envelope: Value = serde_json::from_str(text).map_err(|e| decode_error(e.to_string()))?;
    let response = envelope
        .get_mut("Response")
        .map(Value::take)
        .ok_or_else(|| decode_error(format!("missing Response in {}", text)))?;

    if let Some(error) = response.get("Error") {
        let error: ApiError =
            serde_json::from_value(error.clone()).map_err(|e| decode_error(e.to_string()))?;
        return Err(ProviderError::Api {
            provider: PROVIDER,
            code: error.code,
            message: error.message,
            request_id: response
                .get("RequestId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    serde_json::from_value(response).map_err(|e| decode_error(e.to_string()))
}

fn parse_cert_time(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    let offset = FixedOffset::east_opt(CERT_TIME_OFFSET_SECS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

fn to_record(certificate: Certificate) -> Option<RemoteCertificateRecord> {
    let id = certificate.certificate_id.filter(|id| !id.is_empty())?;

    let names = match certificate.subject_alt_name {
        Some(names) if !names.is_empty() => names,
        _ => certificate.domain.into_iter().collect(),
    };
    let domains = Some(DomainFingerprint::from_names(names)).filter(|fp| !fp.is_empty());

    Some(RemoteCertificateRecord {
        id,
        name: certificate.alias,
        serial_number: None,
        domains,
        expires_at: certificate.cert_end_time.as_deref().and_then(parse_cert_time),
    })
}

fn replacement_payload(job: &ReplacementJob) -> Value {
    let regions: Vec<Value> = job
        .resource_regions
        .iter()
        .map(|(resource_type, regions)| {
            json!({
                "ResourceType": resource_type,
                "Regions": regions,
            })
        })
        .collect();

    let mut payload = json!({
        "OldCertificateId": job.old_certificate_id,
        "CertificateId": job.new_certificate_id,
        "ResourceTypes": job.resource_types,
    });
    if !regions.is_empty() {
        payload["ResourceTypesRegions"] = Value::Array(regions);
    }
    payload
}

/// Tencent Cloud SSL inventory with cross-resource replacement
pub struct QcloudProvider {
    client: Tc3Client,
    targets: DeploymentTargets,
    poll_interval: Duration,
}

impl QcloudProvider {
    pub fn new(options: &QcloudOptions) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Tc3Client {
                http: build_http_client(PROVIDER)?,
                secret_id: options.secret_id.clone(),
                secret_key: options.secret_key.clone(),
                endpoint: Endpoint::resolve(PROVIDER, options.endpoint.as_deref(), SSL_ENDPOINT)?,
            },
            targets: options.deployment_targets(),
            poll_interval: options.poll_interval(),
        })
    }
}

#[async_trait]
impl CertificateProvider for QcloudProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn match_strategy(&self) -> MatchStrategy {
        MatchStrategy::fingerprint_window()
    }

    async fn list_certificates(&self) -> Result<Vec<RemoteCertificateRecord>, ProviderError> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let response: DescribeCertificatesResponse = self
                .client
                .call(
                    "DescribeCertificates",
                    &json!({
                        "Offset": offset,
                        "Limit": PAGE_SIZE,
                        "CertificateType": CERTIFICATE_TYPE,
                    }),
                )
                .await?;

            let certificates = response.certificates.unwrap_or_default();
            let fetched = certificates.len();
            records.extend(certificates.into_iter().filter_map(to_record));

            offset += fetched;
            if fetched < PAGE_SIZE || offset >= response.total_count.unwrap_or(0) {
                break;
            }
        }

        Ok(records)
    }

    async fn upload_certificate(&self, local: &LocalCertificate) -> Result<String, ProviderError> {
        let response: UploadCertificateResponse = self
            .client
            .call(
                "UploadCertificate",
                &json!({
                    "CertificatePublicKey": local.pem_cert,
                    "CertificatePrivateKey": local.pem_key,
                    "CertificateType": CERTIFICATE_TYPE,
                    "Alias": local.display_name,
                    "Repeatable": false,
                }),
            )
            .await?;

        response
            .certificate_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER,
                message: "UploadCertificate returned no CertificateId".to_string(),
            })
    }

    async fn apply(
        &self,
        local: &LocalCertificate,
        listing: &[RemoteCertificateRecord],
        resolved: &ResolvedCertificate,
    ) -> Result<ApplyReport, ProviderError> {
        let engine = ReplacementEngine::new(self, &self.targets, self.poll_interval);
        let report = engine.run(local, listing, resolved).await?;
        Ok(ApplyReport::Replacements(report))
    }
}

#[async_trait]
impl CertificateRedeployer for QcloudProvider {
    async fn submit_replacement(&self, job: &ReplacementJob) -> Result<Option<u64>, ProviderError> {
        let result: Result<UpdateCertificateInstanceResponse, ProviderError> = self
            .client
            .call("UpdateCertificateInstance", &replacement_payload(job))
            .await;

        match result {
            Ok(response) => Ok(response.deploy_record_id),
            Err(ProviderError::Api { code, .. }) if code == NO_DEPLOYABLE_INSTANCE => {
                Err(ProviderError::NoDeployableInstance {
                    certificate_id: job.old_certificate_id.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
