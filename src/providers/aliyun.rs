//! Aliyun certificate management service (CAS) and CDN
//!
//! Certificates are matched by serial number; the CAS listing reports
//! serials as hex strings. After upload-or-reuse every configured CDN domain
//! is bound to the certificate.

use super::signer::{form_encode, sign_acs3};
use super::{build_http_client, json_id, Endpoint};
use crate::config::AliyunOptions;
use crate::models::{DomainBinding, LocalCertificate, RemoteCertificateRecord, ResolvedCertificate};
use crate::reconcile::{
    reconcile_bindings, ApplyReport, CertificateProvider, DomainBinder, MatchStrategy,
    SerialEncoding,
};
use crate::utils::ProviderError;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tracing::debug;

const PROVIDER: &str = "aliyun";

const CAS_ENDPOINT: &str = "cas.aliyuncs.com";
const CAS_VERSION: &str = "2020-04-07";
const CDN_ENDPOINT: &str = "cdn.aliyuncs.com";
const CDN_VERSION: &str = "2018-05-10";

/// Records requested per ListUserCertificateOrder page
const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListUserCertificateOrderResponse {
    #[serde(default)]
    total_count: Option<usize>,
    #[serde(default)]
    certificate_order_list: Option<Vec<CertificateOrder>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateOrder {
    certificate_id: Option<serde_json::Value>,
    serial_no: Option<String>,
    name: Option<String>,
    /// Milliseconds since the epoch
    cert_end_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadUserCertificateResponse {
    cert_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDomainCertificateInfoResponse {
    cert_infos: Option<CertInfos>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertInfos {
    #[serde(default)]
    cert_info: Vec<CertInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertInfo {
    cert_id: Option<serde_json::Value>,
}

/// Signed RPC-style client for one Aliyun product endpoint
struct RpcClient {
    http: reqwest::Client,
    access_key_id: String,
    access_key_secret: String,
    endpoint: Endpoint,
    version: &'static str,
}

impl RpcClient {
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let body = form_encode(&params);
        let nonce = uuid::Uuid::new_v4().to_string();
        let signed = sign_acs3(
            &self.access_key_id,
            &self.access_key_secret,
            &self.endpoint.host,
            action,
            self.version,
            &body,
            Utc::now(),
            &nonce,
        );

        debug!("{} {} {}", PROVIDER, self.endpoint.host, action);

        let mut request = self.http.post(&self.endpoint.url).body(body);
        for (name, value) in signed.headers {
            // reqwest derives Host from the URL
            if name != "host" {
                request = request.header(name, value);
            }
        }

        let response = request.send().await.map_err(|source| ProviderError::Http {
            provider: PROVIDER,
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ProviderError::Http {
            provider: PROVIDER,
            source,
        })?;

        decode_response(status.is_success(), &text)
    }
}

fn decode_response<T: DeserializeOwned>(success: bool, text: &str) -> Result<T, ProviderError> {
    if !success {
        let error: ErrorBody = serde_json::from_str(text).map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: format!("{}: {}", e, text),
        })?;
        return Err(ProviderError::Api {
            provider: PROVIDER,
            code: error.code,
            message: error.message,
            request_id: error.request_id,
        });
    }

    serde_json::from_str(text).map_err(|e| ProviderError::Decode {
        provider: PROVIDER,
        message: e.to_string(),
    })
}

fn to_record(order: CertificateOrder) -> Option<RemoteCertificateRecord> {
    let id = order.certificate_id.as_ref().and_then(json_id)?;
    Some(RemoteCertificateRecord {
        id,
        name: order.name,
        serial_number: order.serial_no,
        domains: None,
        expires_at: order
            .cert_end_time
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    })
}

/// Aliyun CAS inventory with CDN domain bindings
pub struct AliyunProvider {
    cas: RpcClient,
    cdn: RpcClient,
    cdn_domains: Vec<String>,
}

impl AliyunProvider {
    pub fn new(options: &AliyunOptions) -> Result<Self, ProviderError> {
        let http = build_http_client(PROVIDER)?;
        let client = |endpoint: &Option<String>, default: &str, version| {
            Ok::<_, ProviderError>(RpcClient {
                http: http.clone(),
                access_key_id: options.access_key_id.clone(),
                access_key_secret: options.access_key_secret.clone(),
                endpoint: Endpoint::resolve(PROVIDER, endpoint.as_deref(), default)?,
                version,
            })
        };

        Ok(Self {
            cas: client(&options.cas_endpoint, CAS_ENDPOINT, CAS_VERSION)?,
            cdn: client(&options.cdn_endpoint, CDN_ENDPOINT, CDN_VERSION)?,
            cdn_domains: options.cdn_domains.clone(),
        })
    }
}

#[async_trait]
impl CertificateProvider for AliyunProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn match_strategy(&self) -> MatchStrategy {
        MatchStrategy::SerialNumber(SerialEncoding::Hex)
    }

    async fn list_certificates(&self) -> Result<Vec<RemoteCertificateRecord>, ProviderError> {
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            let response: ListUserCertificateOrderResponse = self
                .cas
                .call(
                    "ListUserCertificateOrder",
                    &[
                        ("OrderType", "UPLOAD".to_string()),
                        ("CurrentPage", page.to_string()),
                        ("ShowSize", PAGE_SIZE.to_string()),
                    ],
                )
                .await?;

            let orders = response.certificate_order_list.unwrap_or_default();
            let fetched = orders.len();
            records.extend(orders.into_iter().filter_map(to_record));

            let total = response.total_count.unwrap_or(0);
            if fetched < PAGE_SIZE || page * PAGE_SIZE >= total {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn upload_certificate(&self, local: &LocalCertificate) -> Result<String, ProviderError> {
        let response: UploadUserCertificateResponse = self
            .cas
            .call(
                "UploadUserCertificate",
                &[
                    ("Name", local.display_name.clone()),
                    ("Cert", local.pem_cert.clone()),
                    ("Key", local.pem_key.clone()),
                ],
            )
            .await?;

        response
            .cert_id
            .as_ref()
            .and_then(json_id)
            .ok_or_else(|| ProviderError::Decode {
                provider: PROVIDER,
                message: "UploadUserCertificate returned no CertId".to_string(),
            })
    }

    async fn apply(
        &self,
        _local: &LocalCertificate,
        _listing: &[RemoteCertificateRecord],
        resolved: &ResolvedCertificate,
    ) -> Result<ApplyReport, ProviderError> {
        let report = reconcile_bindings(self, &self.cdn_domains, resolved).await?;
        Ok(ApplyReport::Bindings(report))
    }
}

#[async_trait]
impl DomainBinder for AliyunProvider {
    async fn current_binding(&self, domain: &str) -> Result<DomainBinding, ProviderError> {
        let response: DescribeDomainCertificateInfoResponse = self
            .cdn
            .call(
                "DescribeDomainCertificateInfo",
                &[("DomainName", domain.to_string())],
            )
            .await?;

        let certificate_ids = response
            .cert_infos
            .map(|infos| {
                infos
                    .cert_info
                    .iter()
                    .filter_map(|info| info.cert_id.as_ref().and_then(json_id))
                    .collect()
            })
            .unwrap_or_default();

        Ok(DomainBinding {
            domain: domain.to_string(),
            certificate_ids,
        })
    }

    async fn bind_certificate(
        &self,
        domain: &str,
        certificate: &ResolvedCertificate,
    ) -> Result<(), ProviderError> {
        let _: IgnoredAny = self
            .cdn
            .call(
                "SetCdnDomainSSLCertificate",
                &[
                    ("DomainName", domain.to_string()),
                    ("CertType", "cas".to_string()),
                    ("CertId", certificate.id.clone()),
                    ("CertName", certificate.name.clone()),
                    ("SSLProtocol", "on".to_string()),
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_certificate_orders() {
        let body = r#"{
            "RequestId": "A1",
            "TotalCount": 3,
            "CertificateOrderList": [
                {"CertificateId": 12345, "SerialNo": "0abcdef", "Name": "example-20300101000000", "CertEndTime": 1893456000000},
                {"CertificateId": 12346, "Name": "no-serial"},
                {"SerialNo": "ff", "Name": "no-id"}
            ]
        }"#;

        let response: ListUserCertificateOrderResponse = decode_response(true, body).unwrap();
        assert_eq!(response.total_count, Some(3));

        let records: Vec<_> = response
            .certificate_order_list
            .unwrap()
            .into_iter()
            .filter_map(to_record)
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "12345");
        assert_eq!(records[0].serial_number.as_deref(), Some("0abcdef"));
        assert_eq!(
            records[0].expires_at.unwrap().format("%Y-%m-%d").to_string(),
            "2030-01-01"
        );
        assert!(records[1].serial_number.is_none());
    }

    #[test]
    fn test_decode_error_body() {
        let body = r#"{"RequestId": "R9", "Code": "InvalidAccessKeyId.NotFound", "Message": "Specified access key is not found."}"#;
        let err = decode_response::<IgnoredAny>(false, body).unwrap_err();

        match err {
            ProviderError::Api {
                code, request_id, ..
            } => {
                assert_eq!(code, "InvalidAccessKeyId.NotFound");
                assert_eq!(request_id, "R9");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_decode_domain_cert_info_string_ids() {
        let body = r#"{"CertInfos": {"CertInfo": [{"CertId": "12345", "DomainName": "cdn.example.com"}]}}"#;
        let response: DescribeDomainCertificateInfoResponse = decode_response(true, body).unwrap();
        let ids: Vec<String> = response
            .cert_infos
            .unwrap()
            .cert_info
            .iter()
            .filter_map(|i| i.cert_id.as_ref().and_then(json_id))
            .collect();
        assert_eq!(ids, vec!["12345"]);
    }

    #[test]
    fn test_provider_uses_hex_serials() {
        let options = AliyunOptions {
            access_key_id: "id".to_string(),
            access_key_secret: "secret".to_string(),
            ..Default::default()
        };
        let provider = AliyunProvider::new(&options).unwrap();
        assert_eq!(
            provider.match_strategy(),
            MatchStrategy::SerialNumber(SerialEncoding::Hex)
        );
        assert_eq!(provider.cas.endpoint.host, CAS_ENDPOINT);
        assert_eq!(provider.cdn.endpoint.url, format!("https://{}/", CDN_ENDPOINT));
    }
}
