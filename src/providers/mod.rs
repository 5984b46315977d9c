//! Cloud provider adapters
//!
//! Each adapter implements [`CertificateProvider`](crate::reconcile::CertificateProvider)
//! over the provider's signed HTTPS API and plugs in its own matching rule
//! and follow-up step.

pub mod aliyun;
pub mod qcloud;
pub mod signer;

pub use aliyun::AliyunProvider;
pub use qcloud::QcloudProvider;

use crate::utils::ProviderError;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http_client(provider: &'static str) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("certsync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ProviderError::Http { provider, source })
}

/// Where one API is reached, and the host name its requests are signed for
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    url: String,
    host: String,
}

impl Endpoint {
    /// Resolve an optional override against the provider's default host.
    ///
    /// An override may be a bare host (`ssl.example.com`, `127.0.0.1:8443`),
    /// which is reached over HTTPS, or a full base URL such as
    /// `http://127.0.0.1:8080`.
    fn resolve(
        provider: &'static str,
        endpoint: Option<&str>,
        default_host: &str,
    ) -> Result<Self, ProviderError> {
        let raw = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(default_host);
        let invalid = |message: String| ProviderError::InvalidEndpoint {
            provider,
            endpoint: raw.to_string(),
            message,
        };

        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };
        let mut url = reqwest::Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(invalid("missing host".to_string())),
        };
        url.set_path("/");
        url.set_query(None);

        Ok(Self {
            url: url.to_string(),
            host,
        })
    }
}

/// Render a JSON id that may arrive as a string or a number
fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
