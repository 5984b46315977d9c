//! Options file model
//!
//! Secrets and PEM material can be given inline or through a `<field>_file`
//! companion; validation resolves the file form into the inline field.

use crate::models::DeploymentTargets;
use crate::reconcile::replacement::DEFAULT_POLL_INTERVAL;
use crate::utils::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Local certificate source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertOptions {
    /// Prefix of the uploaded certificate name; derived from the
    /// certificate's names when empty
    #[serde(default)]
    pub name_prefix: String,
    #[serde(default)]
    pub cert_pem: String,
    #[serde(default)]
    pub cert_pem_file: String,
    #[serde(default)]
    pub key_pem: String,
    #[serde(default)]
    pub key_pem_file: String,
}

impl CertOptions {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        require_field_with_file("cert.cert_pem", &mut self.cert_pem, &self.cert_pem_file)?;
        require_field_with_file("cert.key_pem", &mut self.key_pem, &self.key_pem_file)?;
        Ok(())
    }

    pub fn name_prefix(&self) -> Option<&str> {
        Some(self.name_prefix.as_str()).filter(|p| !p.is_empty())
    }
}

/// Aliyun certificate management service and CDN
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliyunOptions {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_id_file: String,
    #[serde(default)]
    pub access_key_secret: String,
    #[serde(default)]
    pub access_key_secret_file: String,
    /// CDN domains that must serve the certificate
    #[serde(default)]
    pub cdn_domains: Vec<String>,
    /// CAS host or base URL; defaults to `cas.aliyuncs.com` over HTTPS
    #[serde(default)]
    pub cas_endpoint: Option<String>,
    #[serde(default)]
    pub cdn_endpoint: Option<String>,
}

impl AliyunOptions {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        require_field_with_file(
            "aliyun.access_key_id",
            &mut self.access_key_id,
            &self.access_key_id_file,
        )?;
        require_field_with_file(
            "aliyun.access_key_secret",
            &mut self.access_key_secret,
            &self.access_key_secret_file,
        )?;
        for domain in &self.cdn_domains {
            require_field("aliyun.cdn_domains[]", domain)?;
        }
        Ok(())
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

/// Tencent Cloud SSL certificate service
#[derive(Debug, Clone, Deserialize)]
pub struct QcloudOptions {
    #[serde(default)]
    pub secret_id: String,
    #[serde(default)]
    pub secret_id_file: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub secret_key_file: String,
    /// Resource types to redeploy onto the new certificate (e.g. `cdn`, `clb`)
    #[serde(default)]
    pub resource_types: Vec<String>,
    /// Regions per resource type, for regional resources
    #[serde(default)]
    pub resource_regions: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// SSL API host or base URL; defaults to `ssl.tencentcloudapi.com` over HTTPS
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for QcloudOptions {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            secret_id_file: String::new(),
            secret_key: String::new(),
            secret_key_file: String::new(),
            resource_types: Vec::new(),
            resource_regions: BTreeMap::new(),
            poll_interval_secs: default_poll_interval_secs(),
            endpoint: None,
        }
    }
}

impl QcloudOptions {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        require_field_with_file("qcloud.secret_id", &mut self.secret_id, &self.secret_id_file)?;
        require_field_with_file(
            "qcloud.secret_key",
            &mut self.secret_key,
            &self.secret_key_file,
        )?;

        for resource_type in self.resource_regions.keys() {
            if !self.resource_types.contains(resource_type) {
                return Err(ConfigError::InvalidValue {
                    key: format!("qcloud.resource_regions.{}", resource_type),
                    message: "resource type is not listed in qcloud.resource_types".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn deployment_targets(&self) -> DeploymentTargets {
        DeploymentTargets {
            resource_types: self.resource_types.iter().cloned().collect(),
            resource_regions: self
                .resource_regions
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                .collect(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Complete options file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Options {
    pub cert: Option<CertOptions>,
    pub aliyun: Option<AliyunOptions>,
    pub qcloud: Option<QcloudOptions>,
}

impl Options {
    /// Parse options from a file; `.toml` files are read as TOML, anything
    /// else as JSON
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Check required fields and resolve `_file` companions
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let cert = self.cert.as_mut().ok_or_else(|| ConfigError::MissingRequired {
            key: "cert".to_string(),
        })?;
        cert.validate()?;

        if self.aliyun.is_none() && self.qcloud.is_none() {
            return Err(ConfigError::NoProvider);
        }
        if let Some(aliyun) = self.aliyun.as_mut() {
            aliyun.validate()?;
        }
        if let Some(qcloud) = self.qcloud.as_mut() {
            qcloud.validate()?;
        }
        Ok(())
    }
}

/// Fail when `value` is empty
pub fn require_field(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: name.to_string(),
        });
    }
    Ok(())
}

/// Fill an empty `value` from `file`, trimming surrounding whitespace
pub fn require_field_with_file(
    name: &str,
    value: &mut String,
    file: &str,
) -> Result<(), ConfigError> {
    if !value.is_empty() {
        return Ok(());
    }

    if file.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: format!("{} and {}_file", name, name),
        });
    }

    let content = std::fs::read_to_string(file).map_err(|_| ConfigError::FileNotFound {
        path: file.to_string(),
    })?;
    let content = content.trim();

    if content.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: format!("{}_file", name),
            message: format!("refers to an empty file: {}", file),
        });
    }

    *value = content.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_require_field_with_file_prefers_inline() {
        let mut value = "inline".to_string();
        require_field_with_file("x", &mut value, "/does/not/exist").unwrap();
        assert_eq!(value, "inline");
    }

    #[test]
    fn test_require_field_with_file_reads_and_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\n  secret-value  \n").unwrap();

        let mut value = String::new();
        require_field_with_file("x", &mut value, file.path().to_str().unwrap()).unwrap();
        assert_eq!(value, "secret-value");
    }

    #[test]
    fn test_require_field_with_file_missing_both() {
        let mut value = String::new();
        let err = require_field_with_file("qcloud.secret_id", &mut value, "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required configuration: qcloud.secret_id and qcloud.secret_id_file"
        );
    }

    #[test]
    fn test_require_field_with_file_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut value = String::new();
        let err = require_field_with_file("x", &mut value, file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_cert_section() {
        let mut options = Options::from_json_str(r#"{"aliyun": {}}"#).unwrap();
        let err = options.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { key } if key == "cert"));
    }

    #[test]
    fn test_no_provider() {
        let mut options =
            Options::from_json_str(r#"{"cert": {"cert_pem": "c", "key_pem": "k"}}"#).unwrap();
        assert!(matches!(options.validate(), Err(ConfigError::NoProvider)));
    }

    #[test]
    fn test_qcloud_defaults_and_targets() {
        let mut options = Options::from_json_str(
            r#"{
                "cert": {"cert_pem": "c", "key_pem": "k"},
                "qcloud": {
                    "secret_id": "id",
                    "secret_key": "key",
                    "resource_types": ["clb", "cdn"],
                    "resource_regions": {"clb": ["ap-guangzhou", "ap-shanghai"]}
                }
            }"#,
        )
        .unwrap();
        options.validate().unwrap();

        let qcloud = options.qcloud.unwrap();
        assert_eq!(qcloud.poll_interval(), Duration::from_secs(5));
        let targets = qcloud.deployment_targets();
        assert_eq!(targets.resource_types.len(), 2);
        assert_eq!(targets.resource_regions["clb"].len(), 2);
    }

    #[test]
    fn test_qcloud_region_for_unlisted_type() {
        let mut options = Options::from_json_str(
            r#"{
                "cert": {"cert_pem": "c", "key_pem": "k"},
                "qcloud": {
                    "secret_id": "id",
                    "secret_key": "key",
                    "resource_types": ["cdn"],
                    "resource_regions": {"clb": ["ap-guangzhou"]}
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_toml_options() {
        let options = Options::from_toml_str(
            r#"
            [cert]
            name_prefix = "example"
            cert_pem_file = "/tls/tls.crt"
            key_pem_file = "/tls/tls.key"

            [aliyun]
            access_key_id = "id"
            access_key_secret = "secret"
            cdn_domains = ["cdn.example.com"]
            "#,
        )
        .unwrap();

        let cert = options.cert.unwrap();
        assert_eq!(cert.name_prefix(), Some("example"));
        assert_eq!(options.aliyun.unwrap().cdn_domains, vec!["cdn.example.com"]);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let options = Options::from_json_str(
            r#"{"cert": {"cert_pem": "c", "key_pem": "k"}, "aliyun": {"region_id": "cn-hangzhou"}}"#,
        )
        .unwrap();
        assert!(options.aliyun.is_some());
    }
}
