//! Reconciliation run orchestration
//!
//! Loads the options and the local certificate, builds a provider for every
//! configured section, and reconciles them one after another. The first
//! provider failure aborts the run.

use crate::cert_ops::load_local_certificate;
use crate::config::{load_options, CertOptions, Options};
use crate::models::LocalCertificate;
use crate::providers::{AliyunProvider, QcloudProvider};
use crate::reconcile::{reconcile, CertificateProvider, ReconcileReport};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

/// Parse and validate the local certificate named by the cert options
pub fn load_certificate(options: &CertOptions) -> crate::Result<LocalCertificate> {
    let local = load_local_certificate(
        &options.cert_pem,
        &options.key_pem,
        options.name_prefix(),
        Utc::now(),
    )?;

    info!(
        "local certificate {} expires at {}",
        local.display_name,
        local.not_after.to_rfc3339()
    );
    Ok(local)
}

/// Providers for every configured section, Aliyun before Tencent Cloud
pub fn build_providers(options: &Options) -> crate::Result<Vec<Box<dyn CertificateProvider>>> {
    let mut providers: Vec<Box<dyn CertificateProvider>> = Vec::new();

    if let Some(aliyun) = &options.aliyun {
        providers.push(Box::new(AliyunProvider::new(aliyun)?));
    }
    if let Some(qcloud) = &options.qcloud {
        providers.push(Box::new(QcloudProvider::new(qcloud)?));
    }

    Ok(providers)
}

/// Reconcile `local` against each provider in order, stopping at the first error
pub async fn run_providers(
    providers: &[Box<dyn CertificateProvider>],
    local: &LocalCertificate,
    on_report: &dyn Fn(&ReconcileReport),
) -> Result<Vec<ReconcileReport>> {
    let mut reports = Vec::with_capacity(providers.len());

    for provider in providers {
        info!("reconciling {}", provider.name());
        let report = reconcile(provider.as_ref(), local)
            .await
            .with_context(|| format!("{} reconciliation failed", provider.name()))?;
        on_report(&report);
        reports.push(report);
    }

    Ok(reports)
}

/// Complete results from a successful run
pub struct RunResult {
    pub local: LocalCertificate,
    pub reports: Vec<ReconcileReport>,
}

/// Full run from an options file
pub async fn run(
    config_path: &Path,
    on_local: &dyn Fn(&LocalCertificate),
    on_report: &dyn Fn(&ReconcileReport),
) -> Result<RunResult> {
    let options = load_options(config_path)
        .with_context(|| format!("failed to load options from {}", config_path.display()))?;

    // validate() guarantees the cert section is present
    let cert_options = options.cert.as_ref().context("missing cert options")?;
    let local = load_certificate(cert_options).context("failed to load local certificate")?;
    on_local(&local);

    let providers = build_providers(&options).context("failed to set up provider clients")?;
    let reports = run_providers(&providers, &local, on_report).await?;

    Ok(RunResult { local, reports })
}
