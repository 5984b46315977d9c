//! Certificate reconciliation
//!
//! A provider is reconciled in four steps, each gating the next:
//! list its certificates once, match the local certificate against that
//! snapshot, upload only when nothing matched, then apply the provider's
//! follow-up (CDN bindings or expiring-certificate replacement).

pub mod binding;
pub mod matcher;
pub mod replacement;
pub mod upload;

pub use binding::{reconcile_bindings, BindingReport};
pub use matcher::{
    expiring_candidates, find_existing, parse_serial, MatchStrategy, SerialEncoding,
    EXPIRY_TOLERANCE_HOURS,
};
pub use replacement::{ReplacementEngine, ReplacementOutcome, ReplacementReport};
pub use upload::resolve_certificate;

use crate::models::{
    DomainBinding, LocalCertificate, RemoteCertificateRecord, ReplacementJob, ResolvedCertificate,
};
use crate::utils::ProviderError;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// What a provider did after the certificate was resolved
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplyReport {
    Bindings(BindingReport),
    Replacements(ReplacementReport),
}

/// Outcome of reconciling one provider
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub provider: &'static str,
    pub certificate: ResolvedCertificate,
    pub applied: ApplyReport,
}

/// A cloud certificate inventory plus whatever it does with a resolved certificate
#[async_trait]
pub trait CertificateProvider: Send + Sync {
    /// Short provider name for logs and errors
    fn name(&self) -> &'static str;

    /// How this provider's records are matched against the local certificate
    fn match_strategy(&self) -> MatchStrategy;

    /// Fetch the complete certificate listing
    async fn list_certificates(&self) -> Result<Vec<RemoteCertificateRecord>, ProviderError>;

    /// Upload the local certificate under its display name, returning the new id
    async fn upload_certificate(&self, local: &LocalCertificate) -> Result<String, ProviderError>;

    /// Bind or redeploy the resolved certificate.
    ///
    /// `listing` is the snapshot the certificate was resolved against.
    async fn apply(
        &self,
        local: &LocalCertificate,
        listing: &[RemoteCertificateRecord],
        resolved: &ResolvedCertificate,
    ) -> Result<ApplyReport, ProviderError>;
}

/// Per-domain certificate bindings (CDN style)
#[async_trait]
pub trait DomainBinder: Send + Sync {
    async fn current_binding(&self, domain: &str) -> Result<DomainBinding, ProviderError>;

    async fn bind_certificate(
        &self,
        domain: &str,
        certificate: &ResolvedCertificate,
    ) -> Result<(), ProviderError>;
}

/// Cross-resource certificate redeployment
#[async_trait]
pub trait CertificateRedeployer: Send + Sync {
    /// Submit (or resubmit) a replacement.
    ///
    /// Returns the deployment record id; `None` or `Some(0)` means the
    /// deployment has not materialized yet.
    async fn submit_replacement(&self, job: &ReplacementJob) -> Result<Option<u64>, ProviderError>;
}

/// Reconcile the local certificate against one provider
pub async fn reconcile(
    provider: &dyn CertificateProvider,
    local: &LocalCertificate,
) -> Result<ReconcileReport, ProviderError> {
    let listing = provider.list_certificates().await?;
    info!(
        "{}: {} certificate(s) listed",
        provider.name(),
        listing.len()
    );

    let certificate = resolve_certificate(provider, local, &listing).await?;
    let applied = provider.apply(local, &listing, &certificate).await?;

    Ok(ReconcileReport {
        provider: provider.name(),
        certificate,
        applied,
    })
}
