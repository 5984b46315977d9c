//! CDN domain binding reconciliation

use super::DomainBinder;
use crate::models::ResolvedCertificate;
use crate::utils::ProviderError;
use serde::Serialize;
use tracing::info;

/// Domains touched by a binding pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingReport {
    /// Domains that received a bind request
    pub bound: Vec<String>,
    /// Domains already serving the certificate
    pub unchanged: Vec<String>,
}

/// Point every domain at `certificate`, skipping domains already bound to it.
///
/// Domains are handled in order. The first failure is returned immediately;
/// binds that already succeeded are left in place.
pub async fn reconcile_bindings<B>(
    binder: &B,
    domains: &[String],
    certificate: &ResolvedCertificate,
) -> Result<BindingReport, ProviderError>
where
    B: DomainBinder + ?Sized,
{
    let mut report = BindingReport::default();

    for domain in domains {
        let binding = binder.current_binding(domain).await?;
        if binding.is_bound_to(&certificate.id) {
            info!(
                "certificate {} already bound to domain {}, skip binding",
                certificate.id, domain
            );
            report.unchanged.push(domain.clone());
            continue;
        }

        binder.bind_certificate(domain, certificate).await?;
        info!("certificate {} bound to domain {}", certificate.id, domain);
        report.bound.push(domain.clone());
    }

    Ok(report)
}
