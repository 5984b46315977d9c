//! Upload-or-reuse decision

use super::matcher::find_existing;
use super::CertificateProvider;
use crate::models::{LocalCertificate, RemoteCertificateRecord, ResolvedCertificate};
use crate::utils::ProviderError;
use tracing::info;

/// Resolve the remote certificate for `local`, uploading it only when no
/// record in `listing` matches.
///
/// The upload is attempted once; a failure is returned as-is since
/// providers do not deduplicate uploads by content.
pub async fn resolve_certificate<P>(
    provider: &P,
    local: &LocalCertificate,
    listing: &[RemoteCertificateRecord],
) -> Result<ResolvedCertificate, ProviderError>
where
    P: CertificateProvider + ?Sized,
{
    if let Some(existing) = find_existing(local, listing, provider.match_strategy()) {
        info!(
            "{}: certificate {} already exists, skip uploading",
            provider.name(),
            existing.id
        );
        return Ok(ResolvedCertificate {
            id: existing.id.clone(),
            name: existing
                .name
                .clone()
                .unwrap_or_else(|| local.display_name.clone()),
            uploaded: false,
        });
    }

    let id = provider.upload_certificate(local).await?;
    info!(
        "{}: certificate {} uploaded, with dns names: {}",
        provider.name(),
        id,
        local.all_names().join(", ")
    );

    Ok(ResolvedCertificate {
        id,
        name: local.display_name.clone(),
        uploaded: true,
    })
}
