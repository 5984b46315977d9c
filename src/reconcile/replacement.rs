//! Expiring-certificate replacement
//!
//! After the local certificate is resolved, every other certificate for the
//! same domains that expires no later than it is retired by asking the
//! provider to move its deployments onto the resolved certificate. The
//! provider answers with a deployment record id once the move exists; until
//! then the same request is resubmitted after a fixed interval, with no cap.

use super::matcher::expiring_candidates;
use super::CertificateRedeployer;
use crate::models::{
    DeploymentTargets, LocalCertificate, RemoteCertificateRecord, ReplacementJob,
    ResolvedCertificate,
};
use crate::utils::ProviderError;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Default wait between resubmissions
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a single replacement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplacementOutcome {
    /// The provider accepted the replacement under this deployment record
    Deployed { record_id: u64 },
    /// The old certificate had nothing deployed, so nothing had to move
    NoDeployableInstance,
}

/// Replacements performed for one provider
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplacementReport {
    /// (retired certificate id, outcome) in listing order
    pub replaced: Vec<(String, ReplacementOutcome)>,
}

/// Drives replacement jobs against a [`CertificateRedeployer`]
pub struct ReplacementEngine<'a, R: ?Sized> {
    redeployer: &'a R,
    targets: &'a DeploymentTargets,
    poll_interval: Duration,
}

impl<'a, R> ReplacementEngine<'a, R>
where
    R: CertificateRedeployer + ?Sized,
{
    pub fn new(redeployer: &'a R, targets: &'a DeploymentTargets, poll_interval: Duration) -> Self {
        Self {
            redeployer,
            targets,
            poll_interval,
        }
    }

    /// Retire every expiring certificate in `listing` in favour of `resolved`
    pub async fn run(
        &self,
        local: &LocalCertificate,
        listing: &[RemoteCertificateRecord],
        resolved: &ResolvedCertificate,
    ) -> Result<ReplacementReport, ProviderError> {
        let mut report = ReplacementReport::default();

        for candidate in expiring_candidates(local, listing, &resolved.id) {
            info!(
                "certificate {} expires at {}, replacing with {}",
                candidate.id,
                candidate
                    .expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                resolved.id
            );

            let job = ReplacementJob::new(&candidate.id, &resolved.id, self.targets);
            let outcome = self.replace(&job).await?;
            report.replaced.push((candidate.id.clone(), outcome));
        }

        Ok(report)
    }

    /// Submit one job until the provider confirms it or rejects it outright
    pub async fn replace(&self, job: &ReplacementJob) -> Result<ReplacementOutcome, ProviderError> {
        loop {
            match self.redeployer.submit_replacement(job).await {
                Ok(Some(record_id)) if record_id > 0 => {
                    info!(
                        "certificate {} replaced by {}, deploy record {}",
                        job.old_certificate_id, job.new_certificate_id, record_id
                    );
                    return Ok(ReplacementOutcome::Deployed { record_id });
                }
                Ok(_) => {
                    info!(
                        "replacement of certificate {} pending, retrying in {:?}",
                        job.old_certificate_id, self.poll_interval
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) if e.is_no_deployable_instance() => {
                    info!(
                        "certificate {} has no deployable instance, nothing to replace",
                        job.old_certificate_id
                    );
                    return Ok(ReplacementOutcome::NoDeployableInstance);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
