//! Binding and redeployment records

use std::collections::{BTreeMap, BTreeSet};

/// Which certificates a provider currently serves for a domain
#[derive(Debug, Clone)]
pub struct DomainBinding {
    pub domain: String,
    pub certificate_ids: Vec<String>,
}

impl DomainBinding {
    pub fn is_bound_to(&self, certificate_id: &str) -> bool {
        self.certificate_ids.iter().any(|id| id == certificate_id)
    }
}

/// Cloud resources a replacement redeploys against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentTargets {
    pub resource_types: BTreeSet<String>,
    /// Regions per resource type; types without an entry use the provider default
    pub resource_regions: BTreeMap<String, BTreeSet<String>>,
}

/// Request to move every deployment of one certificate onto another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementJob {
    pub old_certificate_id: String,
    pub new_certificate_id: String,
    pub resource_types: BTreeSet<String>,
    pub resource_regions: BTreeMap<String, BTreeSet<String>>,
}

impl ReplacementJob {
    pub fn new(old_certificate_id: &str, new_certificate_id: &str, targets: &DeploymentTargets) -> Self {
        Self {
            old_certificate_id: old_certificate_id.to_string(),
            new_certificate_id: new_certificate_id.to_string(),
            resource_types: targets.resource_types.clone(),
            resource_regions: targets.resource_regions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_bound_to() {
        let binding = DomainBinding {
            domain: "cdn.example.com".to_string(),
            certificate_ids: vec!["11".to_string(), "42".to_string()],
        };
        assert!(binding.is_bound_to("42"));
        assert!(!binding.is_bound_to("4"));
    }

    #[test]
    fn test_job_copies_targets() {
        let mut targets = DeploymentTargets::default();
        targets.resource_types.insert("clb".to_string());
        targets
            .resource_regions
            .entry("clb".to_string())
            .or_default()
            .insert("ap-guangzhou".to_string());

        let job = ReplacementJob::new("old", "new", &targets);
        assert_eq!(job.old_certificate_id, "old");
        assert_eq!(job.new_certificate_id, "new");
        assert!(job.resource_types.contains("clb"));
        assert_eq!(job.resource_regions["clb"].len(), 1);
    }
}
