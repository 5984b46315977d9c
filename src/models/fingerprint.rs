//! Canonical domain-set keys

use std::collections::BTreeSet;
use std::fmt;

/// The deduplicated, sorted, comma-joined set of names a certificate covers.
///
/// Names are compared exactly as supplied (no case folding), so two
/// certificates cover "the same domains" iff their fingerprints are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainFingerprint(String);

impl DomainFingerprint {
    /// Build a fingerprint from names in any order, duplicates allowed
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self(set.into_iter().collect::<Vec<_>>().join(","))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DomainFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
