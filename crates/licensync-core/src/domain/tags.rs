//! Tag reconciliation
//!
//! Pure functions that combine process-wide default tags with
//! resource-specific tags. The remote system stores the merged set, so the
//! merged view observed on read is authoritative; the resource-specific view
//! is derived back out of it.
//!
//! Default tags are always passed in explicitly (usually inside a
//! [`TagPolicy`]); nothing here reads ambient configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// A tag set; ordered so merges and deltas are deterministic
pub type Tags = BTreeMap<String, String>;

/// Key prefix reserved by the remote system. Tags under it are never managed.
pub const RESERVED_TAG_PREFIX: &str = "aws:";

/// Merges default and resource-specific tags.
///
/// Resource-specific entries win on key collision.
pub fn merge(default_tags: &Tags, resource_tags: &Tags) -> Tags {
    let mut merged = default_tags.clone();
    merged.extend(
        resource_tags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    merged
}

/// Recovers the resource-specific tags from a merged tag set.
///
/// An entry is resource-specific when the declared tags name its key, or when
/// it is not identical to the corresponding default tag.
pub fn resource_tags(merged: &Tags, default_tags: &Tags, declared: Option<&Tags>) -> Tags {
    merged
        .iter()
        .filter(|(key, value)| {
            let declared_here = declared.is_some_and(|tags| tags.contains_key(*key));
            declared_here || default_tags.get(*key) != Some(*value)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Process-wide tag settings: default tags plus keys that are never managed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPolicy {
    /// Tags applied to every resource unless overridden
    #[serde(default)]
    pub default_tags: Tags,
    /// Exact keys to ignore on read and never send on write
    #[serde(default)]
    pub ignore_keys: Vec<String>,
    /// Key prefixes to ignore (the reserved `aws:` prefix is always ignored)
    #[serde(default)]
    pub ignore_key_prefixes: Vec<String>,
}

impl TagPolicy {
    /// Creates a policy with the given default tags and no ignore rules
    pub fn new(default_tags: Tags) -> Self {
        Self {
            default_tags,
            ..Self::default()
        }
    }

    /// Returns true if the key is excluded from management
    pub fn is_ignored(&self, key: &str) -> bool {
        key.starts_with(RESERVED_TAG_PREFIX)
            || self.ignore_keys.iter().any(|k| k == key)
            || self
                .ignore_key_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Rejects declared tags that this policy would never send.
    ///
    /// An ignored key is dropped from every write and every read, so
    /// declaring one could never converge.
    pub fn check_declared(&self, tags: &Tags) -> Result<(), DomainError> {
        match tags.keys().find(|key| self.is_ignored(key)) {
            Some(key) => Err(DomainError::ValidationFailed {
                field: format!("tags[{key:?}]"),
                message: "tag key is reserved or ignored and cannot be managed".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// The merged set to send for the given resource tags, ignored keys removed
    pub fn merged(&self, resource_tags: &Tags) -> Tags {
        self.without_ignored(&merge(&self.default_tags, resource_tags))
    }

    /// Treats the tags returned by the remote system as the merged set
    pub fn extract_merged(&self, remote_tags: &Tags) -> Tags {
        self.without_ignored(remote_tags)
    }

    /// Resource-specific view of an observed merged set
    pub fn resource_tags(&self, merged: &Tags, declared: Option<&Tags>) -> Tags {
        resource_tags(merged, &self.default_tags, declared)
    }

    fn without_ignored(&self, tags: &Tags) -> Tags {
        tags.iter()
            .filter(|(key, _)| !self.is_ignored(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Tag API calls needed to move the remote merged set from one state to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    /// Keys that are new or whose value changed
    pub upsert: Tags,
    /// Keys no longer present
    pub remove: Vec<String>,
}

impl TagDelta {
    /// Computes the delta from `old` merged tags to `new` merged tags
    pub fn between(old: &Tags, new: &Tags) -> Self {
        let upsert = new
            .iter()
            .filter(|(key, value)| old.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let remove = old
            .keys()
            .filter(|key| !new.contains_key(*key))
            .cloned()
            .collect();

        Self { upsert, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.upsert.is_empty() && self.remove.is_empty()
    }
}
