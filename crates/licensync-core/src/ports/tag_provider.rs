//! Default tag provider port
//!
//! Supplies the process-wide tag policy. The reconciler reads it once per
//! entry point and threads it explicitly into the tag reconciler.

use crate::config::TagsConfig;
use crate::domain::tags::TagPolicy;

/// Source of the process-wide default tags and ignore rules
pub trait IDefaultTagProvider: Send + Sync {
    fn tag_policy(&self) -> TagPolicy;
}

/// Provider backed by a fixed policy, usually built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTagProvider {
    policy: TagPolicy,
}

impl StaticTagProvider {
    pub fn new(policy: TagPolicy) -> Self {
        Self { policy }
    }

    /// Provider with no default tags and no ignore rules
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<&TagsConfig> for StaticTagProvider {
    fn from(config: &TagsConfig) -> Self {
        Self::new(config.policy())
    }
}

impl IDefaultTagProvider for StaticTagProvider {
    fn tag_policy(&self) -> TagPolicy {
        self.policy.clone()
    }
}
