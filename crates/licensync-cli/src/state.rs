//! Local state file
//!
//! Persists the [`ManagedResource`] for one declared configuration between
//! runs. A missing file means the resource is untracked.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use licensync_core::domain::ManagedResource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk representation of one tracked resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub resource: ManagedResource,
    pub updated_at: DateTime<Utc>,
}

impl StateFile {
    pub fn new(resource: ManagedResource) -> Self {
        Self {
            resource,
            updated_at: Utc::now(),
        }
    }

    /// Reads the state file, or returns an untracked resource if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No state file, resource is untracked");
            return Ok(Self::new(ManagedResource::new()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    /// Writes the state file, replacing any previous version
    ///
    /// The content is written to a sibling temporary file first and renamed
    /// into place.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Utc::now();
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        debug!(path = %path.display(), state = self.resource.state().name(), "State saved");
        Ok(())
    }
}
