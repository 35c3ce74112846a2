//! License configuration domain entities
//!
//! This module defines the declared (user intent) and observed (remote truth)
//! views of a license configuration, and the [`ManagedResource`] that tracks
//! one resource instance through its lifecycle.
//!
//! ## State Machine
//!
//! ```text
//!     ┌──────────┐    create / import    ┌────────────────┐
//!     │  Absent  │ ────────────────────► │ Present(arn)   │
//!     └──────────┘                       └────────────────┘
//!          ▲  ▲                             │          │
//!          │  └───────── delete ────────────┘          │ read: NotFound
//!          │                                           ▼
//!          │                                     ┌──────────┐
//!          └──────────── create ──────────────── │   Gone   │
//!                                                └──────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::DomainError;
use super::newtypes::{LicenseConfigurationArn, LicenseRule};
use super::tags::{Tags, RESERVED_TAG_PREFIX};

// ============================================================================
// LicenseCountingType
// ============================================================================

/// Dimension used to track license inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseCountingType {
    #[serde(rename = "vCPU")]
    Vcpu,
    Instance,
    Core,
    Socket,
}

impl LicenseCountingType {
    pub const ALL: [LicenseCountingType; 4] = [
        LicenseCountingType::Vcpu,
        LicenseCountingType::Instance,
        LicenseCountingType::Core,
        LicenseCountingType::Socket,
    ];

    /// Remote spelling of the counting type
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseCountingType::Vcpu => "vCPU",
            LicenseCountingType::Instance => "Instance",
            LicenseCountingType::Core => "Core",
            LicenseCountingType::Socket => "Socket",
        }
    }
}

impl fmt::Display for LicenseCountingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseCountingType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| {
                DomainError::InvalidCountingType(format!(
                    "{s}; valid options: vCPU, Instance, Core, Socket"
                ))
            })
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|d| !d.is_empty()))
}

// ============================================================================
// DeclaredConfiguration
// ============================================================================

/// User intent for a license configuration
///
/// `license_count` is tri-state: `None` means unlimited, `Some(0)` is an
/// explicit zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredConfiguration {
    pub name: String,
    /// An empty description is the same as none
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_count: Option<u64>,
    #[serde(default)]
    pub license_count_hard_limit: bool,
    /// Fixed at creation
    pub license_counting_type: LicenseCountingType,
    /// Fixed at creation; order is significant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license_rules: Vec<String>,
    /// Resource-specific tags
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl DeclaredConfiguration {
    /// Creates a configuration with only the required fields set
    pub fn new(name: impl Into<String>, license_counting_type: LicenseCountingType) -> Self {
        Self {
            name: name.into(),
            description: None,
            license_count: None,
            license_count_hard_limit: false,
            license_counting_type,
            license_rules: Vec::new(),
            tags: Tags::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The description as the remote system keeps it (`""` reads back as absent)
    pub fn effective_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn with_license_count(mut self, count: u64) -> Self {
        self.license_count = Some(count);
        self
    }

    pub fn with_hard_limit(mut self, hard_limit: bool) -> Self {
        self.license_count_hard_limit = hard_limit;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.license_rules.push(rule.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Checks the configuration locally and returns the parsed license rules.
    ///
    /// # Errors
    /// Returns [`DomainError::ValidationFailed`] naming the first offending field
    pub fn validate(&self) -> Result<Vec<LicenseRule>, DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if let Some((key, _)) = self.tags.iter().find(|(key, _)| key.is_empty()) {
            return Err(DomainError::ValidationFailed {
                field: format!("tags[{key:?}]"),
                message: "tag keys must not be empty".to_string(),
            });
        }

        if let Some(key) = self.tags.keys().find(|key| key.starts_with(RESERVED_TAG_PREFIX)) {
            return Err(DomainError::ValidationFailed {
                field: format!("tags[{key:?}]"),
                message: format!("the {RESERVED_TAG_PREFIX} prefix is reserved"),
            });
        }

        self.license_rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                LicenseRule::new(rule.clone()).map_err(|e| DomainError::ValidationFailed {
                    field: format!("license_rules[{index}]"),
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

// ============================================================================
// ObservedState
// ============================================================================

/// Remote truth after a successful read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub arn: LicenseConfigurationArn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_configuration_id: Option<String>,
    pub owner_account_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_count: Option<u64>,
    pub license_count_hard_limit: bool,
    pub license_counting_type: LicenseCountingType,
    #[serde(default)]
    pub license_rules: Vec<String>,
    /// Resource-specific view of `merged_tags`
    #[serde(default)]
    pub tags: Tags,
    /// Defaults plus resource tags, as stored remotely; read-only
    #[serde(default)]
    pub merged_tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_licenses: Option<u64>,
}

impl ObservedState {
    /// The declared configuration that would reproduce this observation.
    ///
    /// Used as the baseline after an import or a refresh. `merged_tags` is
    /// never carried over.
    pub fn to_declared(&self) -> DeclaredConfiguration {
        DeclaredConfiguration {
            name: self.name.clone(),
            description: self.description.clone(),
            license_count: self.license_count,
            license_count_hard_limit: self.license_count_hard_limit,
            license_counting_type: self.license_counting_type,
            license_rules: self.license_rules.clone(),
            tags: self.tags.clone(),
        }
    }
}

// ============================================================================
// ResourceState / ManagedResource
// ============================================================================

/// Lifecycle state of one resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "arn", rename_all = "snake_case")]
pub enum ResourceState {
    /// No remote counterpart is tracked
    #[default]
    Absent,
    /// Tracked under the given identity
    Present(LicenseConfigurationArn),
    /// The remote counterpart was deleted out-of-band
    Gone,
}

impl ResourceState {
    /// Returns the tracked identity, if any
    pub fn identity(&self) -> Option<&LicenseConfigurationArn> {
        match self {
            ResourceState::Present(arn) => Some(arn),
            ResourceState::Absent | ResourceState::Gone => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ResourceState::Present(_))
    }

    /// Absent and Gone both mean there is nothing remote to manage
    pub fn is_absent(&self) -> bool {
        !self.is_present()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceState::Absent => "absent",
            ResourceState::Present(_) => "present",
            ResourceState::Gone => "gone",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Present(arn) => write!(f, "present ({arn})"),
            other => f.write_str(other.name()),
        }
    }
}

/// One license configuration instance as tracked by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedResource {
    #[serde(default)]
    state: ResourceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    observed: Option<ObservedState>,
}

impl ManagedResource {
    /// Creates an untracked (Absent) resource
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resource tracked under an existing identity, not yet observed
    pub fn present(arn: LicenseConfigurationArn) -> Self {
        Self {
            state: ResourceState::Present(arn),
            observed: None,
        }
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn identity(&self) -> Option<&LicenseConfigurationArn> {
        self.state.identity()
    }

    /// Latest observation, if the resource has been read since it was tracked
    pub fn observed(&self) -> Option<&ObservedState> {
        self.observed.as_ref()
    }

    /// Starts tracking a freshly assigned identity (Absent/Gone -> Present)
    pub fn begin_tracking(&mut self, arn: LicenseConfigurationArn) -> Result<(), DomainError> {
        if let ResourceState::Present(current) = &self.state {
            return Err(DomainError::InvalidState {
                from: format!("present ({current})"),
                to: format!("present ({arn})"),
            });
        }
        self.state = ResourceState::Present(arn);
        self.observed = None;
        Ok(())
    }

    /// Records an observation of the tracked identity
    pub fn record_observation(&mut self, observed: ObservedState) -> Result<(), DomainError> {
        match &self.state {
            ResourceState::Present(arn) if *arn == observed.arn => {
                self.observed = Some(observed);
                Ok(())
            }
            other => Err(DomainError::InvalidState {
                from: other.to_string(),
                to: format!("observed ({})", observed.arn),
            }),
        }
    }

    /// The remote counterpart vanished out-of-band (Present -> Gone)
    pub fn mark_gone(&mut self) -> Result<(), DomainError> {
        if !self.state.is_present() {
            return Err(DomainError::InvalidState {
                from: self.state.to_string(),
                to: "gone".to_string(),
            });
        }
        self.state = ResourceState::Gone;
        self.observed = None;
        Ok(())
    }

    /// The remote counterpart was deleted (-> Absent)
    pub fn mark_deleted(&mut self) {
        self.state = ResourceState::Absent;
        self.observed = None;
    }
}
