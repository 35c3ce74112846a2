//! Attribute diff policy
//!
//! Decides whether moving from one declared configuration to another is a
//! no-op, an in-place update, or a replacement. Everything here is pure.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::license_configuration::{DeclaredConfiguration, ManagedResource};

/// Attributes that can be changed on an existing license configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutableAttribute {
    Name,
    Description,
    LicenseCount,
    LicenseCountHardLimit,
    Tags,
}

impl MutableAttribute {
    pub const ALL: [MutableAttribute; 5] = [
        MutableAttribute::Name,
        MutableAttribute::Description,
        MutableAttribute::LicenseCount,
        MutableAttribute::LicenseCountHardLimit,
        MutableAttribute::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutableAttribute::Name => "name",
            MutableAttribute::Description => "description",
            MutableAttribute::LicenseCount => "license_count",
            MutableAttribute::LicenseCountHardLimit => "license_count_hard_limit",
            MutableAttribute::Tags => "tags",
        }
    }
}

impl fmt::Display for MutableAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes fixed at creation; changing one forces replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmutableAttribute {
    LicenseCountingType,
    LicenseRules,
}

impl ImmutableAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImmutableAttribute::LicenseCountingType => "license_counting_type",
            ImmutableAttribute::LicenseRules => "license_rules",
        }
    }
}

impl fmt::Display for ImmutableAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing two declared configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "attributes", rename_all = "snake_case")]
pub enum ChangePlan {
    NoOp,
    /// Exactly the mutable attributes that differ
    InPlaceUpdate(BTreeSet<MutableAttribute>),
    /// Destroy then recreate; the immutable attributes that differ
    Replace(BTreeSet<ImmutableAttribute>),
}

impl ChangePlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, ChangePlan::NoOp)
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, ChangePlan::Replace(_))
    }

    /// True when a non-tag mutable attribute changed
    pub fn requires_update_call(&self) -> bool {
        match self {
            ChangePlan::InPlaceUpdate(fields) => {
                fields.iter().any(|field| *field != MutableAttribute::Tags)
            }
            ChangePlan::NoOp | ChangePlan::Replace(_) => false,
        }
    }
}

impl fmt::Display for ChangePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangePlan::NoOp => f.write_str("no changes"),
            ChangePlan::InPlaceUpdate(fields) => {
                let names: Vec<&str> = fields.iter().map(MutableAttribute::as_str).collect();
                write!(f, "update in place ({})", names.join(", "))
            }
            ChangePlan::Replace(fields) => {
                let names: Vec<&str> = fields.iter().map(ImmutableAttribute::as_str).collect();
                write!(f, "replace ({} forces replacement)", names.join(", "))
            }
        }
    }
}

/// Classifies the change from `old` to `new`.
pub fn classify_change(old: &DeclaredConfiguration, new: &DeclaredConfiguration) -> ChangePlan {
    let mut immutable = BTreeSet::new();
    if old.license_counting_type != new.license_counting_type {
        immutable.insert(ImmutableAttribute::LicenseCountingType);
    }
    if old.license_rules != new.license_rules {
        immutable.insert(ImmutableAttribute::LicenseRules);
    }
    if !immutable.is_empty() {
        return ChangePlan::Replace(immutable);
    }

    let mutable: BTreeSet<MutableAttribute> = MutableAttribute::ALL
        .into_iter()
        .filter(|field| match field {
            MutableAttribute::Name => old.name != new.name,
            MutableAttribute::Description => {
                old.effective_description() != new.effective_description()
            }
            MutableAttribute::LicenseCount => old.license_count != new.license_count,
            MutableAttribute::LicenseCountHardLimit => {
                old.license_count_hard_limit != new.license_count_hard_limit
            }
            MutableAttribute::Tags => old.tags != new.tags,
        })
        .collect();

    if mutable.is_empty() {
        ChangePlan::NoOp
    } else {
        ChangePlan::InPlaceUpdate(mutable)
    }
}

/// What the runtime has to do to converge one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePlan {
    /// Nothing remote is tracked yet
    Create,
    /// The tracked resource must be changed (or left alone)
    Change(ChangePlan),
}

/// Plans convergence of `resource` to `desired`.
///
/// The baseline is the last observation of the resource. A present resource
/// that was never observed is planned as an update of every mutable
/// attribute, since nothing is known about its remote values.
pub fn plan_for(resource: &ManagedResource, desired: &DeclaredConfiguration) -> LifecyclePlan {
    if !resource.state().is_present() {
        return LifecyclePlan::Create;
    }

    match resource.observed() {
        Some(observed) => LifecyclePlan::Change(classify_change(&observed.to_declared(), desired)),
        None => LifecyclePlan::Change(ChangePlan::InPlaceUpdate(
            MutableAttribute::ALL.into_iter().collect(),
        )),
    }
}
