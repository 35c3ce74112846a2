//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the resource identity and
//! for license rules. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// LicenseConfigurationArn
// ============================================================================

/// Remote-assigned identity of a license configuration
///
/// Format: `arn:<partition>:license-manager:<region>:<account>:license-configuration:<id>`.
/// Only the outer shape is checked locally; whether the identity is known is
/// decided by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseConfigurationArn(String);

impl LicenseConfigurationArn {
    /// Number of colon-separated segments in an ARN (the resource part may
    /// itself contain colons)
    const SEGMENTS: usize = 6;

    /// Create a new LicenseConfigurationArn
    ///
    /// # Errors
    /// Returns error if the string is empty or not shaped like an ARN
    pub fn new(arn: String) -> Result<Self, DomainError> {
        if arn.is_empty() {
            return Err(DomainError::InvalidArn("ARN cannot be empty".to_string()));
        }

        if arn.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidArn(format!(
                "ARN contains whitespace: {arn:?}"
            )));
        }

        let segments: Vec<&str> = arn.splitn(Self::SEGMENTS, ':').collect();
        if segments.len() < Self::SEGMENTS || segments[0] != "arn" {
            return Err(DomainError::InvalidArn(format!(
                "expected arn:partition:service:region:account:resource, got {arn}"
            )));
        }

        if segments[1].is_empty() || segments[2].is_empty() || segments[5].is_empty() {
            return Err(DomainError::InvalidArn(format!(
                "partition, service and resource must be present: {arn}"
            )));
        }

        Ok(Self(arn))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Account segment of the ARN (may be empty)
    #[must_use]
    pub fn account_id(&self) -> &str {
        self.0.split(':').nth(4).unwrap_or_default()
    }

    /// Region segment of the ARN (may be empty)
    #[must_use]
    pub fn region(&self) -> &str {
        self.0.split(':').nth(3).unwrap_or_default()
    }
}

impl Display for LicenseConfigurationArn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LicenseConfigurationArn {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for LicenseConfigurationArn {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LicenseConfigurationArn> for String {
    fn from(arn: LicenseConfigurationArn) -> Self {
        arn.0
    }
}

// ============================================================================
// LicenseRule
// ============================================================================

/// A license rule of the form `#RuleType=RuleValue`
///
/// Equivalent to the pattern `^#([^=]+)=(.+)$`: the rule type is everything
/// between `#` and the first `=`, the rule value is the non-empty remainder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseRule(String);

impl LicenseRule {
    /// Create a new LicenseRule
    ///
    /// # Errors
    /// Returns error if the rule is not shaped like `#RuleType=RuleValue`
    pub fn new(rule: String) -> Result<Self, DomainError> {
        if rule.contains('\n') {
            return Err(DomainError::InvalidLicenseRule(format!(
                "rule must be a single line: {rule:?}"
            )));
        }

        let Some(body) = rule.strip_prefix('#') else {
            return Err(DomainError::InvalidLicenseRule(format!(
                "Expected format is #RuleType=RuleValue, got {rule:?}"
            )));
        };

        match body.split_once('=') {
            Some((rule_type, value)) if !rule_type.is_empty() && !value.is_empty() => {
                Ok(Self(rule))
            }
            _ => Err(DomainError::InvalidLicenseRule(format!(
                "Expected format is #RuleType=RuleValue, got {rule:?}"
            ))),
        }
    }

    /// The rule type, e.g. `minimumVcpus`
    pub fn rule_type(&self) -> &str {
        self.parts().0
    }

    /// The rule value, e.g. `2`
    pub fn rule_value(&self) -> &str {
        self.parts().1
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (&str, &str) {
        // Shape was checked in `new`
        self.0[1..].split_once('=').unwrap_or(("", ""))
    }
}

impl Display for LicenseRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LicenseRule {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for LicenseRule {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LicenseRule> for String {
    fn from(rule: LicenseRule) -> Self {
        rule.0
    }
}
