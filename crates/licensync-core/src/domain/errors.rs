//! Domain error types
//!
//! This module defines local validation failures, invalid state transitions,
//! and the small error taxonomy ([`ErrorKind`]) that drives the reconciler's
//! retry/abort/no-op decisions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Identity string is not a well-formed license configuration ARN
    #[error("Invalid license configuration ARN: {0}")]
    InvalidArn(String),

    /// License rule does not match `#RuleType=RuleValue`
    #[error("Invalid license rule: {0}")]
    InvalidLicenseRule(String),

    /// Unknown license counting type
    #[error("Invalid license counting type: {0}")]
    InvalidCountingType(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// A declared field failed validation
    #[error("Validation failed for {field}: {message}")]
    ValidationFailed {
        /// Offending field, e.g. `license_rules[0]`
        field: String,
        /// Human-readable explanation
        message: String,
    },
}

/// Decision-relevant classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced identity does not exist remotely
    NotFound,
    /// The request was rejected as malformed or disallowed input
    Validation,
    /// Infrastructure hiccup (throttling, timeout, connectivity, cancellation)
    Transient,
    /// Anything else; surfaced verbatim
    Fatal,
}

impl ErrorKind {
    /// Returns true if the caller may retry the operation with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Transient => "transient",
            ErrorKind::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle operation that produced a remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    /// Progressive verb used in user-visible messages ("creating", ...)
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::Read => "reading",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
            Operation::Import => "importing",
        }
    }

    /// Whether the call is addressed to an existing identity
    pub fn targets_identity(&self) -> bool {
        !matches!(self, Operation::Create)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
