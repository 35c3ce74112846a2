//! License manager port (driven/secondary port)
//!
//! This module defines the minimal operation set the reconciler needs from the
//! remote licensing control plane, plus the request/response DTOs exchanged
//! over it.
//!
//! ## Design Notes
//!
//! - Every method returns [`RemoteError`], a tagged value, rather than
//!   `anyhow::Error`; the reconciler branches on it exhaustively.
//! - Nothing here is idempotent and adapters never retry.
//! - Uses `#[async_trait]` for async trait methods.

use thiserror::Error;

use crate::domain::license_configuration::LicenseCountingType;
use crate::domain::newtypes::{LicenseConfigurationArn, LicenseRule};
use crate::domain::tags::Tags;

// ============================================================================
// RemoteError
// ============================================================================

/// A failed remote call, tagged by the remote error code or transport failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("InvalidParameterValueException: {0}")]
    InvalidParameterValue(String),

    #[error("ValidationException: {0}")]
    Validation(String),

    #[error("ResourceNotFoundException: {0}")]
    ResourceNotFound(String),

    #[error("AccessDeniedException: {0}")]
    AccessDenied(String),

    #[error("AuthorizationException: {0}")]
    Authorization(String),

    #[error("ResourceLimitExceededException: {0}")]
    ResourceLimitExceeded(String),

    #[error("FailedDependencyException: {0}")]
    FailedDependency(String),

    #[error("RateLimitExceededException: {0}")]
    RateLimitExceeded(String),

    #[error("ThrottlingException: {0}")]
    Throttling(String),

    #[error("ServerInternalException: {0}")]
    ServerInternal(String),

    /// HTTP-level failure without a recognizable error body
    #[error("service unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The call succeeded but carried no resource
    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Any other service error code
    #[error("{code}: {message}")]
    Service { code: String, message: String },
}

impl RemoteError {
    /// Builds an error from a service error code (without namespace prefix)
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "InvalidParameterValueException" => RemoteError::InvalidParameterValue(message),
            "ValidationException" => RemoteError::Validation(message),
            "ResourceNotFoundException" => RemoteError::ResourceNotFound(message),
            "AccessDeniedException" => RemoteError::AccessDenied(message),
            "AuthorizationException" => RemoteError::Authorization(message),
            "ResourceLimitExceededException" => RemoteError::ResourceLimitExceeded(message),
            "FailedDependencyException" => RemoteError::FailedDependency(message),
            "RateLimitExceededException" => RemoteError::RateLimitExceeded(message),
            "ThrottlingException" => RemoteError::Throttling(message),
            "ServerInternalException" => RemoteError::ServerInternal(message),
            _ => RemoteError::Service {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Error code, or a short transport label for non-service failures
    pub fn code(&self) -> &str {
        match self {
            RemoteError::InvalidParameterValue(_) => "InvalidParameterValueException",
            RemoteError::Validation(_) => "ValidationException",
            RemoteError::ResourceNotFound(_) => "ResourceNotFoundException",
            RemoteError::AccessDenied(_) => "AccessDeniedException",
            RemoteError::Authorization(_) => "AuthorizationException",
            RemoteError::ResourceLimitExceeded(_) => "ResourceLimitExceededException",
            RemoteError::FailedDependency(_) => "FailedDependencyException",
            RemoteError::RateLimitExceeded(_) => "RateLimitExceededException",
            RemoteError::Throttling(_) => "ThrottlingException",
            RemoteError::ServerInternal(_) => "ServerInternalException",
            RemoteError::Unavailable { .. } => "Unavailable",
            RemoteError::Connection(_) => "Connection",
            RemoteError::Timeout(_) => "Timeout",
            RemoteError::EmptyResult(_) => "EmptyResult",
            RemoteError::InvalidResponse(_) => "InvalidResponse",
            RemoteError::Service { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteError::InvalidParameterValue(message)
            | RemoteError::Validation(message)
            | RemoteError::ResourceNotFound(message)
            | RemoteError::AccessDenied(message)
            | RemoteError::Authorization(message)
            | RemoteError::ResourceLimitExceeded(message)
            | RemoteError::FailedDependency(message)
            | RemoteError::RateLimitExceeded(message)
            | RemoteError::Throttling(message)
            | RemoteError::ServerInternal(message)
            | RemoteError::Connection(message)
            | RemoteError::Timeout(message)
            | RemoteError::EmptyResult(message)
            | RemoteError::InvalidResponse(message)
            | RemoteError::Unavailable { message, .. }
            | RemoteError::Service { message, .. } => message,
        }
    }
}

// ============================================================================
// DTOs
// ============================================================================

/// Create request; tags are already merged with the defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLicenseConfigurationInput {
    pub name: String,
    pub description: Option<String>,
    pub license_counting_type: LicenseCountingType,
    /// `None` is unlimited and is omitted from the request
    pub license_count: Option<u64>,
    pub license_count_hard_limit: bool,
    pub license_rules: Vec<LicenseRule>,
    pub tags: Tags,
}

/// Create response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLicenseConfiguration {
    pub arn: LicenseConfigurationArn,
}

/// Get response, as reported by the remote system
///
/// Carries no ARN; callers already know which identity they asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseConfigurationDescription {
    pub license_configuration_id: Option<String>,
    pub owner_account_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub license_counting_type: Option<LicenseCountingType>,
    pub license_count: Option<u64>,
    pub license_count_hard_limit: Option<bool>,
    pub license_rules: Vec<String>,
    /// Tags as stored remotely (the merged set)
    pub tags: Tags,
    pub status: Option<String>,
    pub consumed_licenses: Option<u64>,
}

/// Update request for the non-tag mutable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLicenseConfigurationInput {
    pub arn: LicenseConfigurationArn,
    pub name: String,
    /// Always sent; an empty string clears the description
    pub description: String,
    /// Sent only when set
    pub license_count: Option<u64>,
    pub license_count_hard_limit: bool,
}

// ============================================================================
// ILicenseManagerClient
// ============================================================================

/// Port trait for the remote licensing control plane
#[async_trait::async_trait]
pub trait ILicenseManagerClient: Send + Sync {
    /// Creates a license configuration and returns its new identity
    async fn create_license_configuration(
        &self,
        input: CreateLicenseConfigurationInput,
    ) -> Result<CreatedLicenseConfiguration, RemoteError>;

    /// Describes the license configuration with the given identity
    async fn get_license_configuration(
        &self,
        arn: &LicenseConfigurationArn,
    ) -> Result<LicenseConfigurationDescription, RemoteError>;

    async fn update_license_configuration(
        &self,
        input: UpdateLicenseConfigurationInput,
    ) -> Result<(), RemoteError>;

    async fn delete_license_configuration(
        &self,
        arn: &LicenseConfigurationArn,
    ) -> Result<(), RemoteError>;

    /// Adds or overwrites the given tags
    async fn tag_resource(
        &self,
        arn: &LicenseConfigurationArn,
        tags: &Tags,
    ) -> Result<(), RemoteError>;

    /// Removes the given tag keys
    async fn untag_resource(
        &self,
        arn: &LicenseConfigurationArn,
        tag_keys: &[String],
    ) -> Result<(), RemoteError>;
}
