//! Error classifier
//!
//! Maps a raw [`RemoteError`] plus the operation that produced it onto the
//! [`ErrorKind`] taxonomy.

use crate::domain::errors::{ErrorKind, Operation};
use crate::ports::RemoteError;

/// Message fragment the remote system uses for an unknown or malformed identity
pub const INVALID_ARN_MESSAGE: &str = "Invalid license configuration ARN";

/// Classifies a failed remote call.
///
/// An unknown-identity report is only `NotFound` for calls addressed to an
/// existing identity; on create there is no identity, so it is `Validation`.
pub fn classify(error: &RemoteError, operation: Operation) -> ErrorKind {
    match error {
        RemoteError::InvalidParameterValue(message) if message.contains(INVALID_ARN_MESSAGE) => {
            if operation.targets_identity() {
                ErrorKind::NotFound
            } else {
                ErrorKind::Validation
            }
        }
        RemoteError::ResourceNotFound(_) | RemoteError::EmptyResult(_) => {
            if operation.targets_identity() {
                ErrorKind::NotFound
            } else {
                ErrorKind::Fatal
            }
        }
        RemoteError::InvalidParameterValue(_) | RemoteError::Validation(_) => ErrorKind::Validation,
        RemoteError::Throttling(_)
        | RemoteError::RateLimitExceeded(_)
        | RemoteError::ServerInternal(_)
        | RemoteError::Connection(_)
        | RemoteError::Timeout(_) => ErrorKind::Transient,
        RemoteError::Unavailable { status, .. } if *status == 429 || *status >= 500 => {
            ErrorKind::Transient
        }
        RemoteError::Unavailable { .. }
        | RemoteError::AccessDenied(_)
        | RemoteError::Authorization(_)
        | RemoteError::ResourceLimitExceeded(_)
        | RemoteError::FailedDependency(_)
        | RemoteError::InvalidResponse(_)
        | RemoteError::Service { .. } => ErrorKind::Fatal,
    }
}
