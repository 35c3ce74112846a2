//! Lifecycle reconciler
//!
//! Orchestrates Create, Read, Update, Delete and Import of one license
//! configuration against the [`ILicenseManagerClient`] port. The reconciler
//! owns no per-resource state: everything about a resource lives in the
//! [`ManagedResource`] the caller passes in, so one reconciler can serve many
//! resources concurrently.
//!
//! Failures are classified and returned immediately; nothing is retried here.
//! The two self-healing behaviors are a NotFound delete (treated as success)
//! and a NotFound refresh (the resource is marked [`ResourceState::Gone`]).

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::diff::{classify_change, ChangePlan, ImmutableAttribute};
use crate::domain::errors::{DomainError, ErrorKind, Operation};
use crate::domain::license_configuration::{
    DeclaredConfiguration, ManagedResource, ObservedState, ResourceState,
};
use crate::domain::newtypes::LicenseConfigurationArn;
use crate::domain::tags::{TagDelta, TagPolicy, Tags};
use crate::ports::{
    CreateLicenseConfigurationInput, IDefaultTagProvider, ILicenseManagerClient, RemoteError,
    UpdateLicenseConfigurationInput,
};

use super::classify::classify;

// ============================================================================
// CallContext
// ============================================================================

/// Cancellation and deadline applied to every remote call of one entry point
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Deadline applied to each remote call individually
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

enum CallFailure {
    Remote(RemoteError),
    Cancelled,
    DeadlineExceeded(Duration),
}

/// Runs one remote call, aborting it on cancellation or deadline expiry.
async fn guarded<T, F>(ctx: &CallContext, call: F) -> Result<T, CallFailure>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    let bounded = async {
        match ctx.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(CallFailure::Remote),
                Err(_) => Err(CallFailure::DeadlineExceeded(limit)),
            },
            None => call.await.map_err(CallFailure::Remote),
        }
    };

    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(CallFailure::Cancelled),
        result = bounded => result,
    }
}

// ============================================================================
// ReconcileError
// ============================================================================

fn join_attributes(attributes: &BTreeSet<ImmutableAttribute>) -> String {
    attributes
        .iter()
        .map(ImmutableAttribute::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A classified failure of one lifecycle entry point
///
/// `identity` is the ARN, or the configuration name when no ARN exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The remote call failed
    #[error("{operation} License Manager License Configuration ({identity}): {message}")]
    Remote {
        operation: Operation,
        identity: String,
        kind: ErrorKind,
        message: String,
    },

    /// Local validation failed; no remote call was made
    #[error("{operation} License Manager License Configuration ({identity}): invalid {field}: {message}")]
    Validation {
        operation: Operation,
        identity: String,
        field: String,
        message: String,
    },

    #[error("{operation} License Manager License Configuration ({identity}): operation cancelled")]
    Cancelled {
        operation: Operation,
        identity: String,
    },

    #[error("{operation} License Manager License Configuration ({identity}): deadline of {timeout:?} exceeded")]
    DeadlineExceeded {
        operation: Operation,
        identity: String,
        timeout: Duration,
    },

    /// The entry point was called in a state it does not accept
    #[error("{operation} License Manager License Configuration ({identity}): resource is {state}, expected {expected}")]
    InvalidState {
        operation: Operation,
        identity: String,
        state: String,
        expected: &'static str,
    },

    /// An immutable attribute changed; the caller must delete then create
    #[error(
        "updating License Manager License Configuration ({identity}): {} cannot change in place, the resource must be replaced",
        join_attributes(.attributes)
    )]
    ReplacementRequired {
        identity: String,
        attributes: BTreeSet<ImmutableAttribute>,
    },
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Remote { kind, .. } => *kind,
            ReconcileError::Validation { .. } => ErrorKind::Validation,
            ReconcileError::Cancelled { .. } | ReconcileError::DeadlineExceeded { .. } => {
                ErrorKind::Transient
            }
            ReconcileError::InvalidState { .. } | ReconcileError::ReplacementRequired { .. } => {
                ErrorKind::Fatal
            }
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ReconcileError::Remote { operation, .. }
            | ReconcileError::Validation { operation, .. }
            | ReconcileError::Cancelled { operation, .. }
            | ReconcileError::DeadlineExceeded { operation, .. }
            | ReconcileError::InvalidState { operation, .. } => *operation,
            ReconcileError::ReplacementRequired { .. } => Operation::Update,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            ReconcileError::Remote { identity, .. }
            | ReconcileError::Validation { identity, .. }
            | ReconcileError::Cancelled { identity, .. }
            | ReconcileError::DeadlineExceeded { identity, .. }
            | ReconcileError::InvalidState { identity, .. }
            | ReconcileError::ReplacementRequired { identity, .. } => identity,
        }
    }

    /// Returns true if the caller may retry with backoff
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    fn validation(operation: Operation, identity: &str, error: DomainError) -> Self {
        match error {
            DomainError::ValidationFailed { field, message } => ReconcileError::Validation {
                operation,
                identity: identity.to_string(),
                field,
                message,
            },
            other => ReconcileError::Validation {
                operation,
                identity: identity.to_string(),
                field: "configuration".to_string(),
                message: other.to_string(),
            },
        }
    }

    fn invalid_state(operation: Operation, state: &ResourceState, expected: &'static str) -> Self {
        ReconcileError::InvalidState {
            operation,
            identity: state
                .identity()
                .map_or_else(|| state.name().to_string(), |arn| arn.to_string()),
            state: state.name().to_string(),
            expected,
        }
    }

    fn from_failure(operation: Operation, identity: &str, failure: CallFailure) -> Self {
        let identity = identity.to_string();
        match failure {
            CallFailure::Remote(error) => {
                let kind = classify(&error, operation);
                debug!(%operation, %identity, %kind, code = error.code(), "Remote call failed");
                ReconcileError::Remote {
                    operation,
                    identity,
                    kind,
                    message: error.to_string(),
                }
            }
            CallFailure::Cancelled => ReconcileError::Cancelled {
                operation,
                identity,
            },
            CallFailure::DeadlineExceeded(timeout) => ReconcileError::DeadlineExceeded {
                operation,
                identity,
                timeout,
            },
        }
    }
}

// ============================================================================
// Read outcomes
// ============================================================================

/// Why a read is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadIntent {
    /// The resource was just created; NotFound means still provisioning
    NewResource,
    /// Routine drift check; NotFound means deleted out-of-band
    Refresh,
}

/// Result of a successful read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(ObservedState),
    /// Deleted out-of-band; the caller should drop its local state
    Gone,
}

impl ReadOutcome {
    pub fn observed(&self) -> Option<&ObservedState> {
        match self {
            ReadOutcome::Found(observed) => Some(observed),
            ReadOutcome::Gone => None,
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, ReadOutcome::Gone)
    }
}

// ============================================================================
// LicenseConfigurationReconciler
// ============================================================================

/// Lifecycle state machine for license configurations
pub struct LicenseConfigurationReconciler {
    client: Arc<dyn ILicenseManagerClient + Send + Sync>,
    tag_provider: Arc<dyn IDefaultTagProvider + Send + Sync>,
}

impl LicenseConfigurationReconciler {
    /// Creates a new reconciler
    ///
    /// # Arguments
    ///
    /// * `client` - Remote license manager operations
    /// * `tag_provider` - Source of the default tags, read once per entry point
    pub fn new(
        client: Arc<dyn ILicenseManagerClient + Send + Sync>,
        tag_provider: Arc<dyn IDefaultTagProvider + Send + Sync>,
    ) -> Self {
        Self {
            client,
            tag_provider,
        }
    }

    /// Creates the remote resource and reads it back.
    ///
    /// Requires an Absent (or Gone) resource. The configuration is validated
    /// before any remote call. If the follow-up read fails, the new identity
    /// is kept and the read error is returned.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ReconcileError`]; on a create failure the
    /// resource stays untracked
    #[tracing::instrument(skip_all, fields(name = %desired.name))]
    pub async fn create(
        &self,
        resource: &mut ManagedResource,
        desired: &DeclaredConfiguration,
        ctx: &CallContext,
    ) -> Result<ObservedState, ReconcileError> {
        if resource.state().is_present() {
            return Err(ReconcileError::invalid_state(
                Operation::Create,
                resource.state(),
                "absent",
            ));
        }

        let policy = self.tag_provider.tag_policy();
        let license_rules = desired
            .validate()
            .and_then(|rules| policy.check_declared(&desired.tags).map(|()| rules))
            .map_err(|e| ReconcileError::validation(Operation::Create, &desired.name, e))?;

        let input = CreateLicenseConfigurationInput {
            name: desired.name.clone(),
            description: desired.effective_description().map(str::to_string),
            license_counting_type: desired.license_counting_type,
            license_count: desired.license_count,
            license_count_hard_limit: desired.license_count_hard_limit,
            license_rules,
            tags: policy.merged(&desired.tags),
        };

        debug!("Creating license configuration");
        let created = guarded(ctx, self.client.create_license_configuration(input))
            .await
            .map_err(|f| ReconcileError::from_failure(Operation::Create, &desired.name, f))?;

        info!(arn = %created.arn, "License configuration created");
        resource
            .begin_tracking(created.arn)
            .map_err(|_| {
                ReconcileError::invalid_state(Operation::Create, resource.state(), "absent")
            })?;

        match self
            .refresh(resource, Some(&desired.tags), &policy, ReadIntent::NewResource, ctx)
            .await?
        {
            ReadOutcome::Found(observed) => Ok(observed),
            ReadOutcome::Gone => Err(ReconcileError::invalid_state(
                Operation::Read,
                resource.state(),
                "present",
            )),
        }
    }

    /// Routine drift check of a tracked resource.
    ///
    /// A NotFound answer is not an error: the resource is marked Gone and
    /// [`ReadOutcome::Gone`] is returned.
    pub async fn read(
        &self,
        resource: &mut ManagedResource,
        ctx: &CallContext,
    ) -> Result<ReadOutcome, ReconcileError> {
        self.read_with_intent(resource, ReadIntent::Refresh, ctx)
            .await
    }

    /// Reads a tracked resource; with [`ReadIntent::NewResource`] a NotFound
    /// answer is surfaced as an error instead of marking the resource Gone
    #[tracing::instrument(skip(self, resource, ctx), fields(arn = ?resource.identity().map(|a| a.as_str())))]
    pub async fn read_with_intent(
        &self,
        resource: &mut ManagedResource,
        intent: ReadIntent,
        ctx: &CallContext,
    ) -> Result<ReadOutcome, ReconcileError> {
        let declared_tags = resource.observed().map(|observed| observed.tags.clone());
        let policy = self.tag_provider.tag_policy();
        self.refresh(resource, declared_tags.as_ref(), &policy, intent, ctx)
            .await
    }

    /// Applies an in-place change from `prior` to `desired`, then refreshes.
    ///
    /// A change to an immutable attribute is rejected before any remote call.
    /// The Update call is made only if a non-tag attribute changed; tags are
    /// moved to the desired merged set through the tag API (removals first).
    #[tracing::instrument(skip_all, fields(arn = ?resource.identity().map(|a| a.as_str())))]
    pub async fn update(
        &self,
        resource: &mut ManagedResource,
        prior: &DeclaredConfiguration,
        desired: &DeclaredConfiguration,
        ctx: &CallContext,
    ) -> Result<ReadOutcome, ReconcileError> {
        let Some(arn) = resource.identity().cloned() else {
            return Err(ReconcileError::invalid_state(
                Operation::Update,
                resource.state(),
                "present",
            ));
        };

        let plan = classify_change(prior, desired);
        if let ChangePlan::Replace(attributes) = &plan {
            return Err(ReconcileError::ReplacementRequired {
                identity: arn.to_string(),
                attributes: attributes.clone(),
            });
        }

        let policy = self.tag_provider.tag_policy();
        desired
            .validate()
            .and_then(|_| policy.check_declared(&desired.tags))
            .map_err(|e| ReconcileError::validation(Operation::Update, arn.as_str(), e))?;

        if plan.requires_update_call() {
            let input = UpdateLicenseConfigurationInput {
                arn: arn.clone(),
                name: desired.name.clone(),
                description: desired.effective_description().unwrap_or_default().to_string(),
                license_count: desired.license_count,
                license_count_hard_limit: desired.license_count_hard_limit,
            };

            debug!(%plan, "Updating license configuration");
            guarded(ctx, self.client.update_license_configuration(input))
                .await
                .map_err(|f| ReconcileError::from_failure(Operation::Update, arn.as_str(), f))?;
            info!("License configuration updated");
        }

        let current = resource
            .observed()
            .map(|observed| observed.merged_tags.clone())
            .unwrap_or_else(|| policy.merged(&prior.tags));
        let delta = TagDelta::between(&current, &policy.merged(&desired.tags));
        self.apply_tag_delta(&arn, &delta, ctx).await?;

        self.refresh(resource, Some(&desired.tags), &policy, ReadIntent::Refresh, ctx)
            .await
    }

    /// Deletes the remote resource.
    ///
    /// Deleting an untracked resource, or one the remote system no longer
    /// knows, succeeds. Any other failure leaves the resource tracked.
    #[tracing::instrument(skip_all, fields(arn = ?resource.identity().map(|a| a.as_str())))]
    pub async fn delete(
        &self,
        resource: &mut ManagedResource,
        ctx: &CallContext,
    ) -> Result<(), ReconcileError> {
        let Some(arn) = resource.identity().cloned() else {
            debug!(state = resource.state().name(), "Nothing to delete");
            resource.mark_deleted();
            return Ok(());
        };

        debug!("Deleting license configuration");
        match guarded(ctx, self.client.delete_license_configuration(&arn)).await {
            Ok(()) => {
                info!("License configuration deleted");
                resource.mark_deleted();
                Ok(())
            }
            Err(failure) => {
                let error = ReconcileError::from_failure(Operation::Delete, arn.as_str(), failure);
                if error.kind() == ErrorKind::NotFound {
                    info!("License configuration already deleted");
                    resource.mark_deleted();
                    return Ok(());
                }
                Err(error)
            }
        }
    }

    /// Starts tracking an existing remote resource.
    ///
    /// The caller should adopt [`ObservedState::to_declared`] as its baseline.
    #[tracing::instrument(skip(self, resource, ctx))]
    pub async fn import(
        &self,
        resource: &mut ManagedResource,
        identity: &str,
        ctx: &CallContext,
    ) -> Result<ObservedState, ReconcileError> {
        if resource.state().is_present() {
            return Err(ReconcileError::invalid_state(
                Operation::Import,
                resource.state(),
                "absent",
            ));
        }

        let arn = identity
            .parse::<LicenseConfigurationArn>()
            .map_err(|e| ReconcileError::Validation {
                operation: Operation::Import,
                identity: identity.to_string(),
                field: "arn".to_string(),
                message: e.to_string(),
            })?;

        let policy = self.tag_provider.tag_policy();
        let observed = self
            .observe(Operation::Import, &arn, None, &policy, ctx)
            .await?;

        resource
            .begin_tracking(arn)
            .and_then(|()| resource.record_observation(observed.clone()))
            .map_err(|_| {
                ReconcileError::invalid_state(Operation::Import, resource.state(), "absent")
            })?;

        info!(arn = %observed.arn, "License configuration imported");
        Ok(observed)
    }

    async fn refresh(
        &self,
        resource: &mut ManagedResource,
        declared_tags: Option<&Tags>,
        policy: &TagPolicy,
        intent: ReadIntent,
        ctx: &CallContext,
    ) -> Result<ReadOutcome, ReconcileError> {
        let Some(arn) = resource.identity().cloned() else {
            return Err(ReconcileError::invalid_state(
                Operation::Read,
                resource.state(),
                "present",
            ));
        };

        match self
            .observe(Operation::Read, &arn, declared_tags, policy, ctx)
            .await
        {
            Ok(observed) => {
                resource
                    .record_observation(observed.clone())
                    .map_err(|_| {
                        ReconcileError::invalid_state(Operation::Read, resource.state(), "present")
                    })?;
                Ok(ReadOutcome::Found(observed))
            }
            Err(error) if error.kind() == ErrorKind::NotFound && intent == ReadIntent::Refresh => {
                warn!(
                    %arn,
                    "License Manager License Configuration not found, removing from state"
                );
                resource.mark_gone().map_err(|_| {
                    ReconcileError::invalid_state(Operation::Read, resource.state(), "present")
                })?;
                Ok(ReadOutcome::Gone)
            }
            Err(error) => Err(error),
        }
    }

    async fn observe(
        &self,
        operation: Operation,
        arn: &LicenseConfigurationArn,
        declared_tags: Option<&Tags>,
        policy: &TagPolicy,
        ctx: &CallContext,
    ) -> Result<ObservedState, ReconcileError> {
        debug!(%arn, "Reading license configuration");
        let description = guarded(ctx, self.client.get_license_configuration(arn))
            .await
            .map_err(|f| ReconcileError::from_failure(operation, arn.as_str(), f))?;

        let Some(license_counting_type) = description.license_counting_type else {
            return Err(ReconcileError::Remote {
                operation,
                identity: arn.to_string(),
                kind: ErrorKind::Fatal,
                message: "response is missing LicenseCountingType".to_string(),
            });
        };

        let merged_tags = policy.extract_merged(&description.tags);
        let tags = policy.resource_tags(&merged_tags, declared_tags);

        Ok(ObservedState {
            arn: arn.clone(),
            license_configuration_id: description.license_configuration_id,
            owner_account_id: description
                .owner_account_id
                .unwrap_or_else(|| arn.account_id().to_string()),
            name: description.name.unwrap_or_default(),
            description: description.description.filter(|d| !d.is_empty()),
            license_count: description.license_count,
            license_count_hard_limit: description.license_count_hard_limit.unwrap_or(false),
            license_counting_type,
            license_rules: description.license_rules,
            tags,
            merged_tags,
            status: description.status,
            consumed_licenses: description.consumed_licenses,
        })
    }

    async fn apply_tag_delta(
        &self,
        arn: &LicenseConfigurationArn,
        delta: &TagDelta,
        ctx: &CallContext,
    ) -> Result<(), ReconcileError> {
        if !delta.remove.is_empty() {
            debug!(keys = ?delta.remove, "Removing tags");
            guarded(ctx, self.client.untag_resource(arn, &delta.remove))
                .await
                .map_err(|f| ReconcileError::from_failure(Operation::Update, arn.as_str(), f))?;
        }

        if !delta.upsert.is_empty() {
            debug!(count = delta.upsert.len(), "Updating tags");
            guarded(ctx, self.client.tag_resource(arn, &delta.upsert))
                .await
                .map_err(|f| ReconcileError::from_failure(Operation::Update, arn.as_str(), f))?;
        }

        Ok(())
    }
}
