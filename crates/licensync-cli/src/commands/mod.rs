//! CLI subcommands
//!
//! Each command loads the state file, drives the reconciler for one resource
//! and persists the resulting state.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use licensync_client::{HttpLicenseManager, LicenseManagerClient};
use licensync_core::config::Config;
use licensync_core::domain::{DeclaredConfiguration, DomainError, ObservedState};
use licensync_core::ports::StaticTagProvider;
use licensync_core::usecases::{CallContext, LicenseConfigurationReconciler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::output::OutputFormatter;

/// Wires the HTTP adapter and the configured tag policy into a reconciler
pub(crate) fn build_reconciler(config: &Config) -> Result<LicenseConfigurationReconciler> {
    let client = LicenseManagerClient::from_config(&config.endpoint)
        .context("Failed to create License Manager client")?;
    info!(endpoint = %client.base_url(), "Using License Manager endpoint");

    Ok(LicenseConfigurationReconciler::new(
        Arc::new(HttpLicenseManager::new(client)),
        Arc::new(StaticTagProvider::from(&config.tags)),
    ))
}

/// Reads a declared configuration from a YAML file
pub(crate) fn load_desired(path: &Path) -> Result<DeclaredConfiguration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse declared configuration: {}", path.display()))
}

/// Checks a declared configuration against the configured tag policy
pub(crate) fn validate_desired(
    config: &Config,
    desired: &DeclaredConfiguration,
) -> Result<(), DomainError> {
    desired.validate()?;
    config.tags.policy().check_declared(&desired.tags)
}

/// A call context cancelled on Ctrl-C
pub(crate) fn interruptible_context() -> CallContext {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight call");
            token.cancel();
        }
    });
    CallContext::new().with_cancellation(cancel)
}

/// Prints the interesting parts of an observation in human form
pub(crate) fn print_observed(formatter: &dyn OutputFormatter, observed: &ObservedState) {
    formatter.field("ARN", observed.arn.as_str());
    formatter.field("Name", &observed.name);
    formatter.field("Counting type", observed.license_counting_type.as_str());
    formatter.field(
        "License count",
        &observed
            .license_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unlimited".to_string()),
    );
    formatter.field(
        "Hard limit",
        if observed.license_count_hard_limit { "yes" } else { "no" },
    );
    if let Some(consumed) = observed.consumed_licenses {
        formatter.field("Consumed", &consumed.to_string());
    }
    if let Some(status) = &observed.status {
        formatter.field("Status", status);
    }
    if !observed.tags.is_empty() {
        let tags: Vec<String> = observed
            .tags
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        formatter.field("Tags", &tags.join(", "));
    }
}
