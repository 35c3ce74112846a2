//! Refresh command - Check tracked state for drift
//!
//! Reads the tracked license configuration and records the observation. If
//! it was deleted out-of-band the state file is marked gone, so the next
//! `apply` creates it again.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use licensync_core::config::Config;
use licensync_core::domain::ManagedResource;
use licensync_core::usecases::{CallContext, LicenseConfigurationReconciler};

use super::{build_reconciler, interruptible_context, print_observed};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};
use crate::state::StateFile;

#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// State file of the tracked resource
    #[arg(long, default_value = "licensync.state.json")]
    pub state: PathBuf,
}

/// Refreshes a tracked resource; untracked resources are left alone
///
/// Returns true if the resource turned out to be gone.
pub(crate) async fn refresh_tracked(
    reconciler: &LicenseConfigurationReconciler,
    resource: &mut ManagedResource,
    ctx: &CallContext,
    formatter: &dyn OutputFormatter,
) -> Result<bool> {
    let Some(arn) = resource.identity().cloned() else {
        return Ok(false);
    };

    let outcome = reconciler
        .read(resource, ctx)
        .await
        .context("Failed to refresh license configuration")?;

    if outcome.is_gone() {
        formatter.warn(&format!(
            "License configuration {arn} no longer exists, removing from state"
        ));
    }
    Ok(outcome.is_gone())
}

impl RefreshCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut state = StateFile::load(&self.state)?;

        if !state.resource.state().is_present() {
            formatter.info(&format!(
                "Nothing to refresh: resource is {}",
                state.resource.state().name()
            ));
            if format == OutputFormat::Json {
                formatter.print_json(&serde_json::to_value(&state)?);
            }
            return Ok(());
        }

        let reconciler = build_reconciler(config)?;
        let ctx = interruptible_context();

        let result = refresh_tracked(&reconciler, &mut state.resource, &ctx, formatter.as_ref()).await;
        state.save(&self.state)?;
        let gone = result?;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&state)?);
            return Ok(());
        }

        if !gone {
            formatter.success("State is up to date");
            if let Some(observed) = state.resource.observed() {
                print_observed(formatter.as_ref(), observed);
            }
        }
        Ok(())
    }
}
