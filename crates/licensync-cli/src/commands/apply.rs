//! Apply command - Converge the remote license configuration
//!
//! Provides the `licensync apply` CLI command which:
//! 1. Loads the declared configuration and the state file
//! 2. Refreshes the tracked resource
//! 3. Creates, updates, or replaces it (delete, then create)
//! 4. Persists the new state, even when a step fails part way

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use licensync_core::config::Config;
use licensync_core::domain::{
    plan_for, ChangePlan, DeclaredConfiguration, LifecyclePlan, ManagedResource,
};
use licensync_core::usecases::{CallContext, LicenseConfigurationReconciler, ReadOutcome};
use tracing::info;

use super::plan::describe_plan;
use super::refresh::refresh_tracked;
use super::{
    build_reconciler, interruptible_context, load_desired, print_observed, validate_desired,
};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};
use crate::state::StateFile;

#[derive(Debug, Args)]
pub struct ApplyCommand {
    /// Declared configuration (YAML)
    #[arg(long, short)]
    pub file: PathBuf,

    /// State file of the tracked resource
    #[arg(long, default_value = "licensync.state.json")]
    pub state: PathBuf,
}

/// Carries out one lifecycle plan against a refreshed resource
async fn converge(
    reconciler: &LicenseConfigurationReconciler,
    resource: &mut ManagedResource,
    plan: &LifecyclePlan,
    desired: &DeclaredConfiguration,
    ctx: &CallContext,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    match plan {
        LifecyclePlan::Create => {
            let observed = reconciler
                .create(resource, desired, ctx)
                .await
                .context("Failed to create license configuration")?;
            formatter.success(&format!("Created license configuration {}", observed.arn));
        }
        LifecyclePlan::Change(ChangePlan::NoOp) => {
            formatter.success("No changes. License configuration is up to date.");
        }
        LifecyclePlan::Change(ChangePlan::InPlaceUpdate(_)) => {
            let prior = resource
                .observed()
                .map(|observed| observed.to_declared())
                .unwrap_or_else(|| desired.clone());

            match reconciler
                .update(resource, &prior, desired, ctx)
                .await
                .context("Failed to update license configuration")?
            {
                ReadOutcome::Found(observed) => {
                    formatter.success(&format!("Updated license configuration {}", observed.arn))
                }
                ReadOutcome::Gone => formatter.warn(
                    "License configuration disappeared after the update, removed from state",
                ),
            }
        }
        LifecyclePlan::Change(ChangePlan::Replace(attributes)) => {
            let old = resource.identity().map(ToString::to_string).unwrap_or_default();
            info!(arn = %old, ?attributes, "Replacing license configuration");

            reconciler
                .delete(resource, ctx)
                .await
                .context("Failed to delete license configuration for replacement")?;
            let observed = reconciler
                .create(resource, desired, ctx)
                .await
                .context("Failed to create replacement license configuration")?;
            formatter.success(&format!(
                "Replaced license configuration {old} with {}",
                observed.arn
            ));
        }
    }
    Ok(())
}

impl ApplyCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let desired = load_desired(&self.file)?;
        validate_desired(config, &desired)
            .with_context(|| format!("Invalid declared configuration: {}", self.file.display()))?;

        let mut state = StateFile::load(&self.state)?;
        let reconciler = build_reconciler(config)?;
        let ctx = interruptible_context();

        let refreshed = refresh_tracked(&reconciler, &mut state.resource, &ctx, formatter.as_ref()).await;
        if let Err(e) = refreshed {
            state.save(&self.state)?;
            return Err(e);
        }

        let plan = plan_for(&state.resource, &desired);
        describe_plan(formatter.as_ref(), &plan);

        let result = converge(
            &reconciler,
            &mut state.resource,
            &plan,
            &desired,
            &ctx,
            formatter.as_ref(),
        )
        .await;

        state.save(&self.state)?;
        result?;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&state)?);
        } else if let Some(observed) = state.resource.observed() {
            print_observed(formatter.as_ref(), observed);
        }
        Ok(())
    }
}
