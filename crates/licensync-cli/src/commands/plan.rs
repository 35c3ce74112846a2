//! Plan command - Show the change needed to converge a declared configuration
//!
//! Refreshes the tracked resource, then compares its last observation with
//! the declared configuration. Nothing is changed remotely and the state file
//! is not written.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use licensync_core::config::Config;
use licensync_core::domain::{plan_for, ChangePlan, LifecyclePlan};

use super::refresh::refresh_tracked;
use super::{build_reconciler, interruptible_context, load_desired, validate_desired};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};
use crate::state::StateFile;

#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Declared configuration (YAML)
    #[arg(long, short)]
    pub file: PathBuf,

    /// State file of the tracked resource
    #[arg(long, default_value = "licensync.state.json")]
    pub state: PathBuf,
}

/// Prints a plan in human form
pub(crate) fn describe_plan(formatter: &dyn OutputFormatter, plan: &LifecyclePlan) {
    match plan {
        LifecyclePlan::Create => formatter.info("+ create license configuration"),
        LifecyclePlan::Change(ChangePlan::NoOp) => {
            formatter.info("No changes. License configuration is up to date.")
        }
        LifecyclePlan::Change(ChangePlan::InPlaceUpdate(attributes)) => {
            formatter.info("~ update license configuration in place");
            for attribute in attributes {
                formatter.info(&format!("    ~ {attribute}"));
            }
        }
        LifecyclePlan::Change(ChangePlan::Replace(attributes)) => {
            formatter.info("-/+ replace license configuration (delete, then create)");
            for attribute in attributes {
                formatter.info(&format!("    # {attribute} forces replacement"));
            }
        }
    }
}

impl PlanCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let desired = load_desired(&self.file)?;
        validate_desired(config, &desired)
            .with_context(|| format!("Invalid declared configuration: {}", self.file.display()))?;

        let mut state = StateFile::load(&self.state)?;
        let reconciler = build_reconciler(config)?;
        let ctx = interruptible_context();
        refresh_tracked(&reconciler, &mut state.resource, &ctx, formatter.as_ref()).await?;

        let plan = plan_for(&state.resource, &desired);

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "identity": state.resource.identity().map(|arn| arn.as_str()),
                "plan": serde_json::to_value(&plan)?,
            }));
            return Ok(());
        }

        if let Some(arn) = state.resource.identity() {
            formatter.field("ARN", arn.as_str());
        }
        describe_plan(formatter.as_ref(), &plan);
        Ok(())
    }
}
