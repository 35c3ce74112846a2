//! Destroy command - Delete the tracked license configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use licensync_core::config::Config;

use super::{build_reconciler, interruptible_context};
use crate::output::{get_formatter, OutputFormat};
use crate::state::StateFile;

#[derive(Debug, Args)]
pub struct DestroyCommand {
    /// State file of the tracked resource
    #[arg(long, default_value = "licensync.state.json")]
    pub state: PathBuf,
}

impl DestroyCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut state = StateFile::load(&self.state)?;

        let Some(arn) = state.resource.identity().cloned() else {
            formatter.success("Nothing to destroy");
            return Ok(());
        };

        let reconciler = build_reconciler(config)?;
        let ctx = interruptible_context();

        // A failed delete leaves the resource tracked
        reconciler
            .delete(&mut state.resource, &ctx)
            .await
            .with_context(|| format!("Failed to destroy {arn}"))?;
        state.save(&self.state)?;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "destroyed": arn.as_str(),
                "state": serde_json::to_value(&state)?,
            }));
        } else {
            formatter.success(&format!("Destroyed license configuration {arn}"));
        }
        Ok(())
    }
}
