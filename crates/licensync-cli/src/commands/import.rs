//! Import command - Start tracking an existing license configuration
//!
//! Reads the configuration under the given ARN and persists it as the
//! tracked resource. With `--write-file` the observation is also written as
//! a declared configuration, to be used as the baseline for `apply`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use licensync_core::config::Config;
use licensync_core::domain::LicenseConfigurationArn;

use super::{build_reconciler, interruptible_context, print_observed};
use crate::output::{get_formatter, OutputFormat};
use crate::state::StateFile;

#[derive(Debug, Args)]
pub struct ImportCommand {
    /// ARN of the license configuration to import
    pub arn: String,

    /// State file of the tracked resource
    #[arg(long, default_value = "licensync.state.json")]
    pub state: PathBuf,

    /// Also write the imported configuration as declared YAML
    #[arg(long)]
    pub write_file: Option<PathBuf>,
}

/// Describes an ARN whose region differs from the configured one
///
/// Only relevant when the endpoint URL is derived from the region; an
/// explicit URL may point anywhere.
fn region_mismatch(arn: &str, config: &Config) -> Option<String> {
    if !config.endpoint.url.is_empty() {
        return None;
    }
    let arn = arn.parse::<LicenseConfigurationArn>().ok()?;
    (arn.region() != config.endpoint.region).then(|| {
        format!(
            "{arn} is in region {}, but the endpoint is configured for {}",
            arn.region(),
            config.endpoint.region
        )
    })
}

impl ImportCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut state = StateFile::load(&self.state)?;

        if let Some(current) = state.resource.identity() {
            bail!(
                "State file {} already tracks {current}; destroy it or use another state file",
                self.state.display()
            );
        }

        if let Some(warning) = region_mismatch(&self.arn, config) {
            formatter.warn(&warning);
        }

        let reconciler = build_reconciler(config)?;
        let ctx = interruptible_context();
        let observed = reconciler
            .import(&mut state.resource, &self.arn, &ctx)
            .await
            .with_context(|| format!("Failed to import {}", self.arn))?;
        state.save(&self.state)?;

        if let Some(path) = &self.write_file {
            let yaml = serde_yaml::to_string(&observed.to_declared())
                .context("Failed to serialize declared configuration")?;
            std::fs::write(path, yaml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&state)?);
            return Ok(());
        }

        formatter.success(&format!("Imported license configuration {}", observed.arn));
        print_observed(formatter.as_ref(), &observed);
        if let Some(path) = &self.write_file {
            formatter.info(&format!("Declared configuration written to {}", path.display()));
        }
        Ok(())
    }
}
