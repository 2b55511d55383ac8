//! Command handler modules for rsv-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod report;
pub mod snapshot;

use anyhow::{Context, Result};
use rsv_config::{load_settings, AwsSettings, ReportFormat, Settings};
use rsv_inventory::Ec2InventorySource;
use rsv_reconcile::AllocationPolicy;
use tracing::debug;

use crate::AwsArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config; no paths means all defaults.
pub fn load_config(paths: &[String]) -> Result<Settings> {
    let settings = load_settings(paths)?;
    debug!(layers = paths.len(), ?settings, "config loaded");
    Ok(settings)
}

/// Parse a CLI `--allocation` string into an [`AllocationPolicy`].
pub fn parse_allocation(raw: &str) -> Result<AllocationPolicy> {
    AllocationPolicy::parse(raw).with_context(|| {
        format!(
            "invalid --allocation '{}'. expected one of: key-order | fair-share",
            raw
        )
    })
}

/// Parse a CLI `--format` string into a [`ReportFormat`].
pub fn parse_format(raw: &str) -> Result<ReportFormat> {
    ReportFormat::parse(raw)
        .with_context(|| format!("invalid --format '{}'. expected one of: table | json", raw))
}

/// CLI flags win over config values.
pub fn merge_aws(config: &AwsSettings, flags: &AwsArgs) -> AwsSettings {
    AwsSettings {
        region: flags.region.clone().or_else(|| config.region.clone()),
        profile: flags.profile.clone().or_else(|| config.profile.clone()),
    }
}

pub async fn connect_ec2(aws: &AwsSettings) -> Result<Ec2InventorySource> {
    let source = Ec2InventorySource::connect(aws.region.as_deref(), aws.profile.as_deref())
        .await
        .context("failed to initialize EC2 client")?;
    Ok(source)
}
