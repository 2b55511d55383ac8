//! `rsv snapshot`: capture EC2 inventory to a JSON file for offline reports.
//!
//! The capture is written raw (before normalization) so a later
//! `report --snapshot` applies the same validation as a live run.

use std::path::Path;

use anyhow::{Context, Result};
use rsv_inventory::{write_snapshot, InventorySource};

use super::{connect_ec2, load_config, merge_aws};
use crate::AwsArgs;

pub async fn run(out: &str, config_paths: &[String], aws: &AwsArgs) -> Result<()> {
    let settings = load_config(config_paths)?;

    let source = connect_ec2(&merge_aws(&settings.aws, aws)).await?;
    let raw = source
        .fetch()
        .await
        .with_context(|| format!("failed to fetch inventory from {}", source.source_name()))?;

    write_snapshot(Path::new(out), &raw)
        .await
        .with_context(|| format!("failed to write snapshot: {out}"))?;

    println!("snapshot_written=true path={}", out);
    println!("region={}", source.region());
    println!("instances={}", raw.instances.len());
    println!("reservations={}", raw.reservations.len());
    Ok(())
}
