//! `rsv report`: fetch, normalize, reconcile, render.
//!
//! Fail-fast: any fetch, config or validation error aborts before anything
//! is written to stdout. The coverage gate is the one exception: the report
//! is printed first, then the command fails if the gate is blocked.

use std::io::Write;

use anyhow::{Context, Result};
use rsv_config::ReportFormat;
use rsv_inventory::{InventorySource, SnapshotFileSource};
use rsv_reconcile::{check_coverage, normalize, CoverageGate, CoveragePolicy};
use tracing::info;

use super::{connect_ec2, load_config, merge_aws, parse_allocation, parse_format};
use crate::{render, AwsArgs};

pub struct ReportArgs {
    pub config_paths: Vec<String>,
    pub snapshot: Option<String>,
    pub aws: AwsArgs,
    pub allocation: Option<String>,
    pub format: Option<String>,
    pub fail_on_uncovered: bool,
    pub fail_on_unused: bool,
}

pub async fn run(args: ReportArgs) -> Result<()> {
    let settings = load_config(&args.config_paths)?;

    let allocation = match args.allocation.as_deref() {
        Some(raw) => parse_allocation(raw)?,
        None => settings.allocation,
    };
    let format = match args.format.as_deref() {
        Some(raw) => parse_format(raw)?,
        None => settings.format,
    };
    let coverage = CoveragePolicy {
        fail_on_uncovered: args.fail_on_uncovered || settings.coverage.fail_on_uncovered,
        fail_on_unused: args.fail_on_unused || settings.coverage.fail_on_unused,
    };

    let source: Box<dyn InventorySource> = match args.snapshot {
        Some(path) => Box::new(SnapshotFileSource::new(path)),
        None => Box::new(connect_ec2(&merge_aws(&settings.aws, &args.aws)).await?),
    };

    let raw = source
        .fetch()
        .await
        .with_context(|| format!("failed to fetch inventory from {}", source.source_name()))?;
    let inventory = normalize(&raw).context("invalid inventory")?;

    let reconciliation = inventory.reconcile(allocation);
    let report = reconciliation.report();

    info!(
        allocation = allocation.as_str(),
        format = format.as_str(),
        running = inventory.total_running(),
        reserved = inventory.total_reserved(),
        uncovered = reconciliation.total_uncovered(),
        unused = reconciliation.total_unused(),
        "reconciliation complete"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        ReportFormat::Table => render::render_table(&report, &mut out)?,
        ReportFormat::Json => render::render_json(&report, &mut out)?,
    }
    out.flush()?;

    if let CoverageGate::Blocked { reasons } = check_coverage(&reconciliation, coverage) {
        let detail: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        anyhow::bail!("COVERAGE_GATE_BLOCKED: {}", detail.join("; "));
    }

    Ok(())
}
