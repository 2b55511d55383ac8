//! Typed view over the merged config document.
//!
//! ```yaml
//! aws:
//!   region: us-east-1
//!   profile: billing
//! reconcile:
//!   allocation: key_order   # or fair_share
//! report:
//!   format: table           # or json
//!   fail_on_uncovered: false
//!   fail_on_unused: false
//! ```

use anyhow::{bail, Context, Result};
use rsv_reconcile::{AllocationPolicy, CoveragePolicy};
use serde::Deserialize;
use serde_yaml::Value;

/// Output format for `report`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl ReportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Some(ReportFormat::Table),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Table => "table",
            ReportFormat::Json => "json",
        }
    }
}

/// AWS client selection. `None` falls through to the SDK's own env/profile chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub aws: AwsSettings,
    pub allocation: AllocationPolicy,
    pub format: ReportFormat,
    pub coverage: CoveragePolicy,
}

// Wire shape of the config file. Sections may be absent or empty (`aws:`).

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    aws: Option<AwsSection>,
    reconcile: Option<ReconcileSection>,
    report: Option<ReportSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AwsSection {
    region: Option<String>,
    profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReconcileSection {
    allocation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReportSection {
    format: Option<String>,
    fail_on_uncovered: Option<bool>,
    fail_on_unused: Option<bool>,
}

impl Settings {
    /// Read settings from a merged YAML document. Missing keys take defaults;
    /// unknown keys, wrong types and unknown values are errors.
    pub fn from_yaml(doc: Value) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_value(doc).context("invalid config")?;
        let aws = file.aws.unwrap_or_default();
        let reconcile = file.reconcile.unwrap_or_default();
        let report = file.report.unwrap_or_default();

        let allocation = match non_blank(reconcile.allocation) {
            None => AllocationPolicy::default(),
            Some(raw) => match AllocationPolicy::parse(&raw) {
                Some(p) => p,
                None => bail!(
                    "invalid reconcile.allocation '{}'. expected one of: key_order | fair_share",
                    raw
                ),
            },
        };

        let format = match non_blank(report.format) {
            None => ReportFormat::default(),
            Some(raw) => match ReportFormat::parse(&raw) {
                Some(f) => f,
                None => bail!("invalid report.format '{}'. expected one of: table | json", raw),
            },
        };

        Ok(Settings {
            aws: AwsSettings {
                region: non_blank(aws.region),
                profile: non_blank(aws.profile),
            },
            allocation,
            format,
            coverage: CoveragePolicy {
                fail_on_uncovered: report.fail_on_uncovered.unwrap_or(false),
                fail_on_unused: report.fail_on_unused.unwrap_or(false),
            },
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
