//! rsv-config
//!
//! Layered YAML configuration for `rsv report` and `rsv snapshot`.
//!
//! Files are applied in order; a later file overrides an earlier one key by
//! key (nested mappings merge, anything else is replaced). The merged
//! document is then read into [`Settings`]. Unknown keys are rejected so a
//! misspelled option cannot silently fall back to its default.
//!
//! AWS credentials never live here: they come from the SDK environment and
//! profile chain.

mod layers;
mod settings;

use std::path::Path;

use anyhow::Result;

pub use layers::{merge_yaml_layers, read_yaml_layers};
pub use settings::{AwsSettings, ReportFormat, Settings};

/// Read and merge the YAML files at `paths`, then extract [`Settings`].
///
/// No paths means all defaults.
pub fn load_settings<P: AsRef<Path>>(paths: &[P]) -> Result<Settings> {
    if paths.is_empty() {
        return Ok(Settings::default());
    }
    Settings::from_yaml(read_yaml_layers(paths)?)
}

/// Same as [`load_settings`] for in-memory documents.
pub fn settings_from_strings(docs: &[&str]) -> Result<Settings> {
    Settings::from_yaml(merge_yaml_layers(docs)?)
}
