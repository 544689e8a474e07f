//! Optional JSON configuration file.
//!
//! Every field is optional; flags given on the command line win over the
//! file, and the file wins over the built-in defaults.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScielabConfig {
    pub screen_width: Option<usize>,
    pub screen_height: Option<usize>,
    pub diagonal: Option<f64>,
    pub viewing_distance: Option<f64>,
    /// `"cie76"` or `"ciede2000"`.
    pub delta_e: Option<String>,
    pub device: Option<String>,
    pub report_dir: Option<PathBuf>,
    pub diffmap_dir: Option<PathBuf>,
    pub scores: Option<PathBuf>,
    pub max_diff: Option<f64>,
    pub log_level: Option<String>,
}

pub fn load_config(path: &Path) -> Result<ScielabConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let cfg: ScielabConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
