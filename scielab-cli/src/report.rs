//! Text evaluation reports and precomputed quality scores.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use scielab::{ColorDifference, MetricName, QualityScores};

const RULE_WIDTH: usize = 60;

/// Creates `dir` (and parents) if missing. Safe to call repeatedly.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))
}

/// `{dir}/{device}_log_{YYYY-MM-DD_HH-MM-SS}.txt`
pub fn report_path(dir: &Path, device: &str, at: &DateTime<Local>) -> PathBuf {
    dir.join(format!("{device}_log_{}.txt", at.format("%Y-%m-%d_%H-%M-%S")))
}

/// One candidate's results as they appear in a report.
pub struct ReportEntry<'a> {
    pub graininess: f64,
    pub difference: &'a ColorDifference,
    pub scores: &'a QualityScores,
}

impl ReportEntry<'_> {
    fn rows(&self) -> Vec<[String; 2]> {
        let (row, col) = self.difference.max_pos;
        let mut rows = vec![
            ["Metric".to_string(), "Value".to_string()],
            ["Avg STD - Graininess".to_string(), format!("{:.3}", self.graininess)],
            ["Avg Color Diff".to_string(), format!("{:.3}", self.difference.avg_diff)],
            [
                "Max Color Diff".to_string(),
                format!("{:.3} (at ({row}, {col}))", self.difference.max_diff),
            ],
        ];
        for metric in MetricName::ALL {
            let value = self
                .scores
                .get(&metric)
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
            rows.push([metric.label().to_string(), value]);
        }
        rows
    }
}

/// Renders rows as a grid table; the first row is the header.
fn grid_table(rows: &[[String; 2]]) -> String {
    let widths = [0, 1].map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0));
    let rule = |fill: char| {
        let mut line = String::from("+");
        for w in widths {
            line.extend(std::iter::repeat_n(fill, w + 2));
            line.push('+');
        }
        line
    };

    let mut out = vec![rule('-')];
    for (i, row) in rows.iter().enumerate() {
        out.push(format!(
            "| {:<w0$} | {:<w1$} |",
            row[0],
            row[1],
            w0 = widths[0],
            w1 = widths[1]
        ));
        out.push(rule(if i == 0 { '=' } else { '-' }));
    }
    out.join("\n")
}

/// Formats one report block.
pub fn format_report(device: &str, at: &DateTime<Local>, entry: &ReportEntry<'_>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\n{device} Evaluation Results - {}\n{rule}\n{}\n\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        grid_table(&entry.rows())
    )
}

/// Appends a report block to `path`, creating the file if needed.
pub fn append_report(path: &Path, device: &str, entry: &ReportEntry<'_>) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(format_report(device, &Local::now(), entry).as_bytes())
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

/// Precomputed no-reference scores keyed by candidate file name.
///
/// File format: `{ "render.png": { "NIQE": 3.1, "BRISQUE": 20.4 } }`.
#[derive(Debug, Default)]
pub struct ScoreFile {
    by_name: BTreeMap<String, QualityScores>,
}

impl ScoreFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening scores {}", path.display()))?;
        let raw: BTreeMap<String, BTreeMap<String, f64>> = serde_json::from_reader(file)
            .with_context(|| format!("parsing scores {}", path.display()))?;
        Self::from_raw(raw).with_context(|| format!("reading scores {}", path.display()))
    }

    fn from_raw(raw: BTreeMap<String, BTreeMap<String, f64>>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for (name, metrics) in raw {
            let mut scores = QualityScores::new();
            for (label, value) in metrics {
                let metric: MetricName = label.parse().map_err(anyhow::Error::msg)?;
                scores.insert(metric, value);
            }
            by_name.insert(name, scores);
        }
        Ok(Self { by_name })
    }

    /// Scores for the candidate at `path`, looked up by file name. Empty if
    /// the file lists nothing for it.
    pub fn for_candidate(&self, path: &Path) -> QualityScores {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.by_name.get(n))
            .cloned()
            .unwrap_or_default()
    }
}
