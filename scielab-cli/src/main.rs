//! scielab CLI - display-aware perceptual color difference
//!
//! Compare rendered images against a reference as seen on a given screen.

mod config;
mod report;
mod visualize;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use scielab::{
    ColorDifference, DeltaE, DisplayGeometry, Img, ImgVec, NoQualityMetrics, QualityMetrics,
    QualityScores, RGB, RGB8, ScielabParams, ScielabReference, graininess,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ScielabConfig, load_config};
use crate::report::{ReportEntry, ScoreFile, append_report, ensure_output_dir, report_path};
use crate::visualize::save_color_difference_maps;

/// S-CIELAB perceptual color difference
///
/// Filters both images for the contrast sensitivity of the eye at the given
/// screen size and viewing distance, then measures the CIELAB difference per
/// pixel. Lower is better; 0 means no visible difference.
///
/// Rough interpretation of the average difference:
///   < 1  - Not perceptible
///   1-2  - Perceptible on close inspection
///   2-10 - Perceptible at a glance
///   > 10 - Colors clearly differ
#[derive(Parser, Debug)]
#[command(name = "scielab")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare a render against a reference on a 14\" 3000x2000 laptop:
        scielab --screen-width 3000 --screen-height 2000 --diagonal 14 ref.png render.png

    Several renders, with a report and difference maps:
        scielab --report-dir logs --device Laptop --diffmap-dir maps ref.png a.png b.png

    CI mode - fail if the average difference exceeds a threshold:
        scielab --max-diff 2.0 ref.png render.png

    Settings from a JSON file, JSON output:
        scielab --config display.json --json ref.png render.png

EXIT CODES:
    0 - Success (within threshold if --max-diff specified)
    1 - Average difference exceeded threshold (--max-diff)
    2 - Error (file not found, invalid image, size mismatch, etc.)")]
struct Cli {
    /// Reference image
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Images to compare against the reference
    #[arg(value_name = "CANDIDATE", required = true)]
    candidates: Vec<PathBuf>,

    /// Horizontal screen resolution in pixels [default: 1920]
    #[arg(long, value_name = "PIXELS")]
    screen_width: Option<usize>,

    /// Vertical screen resolution in pixels [default: 1080]
    #[arg(long, value_name = "PIXELS")]
    screen_height: Option<usize>,

    /// Screen diagonal in inches [default: 15.6]
    #[arg(long, value_name = "INCHES")]
    diagonal: Option<f64>,

    /// Viewing distance in inches [default: 18]
    #[arg(long, value_name = "INCHES")]
    viewing_distance: Option<f64>,

    /// Per-pixel color difference formula [default: cie76]
    #[arg(long, value_enum)]
    delta_e: Option<DeltaEArg>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Append an evaluation report per candidate to a timestamped file here
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Device name used in report file names and headers [default: device]
    #[arg(long, value_name = "NAME")]
    device: Option<String>,

    /// JSON file with precomputed NIQE/PIQE/BRISQUE/NIMA/PAQ2PIQ scores per candidate
    #[arg(long, value_name = "FILE")]
    scores: Option<PathBuf>,

    /// Write colorized difference maps (color_diff_N.png) here
    #[arg(long, value_name = "DIR")]
    diffmap_dir: Option<PathBuf>,

    /// Maximum acceptable average difference (exit code 1 if exceeded)
    #[arg(long, value_name = "DIFF")]
    max_diff: Option<f64>,

    /// Log level on stderr: error, warn, info, debug, trace [default: warn]
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per candidate
    Text,
    /// JSON document with all results
    Json,
    /// Minimal - just the average difference per candidate
    Score,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DeltaEArg {
    /// CIE 1976 Euclidean distance
    Cie76,
    /// CIEDE2000
    Ciede2000,
}

impl From<DeltaEArg> for DeltaE {
    fn from(arg: DeltaEArg) -> Self {
        match arg {
            DeltaEArg::Cie76 => DeltaE::Cie76,
            DeltaEArg::Ciede2000 => DeltaE::Ciede2000,
        }
    }
}

/// Command line merged over the config file.
#[derive(Debug)]
struct Settings {
    params: ScielabParams,
    device: String,
    report_dir: Option<PathBuf>,
    diffmap_dir: Option<PathBuf>,
    scores: Option<PathBuf>,
    max_diff: Option<f64>,
    log_level: String,
}

impl Settings {
    fn resolve(cli: &Cli, cfg: ScielabConfig) -> Result<Self> {
        let defaults = DisplayGeometry::default();
        let display = DisplayGeometry::new(
            cli.screen_width.or(cfg.screen_width).unwrap_or(defaults.width_px()),
            cli.screen_height.or(cfg.screen_height).unwrap_or(defaults.height_px()),
            cli.diagonal.or(cfg.diagonal).unwrap_or(defaults.diagonal_inches()),
        )?;

        let delta_e = match (cli.delta_e, cfg.delta_e.as_deref()) {
            (Some(arg), _) => arg,
            (None, Some(name)) => DeltaEArg::from_str(name, true)
                .map_err(|_| anyhow!("invalid delta_e '{name}' in config"))?,
            (None, None) => DeltaEArg::Cie76,
        };

        let mut params = ScielabParams::new()
            .with_display(display)
            .with_delta_e(delta_e.into());
        if let Some(distance) = cli.viewing_distance.or(cfg.viewing_distance) {
            params = params.with_viewing_distance(distance);
        }
        params.validate()?;

        Ok(Self {
            params,
            device: cli.device.clone().or(cfg.device).unwrap_or_else(|| "device".to_string()),
            report_dir: cli.report_dir.clone().or(cfg.report_dir),
            diffmap_dir: cli.diffmap_dir.clone().or(cfg.diffmap_dir),
            scores: cli.scores.clone().or(cfg.scores),
            max_diff: cli.max_diff.or(cfg.max_diff),
            log_level: cli.log_level.clone().or(cfg.log_level).unwrap_or_else(|| "warn".to_string()),
        })
    }
}

#[derive(Serialize)]
struct JsonOutput {
    reference: String,
    display: JsonDisplay,
    pixels_per_degree: f64,
    delta_e: &'static str,
    results: Vec<JsonResult>,
}

#[derive(Serialize)]
struct JsonDisplay {
    width_px: usize,
    height_px: usize,
    diagonal_inches: f64,
    viewing_distance_inches: f64,
}

#[derive(Serialize)]
struct JsonResult {
    candidate: String,
    width: usize,
    height: usize,
    avg_diff: f64,
    max_diff: f64,
    /// `[row, column]`
    max_pos: [usize; 2],
    graininess: f64,
    scores: std::collections::BTreeMap<&'static str, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_exceeded: Option<bool>,
}

struct CandidateResult {
    path: PathBuf,
    difference: ColorDifference,
    graininess: f64,
    scores: QualityScores,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up color output
    setup_colors(&cli);

    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            ExitCode::from(2)
        }
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| anyhow!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .map_err(|e| anyhow!("initializing logging: {e}"))
}

/// Runs every comparison. Returns whether any candidate exceeded `--max-diff`.
fn run(cli: &Cli) -> Result<bool> {
    let cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScielabConfig::default(),
    };
    let settings = Settings::resolve(cli, cfg)?;
    init_logging(&settings.log_level)?;

    let ppd = settings.params.pixels_per_degree()?;
    info!(
        pixels_per_degree = ppd,
        delta_e = ?settings.params.delta_e(),
        "display configured"
    );

    let score_file = settings
        .scores
        .as_deref()
        .map(ScoreFile::load)
        .transpose()?
        .unwrap_or_default();

    let (_, reference) = load_image(&cli.reference)?;
    let reference = ScielabReference::new(reference.as_ref(), &settings.params)
        .with_context(|| format!("processing '{}'", cli.reference.display()))?;
    debug!(
        width = reference.width(),
        height = reference.height(),
        "reference filtered"
    );

    let mut results = Vec::with_capacity(cli.candidates.len());
    for path in &cli.candidates {
        results.push(compare_candidate(&reference, path, &score_file)?);
    }

    if let Some(dir) = &settings.report_dir {
        ensure_output_dir(dir)?;
        let path = report_path(dir, &settings.device, &Local::now());
        for r in &results {
            append_report(
                &path,
                &settings.device,
                &ReportEntry {
                    graininess: r.graininess,
                    difference: &r.difference,
                    scores: &r.scores,
                },
            )?;
        }
        info!(path = %path.display(), "report written");
    }

    if let Some(dir) = &settings.diffmap_dir {
        ensure_output_dir(dir)?;
        let maps: Vec<ImgVec<f32>> = results.iter().map(|r| r.difference.diffmap.clone()).collect();
        let saved = save_color_difference_maps(&maps, dir)?;
        info!(count = saved.len(), dir = %dir.display(), "difference maps saved");
    }

    output_results(cli, &settings, ppd, &results)?;

    Ok(settings
        .max_diff
        .is_some_and(|max| results.iter().any(|r| r.difference.avg_diff > max)))
}

fn compare_candidate(
    reference: &ScielabReference,
    path: &Path,
    score_file: &ScoreFile,
) -> Result<CandidateResult> {
    let (rgb8, rgbf) = load_image(path)?;
    let difference = reference
        .compare(rgbf.as_ref())
        .with_context(|| format!("comparing '{}'", path.display()))?;

    let fixed = score_file.for_candidate(path);
    let metrics: &dyn QualityMetrics = if fixed.is_empty() {
        &NoQualityMetrics
    } else {
        &fixed
    };
    let scores = metrics.compute(rgb8.as_ref());

    let result = CandidateResult {
        path: path.to_path_buf(),
        graininess: graininess(rgb8.as_ref()),
        difference,
        scores,
    };
    debug!(
        candidate = %path.display(),
        avg_diff = result.difference.avg_diff,
        max_diff = result.difference.max_diff,
        "compared"
    );
    Ok(result)
}

/// Decodes an image as 8-bit and as float device RGB.
fn load_image(path: &Path) -> Result<(ImgVec<RGB8>, ImgVec<RGB<f32>>)> {
    let img = image::open(path).with_context(|| format!("failed to load '{}'", path.display()))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let rgb8 = img
        .to_rgb8()
        .pixels()
        .map(|p| RGB8::new(p[0], p[1], p[2]))
        .collect();
    let rgbf = img
        .to_rgb32f()
        .pixels()
        .map(|p| RGB::new(p[0], p[1], p[2]))
        .collect();
    Ok((Img::new(rgb8, width, height), Img::new(rgbf, width, height)))
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn output_results(
    cli: &Cli,
    settings: &Settings,
    ppd: f64,
    results: &[CandidateResult],
) -> Result<()> {
    let format = if cli.json { OutputFormat::Json } else { cli.format };
    let exceeded = |r: &CandidateResult| settings.max_diff.map(|max| r.difference.avg_diff > max);

    match format {
        OutputFormat::Score => {
            for r in results {
                println!("{:.6}", r.difference.avg_diff);
            }
        }
        OutputFormat::Text => {
            let name_width = results
                .iter()
                .map(|r| display_name(&r.path).len())
                .max()
                .unwrap_or(20);
            for r in results {
                let d = &r.difference;
                let avg = format!("{:.3}", d.avg_diff);
                let avg = match exceeded(r) {
                    Some(true) => avg.red().bold(),
                    Some(false) => avg.green(),
                    None => avg.normal(),
                };
                let (row, col) = d.max_pos;
                println!(
                    "{:width$}  avg {}  max {:.3} at ({row}, {col})  graininess {:.3}",
                    display_name(&r.path),
                    avg,
                    d.max_diff,
                    r.graininess,
                    width = name_width
                );
                if !r.scores.is_empty() {
                    let scores: Vec<String> = r
                        .scores
                        .iter()
                        .map(|(m, v)| format!("{m} {v:.3}"))
                        .collect();
                    println!("{:width$}  {}", "", scores.join("  ").dimmed(), width = name_width);
                }
            }
            if let Some(max) = settings.max_diff {
                let failed = results.iter().filter(|&r| exceeded(r) == Some(true)).count();
                if failed > 0 {
                    println!(
                        "{}",
                        format!("Threshold exceeded by {failed} of {}: avg > {max}", results.len())
                            .red()
                            .bold()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let params = &settings.params;
            let output = JsonOutput {
                reference: display_name(&cli.reference),
                display: JsonDisplay {
                    width_px: params.display().width_px(),
                    height_px: params.display().height_px(),
                    diagonal_inches: params.display().diagonal_inches(),
                    viewing_distance_inches: params.viewing_distance_inches(),
                },
                pixels_per_degree: ppd,
                delta_e: match params.delta_e() {
                    DeltaE::Ciede2000 => "ciede2000",
                    _ => "cie76",
                },
                results: results
                    .iter()
                    .map(|r| JsonResult {
                        candidate: display_name(&r.path),
                        width: r.difference.diffmap.width(),
                        height: r.difference.diffmap.height(),
                        avg_diff: r.difference.avg_diff,
                        max_diff: r.difference.max_diff,
                        max_pos: [r.difference.max_pos.0, r.difference.max_pos.1],
                        graininess: r.graininess,
                        scores: r.scores.iter().map(|(m, v)| (m.label(), *v)).collect(),
                        threshold_exceeded: exceeded(r),
                    })
                    .collect(),
            };
            let json =
                serde_json::to_string_pretty(&output).context("failed to serialize JSON")?;
            println!("{json}");
        }
    }

    // Flush stdout
    io::stdout().flush().context("flushing stdout")?;
    Ok(())
}
