//! afrbkit - G-code toolpath reconstruction CLI
//!
//! Streams a G-code file through the motion tracker and prints or exports the
//! reconstructed toolpath.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use afrbkit::toolpath::{
    batch_points_for_spline, convert_wheel_centers, default_csv_path, evaluate_windows,
    save_extrusion_csv, GcodeFileReader, PointCollector, RawToolpath, DEFAULT_CENTERS_OUTPUT,
};
use afrbkit::{init_logging, Config};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

/// Default cap for `csv` exports
const CSV_DEFAULT_MAX_POINTS: usize = 2000;

/// Points listed after a sparse summary
const PREVIEW_POINTS: usize = 10;

#[derive(Parser)]
#[command(name = "afrbkit")]
#[command(about = "Reconstruct and resample toolpaths from G-code", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RawFormat {
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every position sample in file order
    Raw {
        /// G-code file
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = RawFormat::Text)]
        format: RawFormat,
    },
    /// Collect a resampled XY path capped to a point budget
    Sparse {
        /// G-code file
        file: PathBuf,
        #[arg(long)]
        max_points: Option<usize>,
    },
    /// Stream spline batches and summarise each one
    Batches {
        /// G-code file
        file: PathBuf,
        #[arg(long)]
        batch_size: Option<usize>,
        /// Corner threshold in degrees
        #[arg(long)]
        angle_threshold: Option<f64>,
        #[arg(long)]
        corner_density: Option<usize>,
        /// Maximum spacing on straight runs (mm)
        #[arg(long)]
        straight_sample_dist: Option<f64>,
    },
    /// Export x,y,extruding as CSV
    Csv {
        /// G-code file
        file: PathBuf,
        #[arg(long, default_value_t = CSV_DEFAULT_MAX_POINTS)]
        max_points: usize,
        /// Output file (default: <file>_extrude.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare heading smoothness across moving-average windows
    Headings {
        /// G-code file
        file: PathBuf,
        #[arg(long, num_args = 1..)]
        windows: Option<Vec<usize>>,
        #[arg(long)]
        min_frames: Option<usize>,
        #[arg(long)]
        max_frames: Option<usize>,
    },
    /// Convert a wheel-center CSV into a G-code program
    CentersToGcode {
        /// CSV with center_x, center_y[, center_z, angle_deg] columns
        csv: PathBuf,
        /// Output G-code file
        output: Option<PathBuf>,
    },
    /// Check a G-code file and count its motion commands
    Validate {
        /// G-code file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Raw { file, format } => {
            let collector = PointCollector::new(config.resample, config.collect);
            let raw = collector
                .collect_raw(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            print_raw(&raw, format)?;
        }
        Commands::Sparse { file, max_points } => {
            if let Some(max_points) = max_points {
                config.collect.max_points = max_points;
            }
            config.validate()?;
            show_sparse(&file, &config)?;
        }
        Commands::Batches {
            file,
            batch_size,
            angle_threshold,
            corner_density,
            straight_sample_dist,
        } => {
            let resample = &mut config.resample;
            if let Some(v) = batch_size {
                resample.batch_size = v;
            }
            if let Some(v) = angle_threshold {
                resample.angle_threshold_deg = v;
            }
            if let Some(v) = corner_density {
                resample.corner_density = v;
            }
            if let Some(v) = straight_sample_dist {
                resample.straight_sample_dist = v;
            }
            config.validate()?;
            show_batches(&file, &config)?;
        }
        Commands::Csv {
            file,
            max_points,
            output,
        } => {
            let output = output.unwrap_or_else(|| default_csv_path(&file));
            let raw = PointCollector::default()
                .collect_raw(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let written = save_extrusion_csv(&output, &raw, Some(max_points))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} points to {}", written, output.display());
        }
        Commands::Headings {
            file,
            windows,
            min_frames,
            max_frames,
        } => {
            let heading = &mut config.heading;
            if let Some(v) = windows {
                heading.windows = v;
            }
            if let Some(v) = min_frames {
                heading.min_frames = v;
            }
            if let Some(v) = max_frames {
                heading.max_frames = v;
            }
            config.validate()?;
            show_headings(&file, &config)?;
        }
        Commands::CentersToGcode { csv, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CENTERS_OUTPUT));
            convert_wheel_centers(&csv, &output)
                .with_context(|| format!("Failed to convert {}", csv.display()))?;
            println!("Wrote G-code to {}", output.display());
        }
        Commands::Validate { file } => {
            validate_file(&file)?;
        }
    }

    Ok(())
}

fn print_raw(raw: &RawToolpath, format: RawFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match format {
        RawFormat::Json => {
            serde_json::to_writer_pretty(&mut out, raw)?;
            writeln!(out)?;
        }
        RawFormat::Csv => {
            writeln!(out, "x,y,z,extruding")?;
            for s in raw.samples() {
                writeln!(out, "{},{},{},{}", s.x, s.y, s.z, s.extruding_flag())?;
            }
        }
        RawFormat::Text => {
            for s in raw.samples() {
                writeln!(out, "{:.4}\t{:.4}\t{:.4}\t{}", s.x, s.y, s.z, s.extruding_flag())?;
            }
        }
    }
    out.flush()?;

    let bounds = raw.bounds();
    if bounds.is_valid() {
        info!(
            "{} samples ({} extruding), extent {:.2} x {:.2} x {:.2} mm",
            raw.len(),
            raw.extruding_count(),
            bounds.width(),
            bounds.depth(),
            bounds.height()
        );
    } else {
        info!("No samples");
    }
    Ok(())
}

fn show_sparse(file: &Path, config: &Config) -> Result<()> {
    let collector = PointCollector::new(config.resample, config.collect);
    let sparse = collector
        .collect_sparse(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    println!(
        "Collected {} points (capped at {}) from {}",
        sparse.len(),
        collector.max_points(),
        file.display()
    );
    if sparse.is_empty() {
        println!("No points parsed from file!");
        return Ok(());
    }
    println!("First {} points:", PREVIEW_POINTS.min(sparse.len()));
    for p in sparse.points().take(PREVIEW_POINTS) {
        println!("  ({}, {})", p.x, p.y);
    }
    Ok(())
}

fn show_batches(file: &Path, config: &Config) -> Result<()> {
    let batches = batch_points_for_spline(file, &config.resample)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let mut total = 0usize;
    let mut count = 0usize;
    for batch in batches {
        let batch = batch.with_context(|| format!("Failed while reading {}", file.display()))?;
        if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
            println!(
                "batch {:4}: {:5} points  ({:.3}, {:.3}) -> ({:.3}, {:.3})",
                count,
                batch.len(),
                first.x,
                first.y,
                last.x,
                last.y
            );
        }
        total += batch.len();
        count += 1;
    }
    println!("{} batches, {} points", count, total);
    Ok(())
}

fn show_headings(file: &Path, config: &Config) -> Result<()> {
    let raw = PointCollector::default()
        .collect_raw(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("Loaded {} points from {}", raw.len(), file.display());

    for report in evaluate_windows(&raw.x, &raw.y, &config.heading) {
        println!(
            "window={:2}: raw_max={:.2} deg, raw_median={:.2} deg, raw_mean={:.2} deg | per-frame max={:.2} deg, per-frame mean={:.2} deg",
            report.window,
            report.stats.max_deg,
            report.stats.median_deg,
            report.stats.mean_deg,
            report.frame_max_deg,
            report.frame_mean_deg
        );
    }
    Ok(())
}

fn validate_file(file: &Path) -> Result<()> {
    let reader = GcodeFileReader::new(file)?;
    let validation = reader.validate()?;

    println!("{} ({})", reader.path().display(), reader.formatted_size());
    println!("  lines:   {}", validation.total_lines);
    println!("  rapid:   {}", validation.rapid_moves);
    println!("  linear:  {}", validation.linear_moves);
    println!("  arc:     {}", validation.arc_moves);
    for warning in &validation.warnings {
        println!("  warning: {}", warning);
    }
    for error in &validation.errors {
        println!("  error:   {}", error);
    }

    if !validation.is_valid {
        bail!("{} failed validation", file.display());
    }
    Ok(())
}
