//! zonetrack CLI
//!
//! Zone-relative trajectory feature extraction and labelling.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zonetrack::{
    audit::create_shared_log_with_persistence,
    config::Config,
    core::{compass_bearing_from_slices, extract, make_label, summarize},
    data::{read_column, read_data, read_labels, read_records, write_features, write_labeled, Mode},
    training::check_scores,
    zone_description, VERSION,
};

#[derive(Parser)]
#[command(name = "zonetrack")]
#[command(version = VERSION)]
#[command(about = "Zone-relative trajectory features and labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features from data_<mode>.csv
    Extract {
        /// Directory holding the input tables (defaults to the configured data path)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Which table to read (train or test)
        #[arg(long, default_value = "train")]
        mode: Mode,

        /// Entry point only; skip the features that need an exit point
        #[arg(long)]
        single: bool,

        /// Output CSV (defaults to <output_path>/features_<mode>.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Extract features and attach labels from a last-trajectory table
    Label {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long, default_value = "train")]
        mode: Mode,

        /// CSV of last trajectories, row-aligned with the input table
        #[arg(long)]
        last: PathBuf,

        #[arg(long)]
        single: bool,

        /// Output CSV (defaults to <output_path>/labeled_<mode>.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print descriptive statistics of the extracted features
    Summary {
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long, default_value = "train")]
        mode: Mode,

        #[arg(long)]
        single: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compass bearing between two coordinate pairs
    Bearing {
        /// Two numbers: x y of the start point
        #[arg(num_args = 2, allow_negative_numbers = true, required = true)]
        from: Vec<f64>,

        /// Two numbers: x y of the end point
        #[arg(long, num_args = 2, allow_negative_numbers = true, required = true)]
        to: Vec<f64>,
    },

    /// Check recorded validation scores against the stopping thresholds
    Check {
        /// Labelled CSV with a train_label column
        #[arg(long)]
        labels: PathBuf,

        /// CSV of model scores, row-aligned with the labels
        #[arg(long)]
        scores: PathBuf,

        /// Score column name
        #[arg(long, default_value = "score")]
        column: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the target zone geometry
    Zone,

    /// Show processing statistics
    Status {
        /// Clear the persisted counters
        #[arg(long)]
        reset: bool,
    },

    /// Show or update configuration
    Config {
        #[arg(long)]
        data_path: Option<PathBuf>,

        #[arg(long)]
        output_path: Option<PathBuf>,

        /// Accuracy at which training stops, in (0, 1]
        #[arg(long)]
        accuracy_threshold: Option<f64>,

        /// Validation F1 at which training stops, in (0, 1]
        #[arg(long)]
        f1_threshold: Option<f64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            data_dir,
            mode,
            single,
            output,
        } => cmd_extract(data_dir, mode, single, output),
        Commands::Label {
            data_dir,
            mode,
            last,
            single,
            output,
        } => cmd_label(data_dir, mode, &last, single, output),
        Commands::Summary {
            data_dir,
            mode,
            single,
            json,
        } => cmd_summary(data_dir, mode, single, json),
        Commands::Bearing { from, to } => cmd_bearing(&from, &to),
        Commands::Check {
            labels,
            scores,
            column,
            json,
        } => cmd_check(&labels, &scores, &column, json),
        Commands::Zone => {
            println!("{}", zone_description());
            Ok(())
        }
        Commands::Status { reset } => cmd_status(reset),
        Commands::Config {
            data_path,
            output_path,
            accuracy_threshold,
            f1_threshold,
        } => cmd_config(data_path, output_path, accuracy_threshold, f1_threshold),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("could not load configuration, using defaults: {e}");
            Config::default()
        }
    }
}

fn cmd_extract(
    data_dir: Option<PathBuf>,
    mode: Mode,
    single: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config();
    let log = create_shared_log_with_persistence(config.processing_log_path());
    let data_dir = data_dir.unwrap_or_else(|| config.data_path.clone());

    let records = read_data(&data_dir, mode)
        .with_context(|| format!("reading {mode} data from {}", data_dir.display()))?;
    log.record_loaded(records.len() as u64);

    let rows = extract(&records, single)?;
    let inside = rows.iter().filter(|r| r.entry_inside == 1).count();
    log.record_extracted(rows.len() as u64, inside as u64);

    if let Err(e) = config.ensure_directories() {
        tracing::warn!("could not create working directories: {e}");
    }
    let output = output.unwrap_or_else(|| config.output_path.join(format!("features_{mode}.csv")));
    write_features(create_output(&output)?, &rows)?;

    println!(
        "Extracted {} rows ({} entering inside the zone) to {:?}",
        rows.len(),
        inside,
        output
    );

    if let Err(e) = log.save() {
        tracing::warn!("could not save processing log: {e}");
    }
    Ok(())
}

fn cmd_label(
    data_dir: Option<PathBuf>,
    mode: Mode,
    last: &Path,
    single: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config();
    let log = create_shared_log_with_persistence(config.processing_log_path());
    let data_dir = data_dir.unwrap_or_else(|| config.data_path.clone());

    let records = read_data(&data_dir, mode)
        .with_context(|| format!("reading {mode} data from {}", data_dir.display()))?;
    let last_file =
        File::open(last).with_context(|| format!("opening {}", last.display()))?;
    let last_trajectories =
        read_records(last_file).with_context(|| format!("reading {}", last.display()))?;
    log.record_loaded((records.len() + last_trajectories.len()) as u64);

    let rows = extract(&records, single)?;
    let inside = rows.iter().filter(|r| r.entry_inside == 1).count();
    log.record_extracted(rows.len() as u64, inside as u64);

    let (labeled, labels) = make_label(rows, &last_trajectories)?;
    log.record_labels(&labels);

    if let Err(e) = config.ensure_directories() {
        tracing::warn!("could not create working directories: {e}");
    }
    let output = output.unwrap_or_else(|| config.output_path.join(format!("labeled_{mode}.csv")));
    write_labeled(create_output(&output)?, &labeled)?;

    let positive = labels.iter().filter(|&&l| l == 1).count();
    println!(
        "Labelled {} rows ({} ending inside the zone) to {:?}",
        labels.len(),
        positive,
        output
    );

    if let Err(e) = log.save() {
        tracing::warn!("could not save processing log: {e}");
    }
    Ok(())
}

fn cmd_summary(data_dir: Option<PathBuf>, mode: Mode, single: bool, json: bool) -> Result<()> {
    let config = load_config();
    let data_dir = data_dir.unwrap_or_else(|| config.data_path.clone());

    let records = read_data(&data_dir, mode)
        .with_context(|| format!("reading {mode} data from {}", data_dir.display()))?;
    let summary = summarize(&extract(&records, single)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

fn cmd_bearing(from: &[f64], to: &[f64]) -> Result<()> {
    let bearing = compass_bearing_from_slices(from, to)?;
    println!("{bearing}");
    Ok(())
}

fn cmd_check(labels: &Path, scores: &Path, column: &str, json: bool) -> Result<()> {
    let config = load_config();

    let file = File::open(labels).with_context(|| format!("opening {}", labels.display()))?;
    let labels = read_labels(file).with_context(|| format!("reading {}", labels.display()))?;
    let file = File::open(scores).with_context(|| format!("opening {}", scores.display()))?;
    let scores =
        read_column(file, column).with_context(|| format!("reading {}", scores.display()))?;

    let check = check_scores(&labels, scores, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&check)?);
        return Ok(());
    }

    println!("Accuracy:  {:.6}", check.accuracy);
    println!("Precision: {:.6}", check.precision);
    println!("Recall:    {:.6}", check.recall);
    println!("F1:        {:.6}", check.f1);
    println!();
    println!(
        "Accuracy >= {}: {}",
        config.accuracy_threshold,
        if check.accuracy_stop { "stop" } else { "continue" }
    );
    println!(
        "F1 >= {}: {}",
        config.f1_threshold,
        if check.f1_stop { "stop" } else { "continue" }
    );
    Ok(())
}

fn cmd_status(reset: bool) -> Result<()> {
    let config = load_config();
    let path = config.processing_log_path();

    println!("zonetrack v{VERSION}");
    println!();
    println!("Data path: {:?}", config.data_path);
    println!("Output path: {:?}", config.output_path);
    println!();

    if !path.exists() {
        println!("No previous processing data found.");
        return Ok(());
    }

    let log = create_shared_log_with_persistence(path);
    if reset {
        log.reset();
        log.save().context("saving processing log")?;
        println!("Processing statistics cleared.");
        return Ok(());
    }
    println!("{}", log.summary());
    Ok(())
}

fn cmd_config(
    data_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    accuracy_threshold: Option<f64>,
    f1_threshold: Option<f64>,
) -> Result<()> {
    let mut config = load_config();
    let changed = data_path.is_some()
        || output_path.is_some()
        || accuracy_threshold.is_some()
        || f1_threshold.is_some();

    if let Some(path) = data_path {
        config.data_path = path;
    }
    if let Some(path) = output_path {
        config.output_path = path;
    }
    if let Some(threshold) = accuracy_threshold {
        config.accuracy_threshold = threshold;
    }
    if let Some(threshold) = f1_threshold {
        config.f1_threshold = threshold;
    }

    if changed {
        config.validate()?;
        config.save().context("saving configuration")?;
        println!("Configuration saved to {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}
