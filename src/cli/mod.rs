//! flatprice CLI Module
//!
//! Command-line interface for training, prediction and listing exploration.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::explore::{self, Amenity, DashboardReport, Histogram, ListingFilter};
use crate::export::ModelArtifact;
use crate::schema;
use crate::training::{RegressionMetrics, TrainEngine};
use crate::utils::{DataSaver, ListingLoader};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn metric_rows(label: &str, metrics: &RegressionMetrics) {
    println!(
        "  {:<12} {:>8} {} {}  {} {}",
        muted(label),
        metrics.n_samples,
        muted("MSE"),
        format!("{:.4e}", metrics.mse).white().bold(),
        muted("R²"),
        format!("{:.4}", metrics.r2).white().bold()
    );
}

fn histogram_rows(title: &str, hist: &Histogram) {
    println!();
    println!("  {}", title.white());
    let peak = hist.counts.iter().copied().max().unwrap_or(0).max(1);
    for (i, count) in hist.counts.iter().enumerate() {
        let bar = "█".repeat(count * 40 / peak);
        println!(
            "  {:>14.1} {:>6} {}",
            hist.edges[i],
            count,
            accent(&bar)
        );
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "flatprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Apartment price modelling and listing exploration")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the price model and report validation and test metrics
    Train {
        /// Listings CSV with the full schema
        #[arg(short, long)]
        data: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for the train/validation/test split
        #[arg(long)]
        seed: Option<u64>,

        /// Output model file
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Print a JSON summary instead of the report
        #[arg(long)]
        json: bool,
    },

    /// Predict prices for new listings with a trained model
    Predict {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Listings CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file (CSV)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summaries and distributions for a selection of listings
    Explore {
        /// Listings CSV with the full schema
        #[arg(short, long)]
        data: PathBuf,

        #[arg(long)]
        city: Option<String>,

        /// Building type
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        rooms: Option<i64>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        #[arg(long)]
        min_area: Option<f64>,

        #[arg(long)]
        max_area: Option<f64>,

        /// Only listings with a parking space
        #[arg(long)]
        parking: bool,

        #[arg(long)]
        balcony: bool,

        #[arg(long)]
        elevator: bool,

        #[arg(long)]
        security: bool,

        #[arg(long)]
        storage_room: bool,

        /// Histogram bins
        #[arg(long, default_value = "20")]
        bins: usize,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show column types, null counts and schema coverage of a CSV
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Parsed `explore` flags
pub struct ExploreArgs {
    pub filter: ListingFilter,
    pub bins: usize,
    pub json: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train { data, config, seed, output, json } => {
            cmd_train(&data, config.as_deref(), seed, &output, json)
        }
        Commands::Predict { model, data, output } => {
            cmd_predict(&model, &data, output.as_deref())
        }
        Commands::Explore {
            data,
            city,
            kind,
            rooms,
            min_price,
            max_price,
            min_area,
            max_area,
            parking,
            balcony,
            elevator,
            security,
            storage_room,
            bins,
            json,
        } => {
            let mut filter = ListingFilter::new();
            filter.city = city;
            filter.kind = kind;
            filter.rooms = rooms;
            if min_price.is_some() || max_price.is_some() {
                filter.price = Some((
                    min_price.unwrap_or(f64::NEG_INFINITY),
                    max_price.unwrap_or(f64::INFINITY),
                ));
            }
            if min_area.is_some() || max_area.is_some() {
                filter.area = Some((
                    min_area.unwrap_or(f64::NEG_INFINITY),
                    max_area.unwrap_or(f64::INFINITY),
                ));
            }
            for (wanted, amenity) in [
                (parking, Amenity::ParkingSpace),
                (balcony, Amenity::Balcony),
                (elevator, Amenity::Elevator),
                (security, Amenity::Security),
                (storage_room, Amenity::StorageRoom),
            ] {
                if wanted {
                    filter = filter.require(amenity);
                }
            }
            cmd_explore(&data, ExploreArgs { filter, bins, json })
        }
        Commands::Info { data } => cmd_info(&data),
    }
}

pub fn cmd_train(
    data_path: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
    output: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.validate()?;

    let loader = ListingLoader::new().with_infer_schema_rows(config.infer_schema_rows);

    if json {
        let df = loader.load_for_training(data_path)?;
        let outcome = TrainEngine::new(config).run(&df)?;
        outcome.artifact.save(output)?;
        let summary = serde_json::json!({
            "validation": outcome.validation,
            "test": outcome.test,
            "partition_sizes": outcome.partition_sizes,
            "rows_used": outcome.preparation.rows_out,
            "training_time_secs": outcome.training_time_secs,
            "model": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = loader.load_for_training(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run(&format!("Fitting model (seed {})", config.seed.to_string().cyan()));
    let outcome = TrainEngine::new(config).run(&df)?;
    step_done(&format!("{:.3}s", outcome.training_time_secs));

    step_run("Saving model");
    outcome.artifact.save(output)?;
    step_done(&output.display().to_string());

    let sizes = outcome.partition_sizes;
    println!();
    println!(
        "  {:<12} {}",
        muted("Rows"),
        format!(
            "{} used, {} dropped",
            outcome.preparation.rows_out,
            df.height() - outcome.preparation.rows_out
        )
        .white()
    );
    println!(
        "  {:<12} {}",
        muted("Split"),
        format!("{} / {} / {}", sizes.train, sizes.validation, sizes.test).white()
    );
    println!(
        "  {:<12} {}",
        muted("Features"),
        outcome.artifact.feature_names.len().to_string().white()
    );
    println!();
    metric_rows("Validation", &outcome.validation);
    metric_rows("Test", &outcome.test);
    println!();

    Ok(())
}

pub fn cmd_predict(model_path: &Path, data_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let artifact = ModelArtifact::load(model_path)?;
    step_done(&format!("trained {}", artifact.trained_at.format("%Y-%m-%d %H:%M UTC")));

    step_run("Loading data");
    let df = ListingLoader::new()
        .with_infer_schema_rows(artifact.config.infer_schema_rows)
        .load_for_prediction(data_path)?;
    step_done(&format!("{} rows", df.height()));

    step_run("Scoring");
    let mut predictions = artifact.predict_frame(&df)?;
    step_done(&format!("{} predictions", predictions.height()));

    match output {
        Some(path) => {
            DataSaver::save_csv(&mut predictions, path)?;
            step_ok(&format!("Saved to {}", path.display()));
        }
        None => {
            println!();
            println!("{}", predictions.head(Some(10)));
        }
    }

    println!();
    Ok(())
}

pub fn cmd_explore(data_path: &Path, args: ExploreArgs) -> anyhow::Result<()> {
    let raw = ListingLoader::new().load_for_training(data_path)?;
    let prepared = explore::prepare(&raw)?;
    let report = DashboardReport::build(&prepared, &args.filter, args.bins)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Summary Statistics");
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "n/a".to_string());
    println!("  {:<22} {}", muted("Total listings"), report.summary.total_listings.to_string().white());
    println!("  {:<22} {}", muted("Average size [sqm]"), fmt(report.summary.avg_square_meters).white());
    println!("  {:<22} {}", muted("Average price [PLN]"), fmt(report.summary.avg_price).white());
    println!("  {:<22} {}", muted("Median price [PLN]"), fmt(report.summary.median_price).white());

    section("Distributions");
    histogram_rows("Price [PLN]", &report.price);
    histogram_rows("Area [sqm]", &report.area);
    histogram_rows("Build year", &report.build_year);

    section("Price per sqm by city");
    println!(
        "  {:<14} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
        muted("City"), muted("n"), muted("min"), muted("q1"), muted("median"), muted("q3"), muted("max")
    );
    for spread in &report.price_per_sqm_by_city {
        println!(
            "  {:<14} {:>6} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>8.0}",
            spread.city, spread.count, spread.min, spread.q1, spread.median, spread.q3, spread.max
        );
    }

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = ListingLoader::new().read_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
    println!();

    println!("  {:<22} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(52)));

    for col in df.get_columns() {
        println!(
            "  {:<22} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    match schema::require_columns(&df, &schema::training_columns()) {
        Ok(()) => step_ok("All training columns present"),
        Err(e) => println!("  {} {}", "!".yellow(), e),
    }
    println!();
    Ok(())
}
