use anyhow::Context;
use attack_insight_engine::arrow_handler::write_scored_ipc;
use attack_insight_engine::{
    Column, Dataset, DatasetSummary, Pipeline, PipelineConfig, PipelineReport, Result,
    Statistics,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "attack-insight")]
#[command(author = "Hummer Team")]
#[command(version = "0.1.0")]
#[command(about = "Attack-type classification and anomaly scoring for network event logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, encode, evaluate a classifier and score anomalies
    Run {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// JSON pipeline configuration (defaults apply to missing keys)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for the split and the forest
        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for testing
        #[arg(long)]
        test_ratio: Option<f64>,

        /// Expected share of anomalous rows
        #[arg(long)]
        contamination: Option<f64>,

        /// Depth limit for the decision tree
        #[arg(long)]
        max_depth: Option<usize>,

        /// Write the scored matrix as an Arrow IPC stream
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show row counts, missing cells and the class balance
    Inspect {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Numeric column to analyze, by header (optional)
        #[arg(short = 'a', long)]
        analyze: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attack_insight_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            config,
            seed,
            test_ratio,
            contamination,
            max_depth,
            export,
            json,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_path(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => PipelineConfig::new(),
            };
            if let Some(seed) = seed {
                pipeline_config = pipeline_config.with_seed(seed);
            }
            if let Some(ratio) = test_ratio {
                pipeline_config = pipeline_config.with_test_ratio(ratio);
            }
            if let Some(contamination) = contamination {
                pipeline_config = pipeline_config.with_contamination(contamination);
            }
            if let Some(depth) = max_depth {
                pipeline_config = pipeline_config.with_max_depth(depth);
            }

            let pipeline = Pipeline::new(pipeline_config)?;
            let report = pipeline
                .run_path(&file)
                .with_context(|| format!("running pipeline on {}", file.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if let Some(path) = export {
                write_scored_ipc(&path, &report.scored)
                    .with_context(|| format!("exporting to {}", path.display()))?;
                if !json {
                    println!("\nScored matrix written to {}", path.display());
                }
            }
        }

        Commands::Inspect { file, analyze } => {
            let dataset = load(&file)?;
            let pipeline = Pipeline::new(PipelineConfig::new())?;
            print_summary(&pipeline.inspect(&dataset));

            if let Some(header) = analyze {
                let column: Column = header.parse()?;
                if let Some(stats) = Statistics::compute(&dataset, column) {
                    print_stats(&stats);
                } else {
                    println!("Could not compute statistics for column '{}'", column);
                }
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Dataset> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    Dataset::from_path(name, path).with_context(|| format!("loading {}", path.display()))
}

fn print_report(report: &PipelineReport) {
    println!(
        "Rows: {} loaded, {} kept after dropping incomplete rows",
        report.cleaning.rows_before, report.cleaning.rows_after
    );
    println!("Features: {}", report.feature_count);
    println!("Classes: {}", report.classes.join(", "));

    println!("\n=== Classification report ===");
    println!("{}", report.report);
    println!("\n=== Confusion matrix (rows = true, columns = predicted) ===");
    println!("{}", report.report.confusion);

    if !report.top_features.is_empty() {
        println!("\n=== Top features ===");
        for (name, weight) in &report.top_features {
            println!("{:<40} {:.4}", name, weight);
        }
    }

    println!("\n=== Anomaly scoring ===");
    println!(
        "Outliers: {} of {} rows",
        report.outlier_count,
        report.scored.nrows()
    );
}

fn print_summary(summary: &DatasetSummary) {
    println!(
        "Loaded dataset '{}' with {} records",
        summary.name, summary.record_count
    );
    println!(
        "Complete records: {} ({} dropped)",
        summary.cleaning.rows_after,
        summary.cleaning.rows_dropped()
    );

    if !summary.cleaning.missing_by_column.is_empty() {
        println!("\n=== Missing cells ===");
        for (column, count) in &summary.cleaning.missing_by_column {
            println!("{:<25} {}", column.header(), count);
        }
    }

    println!("\n=== Class distribution ===");
    println!("{:<25} {:>8} {:>8}", "class", "before", "after");
    for (class, before) in &summary.class_distribution_before.counts {
        println!(
            "{:<25} {:>8} {:>8}",
            class,
            before,
            summary.class_distribution_after.count(class)
        );
    }
}

fn print_stats(stats: &Statistics) {
    println!("\n=== Statistics for '{}' ===", stats.column);
    println!("Count: {}", stats.count);
    println!("Sum:   {:.2}", stats.sum);
    println!("Mean:  {:.2}", stats.mean);
    println!("Min:   {:.2}", stats.min);
    println!("Max:   {:.2}", stats.max);
}
