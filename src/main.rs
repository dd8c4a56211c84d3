use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shift_claim_analytics::config::{
    self, AnalysisConfig, AnalyzerKind, Artifacts, OutputFormat, SegmentBy,
};
use shift_claim_analytics::{dashboard, loader, normalize, pipeline};

#[derive(Parser)]
#[command(name = "shift-claim-analytics")]
#[command(about = "Claim, pay rate and profitability analytics for shift offers", long_about = None)]
struct Cli {
    /// Log filter directive, e.g. `info` or `shift_claim_analytics=debug`
    #[arg(long, global = true, env = "SHIFT_ANALYTICS_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analyzers over a CSV export of shift offers
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "SHIFT_ANALYTICS_OUTPUT_DIR", default_value = "data")]
        output_dir: PathBuf,
        /// Analyzer to run; repeat for several, omit for all
        #[arg(long = "analyzer", value_enum)]
        analyzers: Vec<AnalyzerKind>,
        /// Minimum offers a rate/slot group needs to compete for the top set
        #[arg(long, env = "SHIFT_ANALYTICS_MIN_OFFERS", default_value_t = config::DEFAULT_MIN_OFFERS)]
        min_offers: usize,
        /// Share of eligible rate/slot groups kept in the top set
        #[arg(long, env = "SHIFT_ANALYTICS_TOP_FRACTION", default_value_t = config::DEFAULT_TOP_FRACTION)]
        top_fraction: f64,
        #[arg(long, default_value_t = config::DEFAULT_SAMPLE_ROWS)]
        sample_rows: usize,
        #[arg(long, value_enum, default_value_t = SegmentBy::Slot)]
        segment_by: SegmentBy,
        #[arg(long, value_enum, default_value_t = Artifacts::Both)]
        format: Artifacts,
        #[arg(long, default_value_t = config::XLSX_SHEET_NAME_LIMIT)]
        sheet_name_limit: usize,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the dashboard tabs as markdown from written outputs
    Dashboard {
        #[arg(long, env = "SHIFT_ANALYTICS_OUTPUT_DIR", default_value = "data")]
        output_dir: PathBuf,
        #[arg(long, default_value_t = 20)]
        rows: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            analyzers,
            min_offers,
            top_fraction,
            sample_rows,
            segment_by,
            format,
            sheet_name_limit,
            json,
        } => {
            let config = AnalysisConfig {
                min_offers,
                top_fraction,
                sample_rows,
                segment_by,
            };
            let format = OutputFormat::from_artifacts(format, sheet_name_limit);
            let analyzers = if analyzers.is_empty() {
                AnalyzerKind::ALL.to_vec()
            } else {
                analyzers
            };

            let raw = loader::load_csv(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            tracing::info!(rows = raw.records.len(), path = %input.display(), "loaded offers");
            let offers = normalize::normalize(&raw).context("failed to normalize offers")?;

            let run = pipeline::run(&offers, &analyzers, &config, &format, &output_dir)
                .context("analysis run failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
                return Ok(());
            }

            println!(
                "Analyzed {} offers ({} claimed).",
                run.rows, run.claimed_rows
            );
            for output in &run.outputs {
                if let Some(path) = &output.workbook.xlsx {
                    println!("- {:?}: workbook written to {}.", output.analyzer, path.display());
                }
                if let Some(path) = &output.workbook.csv_dir {
                    println!("- {:?}: sheets mirrored to {}.", output.analyzer, path.display());
                }
                if let Some(path) = &output.summary {
                    println!("- {:?}: summary written to {}.", output.analyzer, path.display());
                }
            }
        }
        Commands::Dashboard {
            output_dir,
            rows,
            out,
        } => {
            let mut cache = dashboard::SheetCache::new();
            let rendered = dashboard::render(&mut cache, &output_dir, rows)
                .with_context(|| format!("failed to read outputs in {}", output_dir.display()))?;

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Dashboard written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}
