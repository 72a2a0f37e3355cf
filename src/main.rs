use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

mod catalog;
mod choreography;
mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod layers;
mod loader;
mod models;
mod pipeline;
mod report;
mod scales;
mod session;
mod split;
mod svg;

use catalog::MonthCatalog;
use config::ChartConfig;
use loader::DirectorySource;
use models::MonthKey;
use session::{ChartSession, ChartView, Direction};

#[derive(Parser)]
#[command(name = "execution-boxplot")]
#[command(about = "Monthly workflow execution box plots with org scatter and trend", long_about = None)]
struct Cli {
    /// Directory holding box_plot_YYYY-MM.csv and org_data_YYYY-MM.csv files
    #[arg(long, global = true, env = "CHART_DATA_DIR", default_value = "public/monthly")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the months available in the data directory
    Months {
        #[arg(long)]
        json: bool,
    },
    /// Render one month as an animated SVG chart
    Render {
        #[arg(long)]
        month: Option<MonthKey>,
        /// Navigate one month from the selected one before rendering
        #[arg(long, value_enum)]
        step: Option<Direction>,
        #[arg(long, default_value_t = 1200.0)]
        width: f64,
        /// Fix the jitter layout; omit for a fresh layout each render
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a markdown summary of one month
    Summary {
        #[arg(long)]
        month: Option<MonthKey>,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Split all-time exports into per-month resources
    Split {
        #[arg(long)]
        box_plot: PathBuf,
        #[arg(long)]
        org_data: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("execution_boxplot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Months { json } => {
            let catalog = MonthCatalog::discover(&cli.data_dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.months())?);
                return Ok(());
            }
            if catalog.is_empty() {
                println!("No months found in {}.", cli.data_dir.display());
                return Ok(());
            }
            println!("Available months:");
            for month in catalog.months() {
                let marker = if Some(*month) == catalog.first() {
                    " (first)"
                } else if Some(*month) == catalog.last() {
                    " (last)"
                } else {
                    ""
                };
                println!("- {month} {}{marker}", month.label());
            }
        }
        Commands::Render {
            month,
            step,
            width,
            seed,
            out,
        } => {
            let catalog = MonthCatalog::discover(&cli.data_dir)?;
            let latest = resolve_month(&catalog, None, &cli.data_dir)?;
            let mut session = ChartSession::new(catalog, latest)?;
            let mut ticket = match month {
                Some(month) => session.select(month)?,
                None => session.reload(),
            };

            if let Some(direction) = step {
                let initial = session.selected();
                ticket = session.step(direction).unwrap_or_else(|| {
                    let edge = match direction {
                        Direction::Prev => "first",
                        Direction::Next => "last",
                    };
                    println!("{initial} is the {edge} month, staying on it.");
                    ticket
                });
            }

            let config = ChartConfig::default().with_width(width);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let source = DirectorySource::new(&cli.data_dir);
            session.fulfil(&source, ticket, &config, &mut rng).await;

            let out =
                out.unwrap_or_else(|| PathBuf::from(format!("chart_{}.svg", session.selected())));
            match session.view() {
                ChartView::Ready { month, chart } => {
                    std::fs::write(&out, svg::render(chart))
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!(
                        "Chart for {} written to {} ({} days, {} org points).",
                        month,
                        out.display(),
                        chart.composition.boxes.len(),
                        chart.composition.points.len()
                    );
                }
                ChartView::Failed { month, message } => {
                    let frame = layers::Frame::from_config(&config);
                    std::fs::write(&out, svg::render_error(&frame, *month, message))
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Could not load {month}: {message}");
                }
                other => anyhow::bail!("chart for {:?} never settled", other.month()),
            }
        }
        Commands::Summary { month, top, out } => {
            let catalog = MonthCatalog::discover(&cli.data_dir)?;
            let month = resolve_month(&catalog, month, &cli.data_dir)?;
            let source = DirectorySource::new(&cli.data_dir);
            let dataset = loader::load_month(&source, month).await?;
            let report = report::build_report(&dataset, top);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Split {
            box_plot,
            org_data,
            out_dir,
        } => {
            let counts = split::split_exports(&box_plot, &org_data, &out_dir)?;
            println!("Split into {} months:", counts.len());
            for count in &counts {
                println!(
                    "- {}: {} box plot days, {} org data points",
                    count.month, count.aggregate_rows, count.org_rows
                );
            }
        }
    }

    Ok(())
}

fn resolve_month(
    catalog: &MonthCatalog,
    requested: Option<MonthKey>,
    data_dir: &std::path::Path,
) -> anyhow::Result<MonthKey> {
    match requested {
        Some(month) => Ok(catalog.require(month)?),
        None => catalog
            .last()
            .with_context(|| format!("no months found in {}", data_dir.display())),
    }
}
