use anyhow::{bail, Result};
use car_scout::config::AppConfig;
use car_scout::models::Source;
use car_scout::pipeline::Pipeline;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "car-scout", about = "Used-car listings: scrape, normalize, load")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the link collector's page or scroll budget
#[derive(Args, Clone, Copy)]
struct BudgetArgs {
    /// Result pages to visit
    #[arg(long)]
    pages: Option<usize>,
    /// Links to gather before an infinite-scroll feed stops
    #[arg(long)]
    target_links: Option<usize>,
    /// Upper bound on scroll steps
    #[arg(long)]
    max_scrolls: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect listing URLs from search results
    CollectLinks {
        #[arg(value_enum, required = true)]
        sources: Vec<Source>,
        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Visit collected URLs and save raw listing fields
    FetchDetails {
        #[arg(value_enum, required = true)]
        sources: Vec<Source>,
    },
    /// Normalize saved raw listings and print the admitted rows
    Normalize {
        #[arg(value_enum, required = true)]
        sources: Vec<Source>,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize saved raw listings and replace the destination table
    Load {
        #[arg(value_enum, required = true)]
        sources: Vec<Source>,
    },
    /// Run every step; all sources when none are named.
    ///
    /// A failing source does not stop the others, but the command exits
    /// with an error naming every source that failed.
    Run {
        #[arg(value_enum)]
        sources: Vec<Source>,
        #[command(flatten)]
        budget: BudgetArgs,
    },
}

fn pipelines(sources: &[Source], config: &AppConfig) -> Vec<Pipeline> {
    let sources = if sources.is_empty() {
        Source::ALL.to_vec()
    } else {
        sources.to_vec()
    };
    sources
        .into_iter()
        .map(|s| Pipeline::new(s, config.clone()))
        .collect()
}

/// Turns the sources whose run failed into the command's result
fn run_outcome(failed: &[Source]) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = failed.iter().map(|s| s.name()).collect();
    bail!("Pipeline failed for {}", names.join(", "))
}

fn report_load(pipeline: &Pipeline, loaded: bool) {
    if !loaded {
        warn!("[{}] Load failed; previous table contents may remain", pipeline.source());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("🚗 Car Scout - used-car listings");

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::CollectLinks { sources, budget: overrides } => {
            for pipeline in pipelines(&sources, &config) {
                let budget = pipeline.default_budget().with_overrides(
                    overrides.pages,
                    overrides.target_links,
                    overrides.max_scrolls,
                );
                pipeline.collect_links(budget).await?;
            }
        }
        Commands::FetchDetails { sources } => {
            for pipeline in pipelines(&sources, &config) {
                pipeline.fetch_details().await?;
            }
        }
        Commands::Normalize { sources, json } => {
            for pipeline in pipelines(&sources, &config) {
                let report = pipeline.normalize().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report.listings)?);
                    continue;
                }
                for (i, car) in report.listings.iter().enumerate() {
                    println!(
                        "{}. {} {} {} ({} ₽)",
                        i + 1,
                        car.brand,
                        car.model,
                        car.year,
                        car.price
                    );
                    println!("   {} км, {}", car.mileage, car.transmission.as_str());
                    if let Some(location) = &car.location {
                        println!("   Location: {}", location);
                    }
                    println!("   URL: {}", car.link);
                    println!();
                }
                info!(
                    "[{}] {} rows admitted, {} rejected",
                    pipeline.source(),
                    report.listings.len(),
                    report.rejected
                );
            }
        }
        Commands::Load { sources } => {
            for pipeline in pipelines(&sources, &config) {
                let report = pipeline.normalize().await?;
                let loaded = pipeline.load(report.listings).await?;
                report_load(&pipeline, loaded);
            }
        }
        Commands::Run { sources, budget: overrides } => {
            let mut failed = Vec::new();
            for pipeline in pipelines(&sources, &config) {
                let budget = pipeline.default_budget().with_overrides(
                    overrides.pages,
                    overrides.target_links,
                    overrides.max_scrolls,
                );
                // Sources are independent; one failing does not stop the others
                match pipeline.run(budget).await {
                    Ok(loaded) => report_load(&pipeline, loaded),
                    Err(e) => {
                        error!("[{}] Pipeline failed: {:#}", pipeline.source(), e);
                        failed.push(pipeline.source());
                    }
                }
            }
            run_outcome(&failed)?;
        }
    }

    Ok(())
}
