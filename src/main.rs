use analyzer::ProductAnalyzer;
use benchmark::BenchmarkEngine;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
// Import database types directly from the database crate
use database::connection::{connect, run_migrations};
use database::repository::LedgerRepository;
use events::EventEnvelope;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use ledger::{LedgerPoster, PostOutcome};
use rust_decimal::Decimal;
use scoring::PainScorer;
use simulation::{simulate, GlobalAllocations, Scenario, SimulationInput, SimulationScope};
use std::io::BufRead;
use std::path::PathBuf;
use uuid::Uuid;

/// The main entry point for the ProfitLens analytics application.
#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize structured logging, filterable via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Initialize the database connection and run migrations
    let db_pool = connect()
        .await
        .expect("Failed to connect to the database");
    run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let config = configuration::load_config().expect("Failed to load configuration");
    let repo = LedgerRepository::new(db_pool);

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Ingest(args) => handle_ingest(args, repo).await,
        Commands::Analyze(args) => handle_analyze(args, repo, &config).await,
        Commands::Diagnose(args) => handle_diagnose(args, repo, &config).await,
        Commands::Simulate(args) => handle_simulate(args, repo, &config).await,
        Commands::DailyStats(args) => handle_daily_stats(args, repo, &config).await,
        Commands::Standing(args) => handle_standing(args, repo, &config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An event-sourced profitability ledger and analytics engine for e-commerce.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a file of commerce events (NDJSON) into the ledger.
    Ingest(IngestArgs),
    /// Rank a merchant's products by profitability over a trailing window.
    Analyze(AnalyzeArgs),
    /// Compute a merchant's pain score and issue log.
    Diagnose(DiagnoseArgs),
    /// Run a what-if scenario against a merchant's current portfolio.
    Simulate(SimulateArgs),
    /// Recompute daily stats for every merchant and refresh the global benchmarks.
    DailyStats(DailyStatsArgs),
    /// Show where a merchant stands against its cohort.
    Standing(StandingArgs),
}

#[derive(Parser)]
struct IngestArgs {
    /// Path to a newline-delimited JSON file of event envelopes.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The merchant to analyze.
    #[arg(long)]
    merchant_id: Uuid,

    /// Trailing window length in days.
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// How many heroes/villains to show.
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

#[derive(Parser)]
struct DiagnoseArgs {
    /// The merchant to diagnose.
    #[arg(long)]
    merchant_id: Uuid,
}

#[derive(Parser)]
struct SimulateArgs {
    /// The merchant whose portfolio to simulate.
    #[arg(long)]
    merchant_id: Uuid,

    /// Trailing window length in days for the baseline snapshot.
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// How many products to model individually; the rest aggregate.
    #[arg(long, default_value_t = 10)]
    top_n: usize,

    /// Restrict the scenario to a single variant (use "rest_of_store" for the
    /// aggregated remainder). Omit to perturb the whole portfolio.
    #[arg(long)]
    target: Option<String>,

    /// Price change in percent (e.g. 10 for +10%).
    #[arg(long, default_value_t = Decimal::ZERO)]
    price_delta_pct: Decimal,

    /// Ad budget change in percent.
    #[arg(long, default_value_t = Decimal::ZERO)]
    ad_delta_pct: Decimal,

    /// Return-rate improvement in percentage points (positive = fewer returns).
    #[arg(long, default_value_t = Decimal::ZERO)]
    return_improvement_pct: Decimal,

    /// Unit cost change in percent.
    #[arg(long, default_value_t = Decimal::ZERO)]
    cogs_delta_pct: Decimal,

    /// Discontinue the target product entirely (requires --target).
    #[arg(long, default_value_t = false, requires = "target")]
    kill: bool,
}

#[derive(Parser)]
struct DailyStatsArgs {
    /// The stat date to compute (format: YYYY-MM-DD). Defaults to yesterday.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Parser)]
struct StandingArgs {
    /// The merchant to rank.
    #[arg(long)]
    merchant_id: Uuid,

    /// The metric to rank on: "revenue", "net_profit" or "margin".
    #[arg(long, default_value = "net_profit")]
    metric: core_types::BenchmarkMetric,
}

// ==============================================================================
// Ingest Command Logic
// ==============================================================================

/// Reads NDJSON event envelopes and posts each one into the ledger.
async fn handle_ingest(args: IngestArgs, repo: LedgerRepository) -> anyhow::Result<()> {
    let file = std::fs::File::open(&args.file)?;
    let lines: Vec<String> = std::io::BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()?;

    println!("Ingesting {} events from {}", lines.len(), args.file.display());

    let poster = LedgerPoster::new(repo);

    // Set up the progress bar
    let progress_bar = ProgressBar::new(lines.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut posted = 0u64;
    let mut duplicates = 0u64;
    let mut rejected = 0u64;

    // Events are posted sequentially: ordering within the file is the only
    // ordering guarantee upstream gives us.
    for (line_no, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            progress_bar.inc(1);
            continue;
        }
        let envelope: EventEnvelope = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                rejected += 1;
                tracing::warn!(line = line_no + 1, error = %e, "unparseable envelope, skipping");
                progress_bar.inc(1);
                continue;
            }
        };

        match poster.post_event(&envelope).await {
            Ok(PostOutcome::Posted(_)) => posted += 1,
            Ok(PostOutcome::Duplicate(_)) => duplicates += 1,
            Err(e) => {
                rejected += 1;
                tracing::warn!(
                    event_id = %envelope.event_id,
                    error = %e,
                    "event rejected"
                );
            }
        }
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("Ingest complete!");
    println!(
        "Posted: {} | Duplicates: {} | Rejected: {}",
        posted, duplicates, rejected
    );
    Ok(())
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

/// Prints the merchant's heroes and villains as a table.
async fn handle_analyze(
    args: AnalyzeArgs,
    repo: LedgerRepository,
    config: &configuration::Config,
) -> anyhow::Result<()> {
    let end = Utc::now();
    let start = end - Duration::days(args.days);

    let analyzer = ProductAnalyzer::new(repo, config.classification.clone());
    let report = analyzer
        .top_and_bottom(args.merchant_id, args.limit, start, end)
        .await?;

    println!("=== Top products (last {} days) ===", args.days);
    print_product_table(&report.heroes);
    println!("\n=== Problem products ===");
    print_product_table(&report.villains);
    Ok(())
}

fn print_product_table(products: &[core_types::ProductFinancials]) {
    if products.is_empty() {
        println!("(none)");
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Variant", "Title", "Units", "Gross", "Returns", "Net", "Return %", "Status",
    ]);
    for p in products {
        table.add_row(vec![
            Cell::new(&p.variant_id),
            Cell::new(p.title.as_deref().unwrap_or("-")),
            Cell::new(p.units_sold),
            Cell::new(format!("{:.2}", p.gross_sales)),
            Cell::new(format!("{:.2}", p.returns)),
            Cell::new(format!("{:.2}", p.net_sales)),
            Cell::new(format!("{:.1}", p.return_rate_pct)),
            Cell::new(p.status.as_str()),
        ]);
    }
    println!("{table}");
}

// ==============================================================================
// Diagnose Command Logic
// ==============================================================================

/// Runs the pain-score diagnosis and prints the factor breakdown.
async fn handle_diagnose(
    args: DiagnoseArgs,
    repo: LedgerRepository,
    config: &configuration::Config,
) -> anyhow::Result<()> {
    let scorer = PainScorer::new(repo, config.scoring.clone(), config.classification.clone());
    let diagnosis = scorer.diagnose(args.merchant_id).await?;

    println!(
        "Pain score: {} ({})",
        diagnosis.score,
        diagnosis.level.as_str()
    );
    println!(
        "Estimated daily opportunity loss: {:.2}",
        diagnosis.opportunity_loss
    );

    if diagnosis.factors.is_empty() {
        println!("No issues detected.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Issue", "Points"]);
    for (issue, points) in &diagnosis.factors {
        table.add_row(vec![Cell::new(issue.as_str()), Cell::new(points)]);
    }
    println!("{table}");
    Ok(())
}

// ==============================================================================
// Simulate Command Logic
// ==============================================================================

/// Builds a baseline snapshot from the analyzer and runs one scenario.
async fn handle_simulate(
    args: SimulateArgs,
    repo: LedgerRepository,
    config: &configuration::Config,
) -> anyhow::Result<()> {
    let end = Utc::now();
    let start = end - Duration::days(args.days);

    let analyzer = ProductAnalyzer::new(repo.clone(), config.classification.clone());
    let products = analyzer.analyze(args.merchant_id, start, end).await?;

    let aggregates = repo.window_aggregates(args.merchant_id, start, end).await?;
    let allocations = GlobalAllocations {
        ad_spend: aggregates.marketing,
        shipping: Decimal::ZERO,
        cogs: aggregates.cogs,
    };

    let input = SimulationInput::from_analysis(&products, args.top_n, &allocations);
    let scenario = Scenario {
        scope: if args.target.is_some() {
            SimulationScope::Product
        } else {
            SimulationScope::Portfolio
        },
        target_variant_id: args.target,
        price_delta_pct: args.price_delta_pct,
        ad_delta_pct: args.ad_delta_pct,
        return_rate_improvement_pct: args.return_improvement_pct,
        cogs_delta_pct: args.cogs_delta_pct,
        is_killed: args.kill,
    };

    let result = simulate(&input, &scenario, &config.elasticity)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["", "Value"]);
    table.add_row(vec![
        Cell::new("Baseline net profit"),
        Cell::new(format!("{:.2}", result.old_net_profit)),
    ]);
    table.add_row(vec![
        Cell::new("Scenario net profit"),
        Cell::new(format!("{:.2}", result.new_net_profit)),
    ]);
    table.add_row(vec![
        Cell::new("Profit delta"),
        Cell::new(format!("{:+.2}", result.profit_delta)),
    ]);
    table.add_row(vec![
        Cell::new("Scenario revenue"),
        Cell::new(format!("{:.2}", result.new_revenue)),
    ]);
    table.add_row(vec![
        Cell::new("Scenario orders"),
        Cell::new(format!("{:.0}", result.new_orders)),
    ]);
    println!("{table}");
    Ok(())
}

// ==============================================================================
// Daily Stats Command Logic
// ==============================================================================

/// Recomputes each merchant's daily stat concurrently, then refreshes the
/// cohort benchmark rows for the date.
async fn handle_daily_stats(
    args: DailyStatsArgs,
    repo: LedgerRepository,
    config: &configuration::Config,
) -> anyhow::Result<()> {
    let stat_date = match args.date {
        Some(d) => d,
        None => (Utc::now() - Duration::days(1)).date_naive(),
    };

    let merchants = repo.merchant_ids().await?;
    println!(
        "Computing daily stats for {} merchants on {}",
        merchants.len(),
        stat_date
    );

    let engine = BenchmarkEngine::new(repo, config.benchmark.clone());

    // Set up the progress bar
    let progress_bar = ProgressBar::new(merchants.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    // Merchants are independent; fan the whole batch out concurrently.
    let tasks: Vec<_> = merchants
        .into_iter()
        .map(|merchant_id| {
            let engine = engine.clone();
            let pb = progress_bar.clone();
            tokio::spawn(async move {
                let result = engine.calculate_daily_stats(merchant_id, stat_date).await;
                pb.inc(1);
                (merchant_id, result)
            })
        })
        .collect();

    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Daily stats complete!");

    let mut failures = 0;
    for result in results {
        match result {
            Ok((merchant_id, Err(e))) => {
                failures += 1;
                eprintln!("Merchant {} failed: {}", merchant_id, e);
            }
            Err(e) => {
                failures += 1;
                eprintln!("A task panicked: {}", e);
            }
            Ok((_, Ok(_))) => {}
        }
    }

    let rows = engine.update_global_benchmarks(stat_date).await?;
    println!(
        "Benchmark rows published: {} ({} merchant failures)",
        rows, failures
    );
    Ok(())
}

// ==============================================================================
// Standing Command Logic
// ==============================================================================

/// Prints where a merchant ranks against its cohort, if publishable.
async fn handle_standing(
    args: StandingArgs,
    repo: LedgerRepository,
    config: &configuration::Config,
) -> anyhow::Result<()> {
    let engine = BenchmarkEngine::new(repo, config.benchmark.clone());

    match engine.user_standing(args.merchant_id, args.metric).await? {
        Some(standing) => {
            println!(
                "Cohort {} | {} = {:.2}",
                standing.cohort.as_str(),
                standing.metric.as_str(),
                standing.value
            );
            println!(
                "Percentile rank: {} (cohort median {:.2}, top-10% at {:.2})",
                standing.percentile_rank, standing.benchmark_median, standing.benchmark_top10
            );
        }
        None => {
            println!("Percentile unknown: not enough cohort data yet.");
        }
    }
    Ok(())
}
