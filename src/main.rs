//! Surebet scanner entry point.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surebet_scanner::api::{create_router, AppState};
use surebet_scanner::arbitrage::{evaluate, scan_events, Leg, OpportunityRecord};
use surebet_scanner::config::{Config, VERBOSE_LOG_FILTER};
use surebet_scanner::market::OutcomeKey;
use surebet_scanner::metrics;
use surebet_scanner::poller::poll_loop;
use surebet_scanner::provider::{OddsApiClient, OddsEvent};
use surebet_scanner::utils::shutdown_signal;

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

/// Sports-betting surebet scanner.
#[derive(Parser, Debug)]
#[command(name = "surebet-scanner")]
#[command(about = "Detects cross-bookmaker surebets and sizes equal-payout stakes")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format.
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the API and poll the provider (default).
    Run {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Evaluate one leg set and print stakes.
    Calculate {
        /// Amount to split across the legs.
        #[arg(short, long)]
        investment: f64,

        /// Minimum theoretical ROI (fraction).
        #[arg(long)]
        min_roi: Option<f64>,

        /// Leg as OUTCOME:ODD[:BOOK], e.g. HOME:2.10:pinnacle.
        #[arg(short, long = "leg", required = true)]
        legs: Vec<String>,
    },

    /// Scan a saved provider payload offline.
    Scan {
        /// Provider JSON payload (array of events).
        #[arg(short, long)]
        file: PathBuf,

        /// Amount to split per opportunity (overrides TOTAL_INVESTMENT).
        #[arg(short, long)]
        investment: Option<f64>,

        /// Minimum theoretical ROI (overrides MIN_ROI).
        #[arg(long)]
        min_roi: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = match Config::load() {
        Ok(config) => EnvFilter::try_new(config.log_filter(args.verbose))
            .unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) if args.verbose => EnvFilter::new(VERBOSE_LOG_FILTER),
        Err(_) => EnvFilter::new("info"),
    };

    let json = matches!(args.log_format, LogFormat::Json);
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Calculate {
            investment,
            min_roi,
            legs,
        }) => cmd_calculate(investment, min_roi, &legs),
        Some(Command::Scan {
            file,
            investment,
            min_roi,
        }) => cmd_scan(&file, investment, min_roi),
        Some(Command::Run { port }) => cmd_run(port.or(args.port)).await,
        None => cmd_run(args.port).await,
    }
}

/// Load and validate configuration.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("failed to load configuration")?;
    config
        .validate()
        .context("configuration validation failed")?;
    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("SUREBET SCANNER - CONFIGURATION CHECK");
    println!("{}", RULE);

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Checking API key... ");
    if config.has_api_key() {
        println!("OK");
    } else {
        println!("MISSING");
        println!("  Live polling needs ODDS_API_KEY; calculate and scan still work.");
    }

    let options = config.engine_options();
    println!("{}", THIN_RULE);
    println!("Configuration Summary:");
    println!("  Provider: {}", config.odds_api_url);
    println!("  Sports: {}", config.sport_keys().join(", "));
    println!("  Regions: {}  Markets: {}", config.regions, config.markets);
    println!("  Daily request limit: {} per sport", config.daily_request_limit);
    println!("  Poll interval: {}s", config.poll_interval_seconds);
    match config.opportunity_ttl() {
        Some(ttl) => println!("  Opportunity TTL: {}s", ttl.as_secs()),
        None => println!("  Opportunity TTL: never"),
    }
    println!("  Total investment: {:.2}", config.total_investment);
    println!("  Min ROI: {:.4}%", config.min_roi * 100.0);
    println!("  Arb threshold: {}", options.arb_threshold);
    println!("  Stake rounding: {:?}", options.rounding);
    println!("  Commission: {:?}", options.commission);
    println!("{}", RULE);
    println!("CONFIGURATION CHECK PASSED");
    println!("{}", RULE);

    Ok(())
}

/// Parse `OUTCOME:ODD[:BOOK]`.
fn parse_leg(raw: &str, index: usize) -> anyhow::Result<Leg> {
    let mut parts = raw.splitn(3, ':');
    let outcome = parts.next().unwrap_or_default().trim();
    let odd = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("leg '{}' must look like OUTCOME:ODD[:BOOK]", raw))?
        .trim();

    let outcome_key = OutcomeKey::from_str(outcome)
        .map_err(|_| anyhow::anyhow!("unknown outcome '{}' in leg '{}'", outcome, raw))?;
    let odd: f64 = odd
        .parse()
        .with_context(|| format!("invalid odd in leg '{}'", raw))?;
    let book = parts
        .next()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("book{}", index + 1));

    Ok(Leg::new(book.clone(), book, outcome_key, odd))
}

/// Evaluate one leg set and print stakes.
fn cmd_calculate(investment: f64, min_roi: Option<f64>, raw_legs: &[String]) -> anyhow::Result<()> {
    let config = load_config()?;
    let legs = raw_legs
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_leg(raw, i))
        .collect::<anyhow::Result<Vec<Leg>>>()?;

    let min_roi = min_roi.unwrap_or(config.min_roi);
    let result = evaluate(&legs, investment, min_roi, &config.engine_options());

    println!("{}", RULE);
    println!("SUREBET SCANNER - CALCULATOR");
    println!("{}", RULE);
    println!("  Sum of inverses: {:.6}", result.sum_inverse);
    println!("  Theoretical ROI: {:.4}%", result.roi_pct());

    if !result.is_arb {
        if let Some(rejection) = result.rejection {
            println!("  Result: not executable ({})", rejection);
        }
        if result.profit != 0.0 {
            println!("  Profit after rounding: {:.2}", result.profit);
        }
        println!("{}", RULE);
        return Ok(());
    }

    println!("{}", THIN_RULE);
    for leg in &result.legs {
        println!(
            "  {:<6} @ {:<8} {:<16} stake {:>10.2}  payout {:>10.2}",
            leg.outcome_key.as_str(),
            leg.odd,
            leg.book_name,
            leg.stake,
            leg.payout
        );
    }
    println!("{}", THIN_RULE);
    println!("  Total stake: {:.2}", result.total_stake());
    println!("  Guaranteed profit: {:.2}", result.profit);
    println!("{}", RULE);

    Ok(())
}

/// Scan a saved provider payload.
fn cmd_scan(file: &Path, investment: Option<f64>, min_roi: Option<f64>) -> anyhow::Result<()> {
    let config = load_config()?;
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let events: Vec<OddsEvent> = serde_json::from_str(&payload)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let mut settings = config.scan_settings();
    if let Some(investment) = investment {
        settings.total_investment = investment;
    }
    if let Some(min_roi) = min_roi {
        settings.min_roi = min_roi;
    }

    let report = scan_events(&events, &settings);

    println!("{}", RULE);
    println!("SUREBET SCANNER - OFFLINE SCAN");
    println!("{}", RULE);
    println!("  Events scanned: {}", report.events_scanned);
    println!("  Markets evaluated: {}", report.markets_evaluated);
    println!("  Markets skipped: {}", report.markets_skipped);
    println!("  Rounding rejections: {}", report.rounding_rejections);
    if let Some(best) = report.best_roi {
        println!("  Best ROI seen: {:.4}%", best * 100.0);
    }
    println!("  Opportunities: {}", report.opportunities.len());

    for opportunity in &report.opportunities {
        let record = OpportunityRecord::from(opportunity);
        println!("{}", THIN_RULE);
        println!(
            "  {} [{}] ROI {}%  profit {}",
            record.matchup,
            opportunity.market.label(),
            record.roi_pct,
            record.profit
        );
        for leg in &record.legs {
            println!(
                "    {:<6} @ {:<8} {:<16} stake {}",
                leg.outcome_key.as_str(),
                leg.odd,
                leg.book_name,
                leg.stake
            );
        }
    }
    println!("{}", RULE);

    Ok(())
}

/// Serve the API and poll until shutdown.
async fn cmd_run(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = load_config().map_err(|e| {
        error!("Invalid configuration: {:#}", e);
        e
    })?;

    let client = OddsApiClient::new(&config).context("cannot start the poll loop")?;
    let sports = config.sport_keys();
    let settings = config.scan_settings();

    // Initialize metrics
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    metrics::init_metrics();

    info!(
        sports = %sports.join(","),
        interval_s = config.poll_interval_seconds,
        investment = settings.total_investment,
        min_roi = settings.min_roi,
        "Configuration loaded successfully"
    );

    // Create app state
    let app_state = AppState::new(settings.clone()).with_prometheus(prometheus);

    // Start HTTP server
    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Poll until Ctrl-C / SIGTERM
    poll_loop(
        client,
        sports,
        settings,
        app_state,
        Duration::from_secs(config.poll_interval_seconds),
        config.opportunity_ttl(),
        shutdown_signal(),
    )
    .await;

    server_handle.await??;
    info!("Shutdown complete");
    Ok(())
}
