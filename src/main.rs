use std::path::Path;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stock_analyzer::config::{self, AppConfig};
use stock_analyzer::indicator::IndicatorEngine;
use stock_analyzer::model::Period;
use stock_analyzer::provider::yahoo::YahooProvider;
use stock_analyzer::render::Presenter;
use stock_analyzer::render::json::JsonPresenter;
use stock_analyzer::render::terminal::TerminalPresenter;
use stock_analyzer::session::{self, Dashboard};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("invalid argument: {reason}")]
    Argument { reason: String },
    #[display("provider setup error")]
    Provider,
    #[display("indicator setup error")]
    Indicator,
    #[display("session error")]
    Session,
}

#[derive(Parser)]
#[command(
    name = "stock-analyzer",
    about = "Daily price history with moving averages and RSI"
)]
struct Cli {
    /// Path to a TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Ticker symbol, case-insensitive (defaults to analysis.default_symbol)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Lookback period: 1mo, 3mo, 6mo, 1y or 2y (defaults to analysis.default_period)
    #[arg(short, long)]
    period: Option<String>,

    /// Read `SYMBOL [PERIOD]` lines from stdin, one analysis per line
    #[arg(short, long)]
    interactive: bool,

    /// Print a JSON report instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(Path::new(path)).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);

    let period_arg = cli
        .period
        .as_deref()
        .unwrap_or(&config.analysis.default_period);
    let period = Period::from_str(period_arg).ok_or_else(|| {
        Report::new(AppError::Argument {
            reason: format!("unknown period \"{period_arg}\""),
        })
    })?;

    let engine = IndicatorEngine::new(&config.analysis.indicator_settings())
        .change_context(AppError::Indicator)?;
    let provider = YahooProvider::new(&config.provider).change_context(AppError::Provider)?;
    let presenter: Box<dyn Presenter> = if cli.json {
        Box::new(JsonPresenter::new(config.display.tail_rows))
    } else {
        Box::new(TerminalPresenter::new(config.display.clone()))
    };

    let dashboard = Dashboard {
        provider: Box::new(provider),
        engine,
        presenter,
    };

    if cli.interactive {
        let stdin = BufReader::new(tokio::io::stdin());
        session::run(&dashboard, stdin, period)
            .await
            .change_context(AppError::Session)?;
        return Ok(());
    }

    let symbol = cli
        .symbol
        .as_deref()
        .unwrap_or(&config.analysis.default_symbol);
    let shown = dashboard.run_cycle(symbol, period).await;
    info!(symbol, period = %period, shown, "done");
    Ok(())
}

/// Logs go to stderr so they never interleave with the report on stdout.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
