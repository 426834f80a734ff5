use std::io::Write;

use error_stack::{Report, ResultExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::analysis::analyze;
use crate::error::{AnalysisError, SessionError};
use crate::indicator::IndicatorEngine;
use crate::model::Period;
use crate::provider::MarketData;
use crate::render::Presenter;

/// Everything a single fetch → compute → render cycle needs.
pub struct Dashboard {
    pub provider: Box<dyn MarketData>,
    pub engine: IndicatorEngine,
    pub presenter: Box<dyn Presenter>,
}

impl Dashboard {
    /// Run one cycle and show its outcome. Returns `true` when a report was shown.
    pub async fn run_cycle(&self, symbol: &str, period: Period) -> bool {
        match analyze(self.provider.as_ref(), &self.engine, symbol, period).await {
            Ok(analysis) => match self.presenter.present(&analysis) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = ?e, "failed to render analysis");
                    false
                }
            },
            Err(e) => {
                self.presenter.present_error(&e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze { symbol: String, period: Period },
    Help,
    Quit,
    Empty,
}

/// Parse one input line: `SYMBOL [PERIOD]`, `help` or `quit`.
pub fn parse_command(line: &str, default_period: Period) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(first) = parts.next() else {
        return Ok(Command::Empty);
    };

    match first.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(Command::Quit),
        "help" | "?" => return Ok(Command::Help),
        _ => {}
    }

    let period = match parts.next() {
        None => default_period,
        Some(raw) => Period::from_str(raw).ok_or_else(|| {
            format!(
                "unknown period \"{raw}\"; choose one of {}",
                period_choices()
            )
        })?,
    };

    if let Some(extra) = parts.next() {
        return Err(format!("unexpected argument \"{extra}\""));
    }

    Ok(Command::Analyze {
        symbol: first.to_owned(),
        period,
    })
}

fn period_choices() -> String {
    Period::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn help_text(default_period: Period) -> String {
    format!(
        "enter a ticker and optional period, e.g. \"AAPL 1y\" (periods: {}; default {default_period})\n\
         type \"quit\" to leave",
        period_choices()
    )
}

fn prompt(out: &mut impl Write) {
    if let Err(e) = out.write_all(b"> ").and_then(|()| out.flush()) {
        warn!(error = %e, "failed to write prompt");
    }
}

/// Read commands from `input` until `quit` or end of input.
///
/// Every line is an independent cycle; failures are shown and the session continues.
pub async fn run<R>(
    dashboard: &Dashboard,
    input: R,
    default_period: Period,
) -> Result<usize, Report<SessionError>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut cycles = 0;

    println!("{}", help_text(default_period));
    prompt(&mut std::io::stdout());

    while let Some(line) = lines
        .next_line()
        .await
        .change_context(SessionError::Input)?
    {
        match parse_command(&line, default_period) {
            Ok(Command::Quit) => break,
            Ok(Command::Empty) => {}
            Ok(Command::Help) => println!("{}", help_text(default_period)),
            Ok(Command::Analyze { symbol, period }) => {
                dashboard.run_cycle(&symbol, period).await;
                cycles += 1;
            }
            Err(message) => println!("error: {message}"),
        }
        prompt(&mut std::io::stdout());
    }

    info!(cycles, "session ended");
    Ok(cycles)
}
