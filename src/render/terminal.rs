use std::io::Write;

use error_stack::{Report, ResultExt};
use prettytable::{Cell, Row, Table, format};

use crate::analysis::Analysis;
use crate::chart::{bounds, sparkline};
use crate::config::DisplayConfig;
use crate::error::{AnalysisError, RenderError};
use crate::render::{Presenter, format_currency, format_percent, format_thousands, or_na};
use crate::signal::{RSI_OVERBOUGHT, RSI_OVERSOLD};

/// Number of most recent sessions drawn in the text chart.
const CHART_WIDTH: usize = 60;

/// Human-readable report on stdout.
pub struct TerminalPresenter {
    display: DisplayConfig,
}

impl TerminalPresenter {
    pub fn new(display: DisplayConfig) -> Self {
        Self { display }
    }

    /// Build the full report text for `analysis`.
    pub fn render(&self, analysis: &Analysis) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} ({}) - {}\n\n",
            analysis.title(),
            analysis.symbol,
            analysis.period.label()
        ));
        out.push_str(&self.metrics_table(analysis).to_string());
        out.push('\n');
        out.push_str(&narrative(analysis));
        out.push('\n');
        out.push_str(&chart(analysis));
        out.push('\n');
        out.push_str(&format!(
            "Last {} sessions:\n",
            analysis.series.tail(self.display.tail_rows).len()
        ));
        out.push_str(&self.tail_table(analysis).to_string());
        out
    }

    fn money(&self, value: Option<f64>) -> String {
        or_na(value, |v| format_currency(v, &self.display.currency_symbol))
    }

    fn metrics_table(&self, analysis: &Analysis) -> Table {
        let summary = &analysis.summary;
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(header_row(&[
            "Close",
            "Change",
            "52w High",
            "52w Low",
            "Volume",
        ]));
        table.add_row(Row::new(vec![
            Cell::new(&self.money(summary.latest_close)),
            Cell::new(&or_na(summary.change_pct, format_percent)),
            Cell::new(&self.money(summary.fifty_two_week_high)),
            Cell::new(&self.money(summary.fifty_two_week_low)),
            Cell::new(&or_na(summary.volume, format_thousands)),
        ]));
        table
    }

    fn tail_table(&self, analysis: &Analysis) -> Table {
        let series = &analysis.series;
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        let ma_short = format!("MA{}", series.ma_short_window);
        let ma_long = format!("MA{}", series.ma_long_window);
        let rsi = format!("RSI{}", series.rsi_window);
        table.set_titles(header_row(&[
            "Date", "Open", "High", "Low", "Close", "Volume", &ma_short, &ma_long, &rsi,
        ]));

        for row in series.tail(self.display.tail_rows) {
            let bar = &row.bar;
            table.add_row(Row::new(vec![
                Cell::new(&bar.date.format("%Y-%m-%d").to_string()),
                Cell::new(&self.money(Some(bar.open))).style_spec("r"),
                Cell::new(&self.money(Some(bar.high))).style_spec("r"),
                Cell::new(&self.money(Some(bar.low))).style_spec("r"),
                Cell::new(&self.money(Some(bar.close))).style_spec("r"),
                Cell::new(&format_thousands(bar.volume)).style_spec("r"),
                Cell::new(&self.money(row.ma_short)).style_spec("r"),
                Cell::new(&self.money(row.ma_long)).style_spec("r"),
                Cell::new(&or_na(row.rsi, |v| format!("{v:.1}"))).style_spec("r"),
            ]));
        }
        table
    }
}

impl Presenter for TerminalPresenter {
    fn present(&self, analysis: &Analysis) -> Result<(), Report<RenderError>> {
        let report = self.render(analysis);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{report}").change_context(RenderError::Write)?;
        stdout.flush().change_context(RenderError::Write)
    }

    fn present_error(&self, error: &Report<AnalysisError>) {
        tracing::debug!(error = ?error, "analysis failed");
        println!("error: {}", error_message(error));
    }
}

/// One-line user-facing message for a failed cycle.
pub fn error_message(error: &Report<AnalysisError>) -> String {
    match error.current_context() {
        AnalysisError::Fetch { symbol } => {
            format!("could not fetch data for {symbol}; check the symbol or try again later")
        }
        other => other.to_string(),
    }
}

fn header_row(titles: &[&str]) -> Row {
    Row::new(titles.iter().map(|t| Cell::new(t).style_spec("b")).collect())
}

fn narrative(analysis: &Analysis) -> String {
    let summary = &analysis.summary;
    let trend = or_na(summary.trend, |t| t.describe().to_owned());
    let rsi = match (summary.rsi, summary.rsi_zone) {
        (Some(value), Some(zone)) => format!("{value:.1} - {}", zone.describe()),
        _ => crate::render::NOT_AVAILABLE.to_owned(),
    };
    format!("Trend: {trend}\nRSI:   {rsi}\n")
}

fn chart(analysis: &Analysis) -> String {
    if analysis.series.is_empty() {
        return String::new();
    }
    let rows = analysis.series.tail(CHART_WIDTH);
    let close: Vec<Option<f64>> = rows.iter().map(|r| Some(r.bar.close)).collect();
    let ma_short: Vec<Option<f64>> = rows.iter().map(|r| r.ma_short).collect();
    let ma_long: Vec<Option<f64>> = rows.iter().map(|r| r.ma_long).collect();
    let rsi: Vec<Option<f64>> = rows.iter().map(|r| r.rsi).collect();

    let (low, high) = bounds([&close[..], &ma_short[..], &ma_long[..]]).unwrap_or((0.0, 0.0));
    let series = &analysis.series;

    let mut out = String::new();
    out.push_str(&format!("{:<7}{}\n", "Close", sparkline(&close, low, high)));
    out.push_str(&format!(
        "{:<7}{}\n",
        format!("MA{}", series.ma_short_window),
        sparkline(&ma_short, low, high)
    ));
    out.push_str(&format!(
        "{:<7}{}\n",
        format!("MA{}", series.ma_long_window),
        sparkline(&ma_long, low, high)
    ));
    out.push_str(&format!(
        "{:<7}{}  (0-100, guides at {RSI_OVERSOLD:.0}/{RSI_OVERBOUGHT:.0})\n",
        format!("RSI{}", series.rsi_window),
        sparkline(&rsi, 0.0, 100.0)
    ));
    out
}
