use chrono::NaiveDate;
use serde::Serialize;

use crate::indicator::{IndicatorRow, IndicatorSeries};
use crate::signal::{RSI_OVERBOUGHT, RSI_OVERSOLD};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renderer-agnostic description of the dual-pane price/RSI chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub panes: Vec<Pane>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pane {
    pub title: String,
    pub traces: Vec<Trace>,
    pub reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trace {
    Candlestick {
        name: String,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
    },
    Line {
        name: String,
        values: Vec<Option<f64>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: &'static str,
    pub value: f64,
}

impl ChartSpec {
    /// Price with both moving averages on top, RSI with 30/70 guides below.
    pub fn build(title: &str, series: &IndicatorSeries) -> Self {
        let rows = &series.rows;
        let column = |f: fn(&IndicatorRow) -> f64| -> Vec<f64> { rows.iter().map(f).collect() };

        let price = Pane {
            title: "Price".into(),
            traces: vec![
                Trace::Candlestick {
                    name: "OHLC".into(),
                    open: column(|r| r.bar.open),
                    high: column(|r| r.bar.high),
                    low: column(|r| r.bar.low),
                    close: column(|r| r.bar.close),
                },
                Trace::Line {
                    name: format!("MA{}", series.ma_short_window),
                    values: rows.iter().map(|r| r.ma_short).collect(),
                },
                Trace::Line {
                    name: format!("MA{}", series.ma_long_window),
                    values: rows.iter().map(|r| r.ma_long).collect(),
                },
            ],
            reference_lines: Vec::new(),
        };

        let rsi = Pane {
            title: format!("RSI ({})", series.rsi_window),
            traces: vec![Trace::Line {
                name: "RSI".into(),
                values: rows.iter().map(|r| r.rsi).collect(),
            }],
            reference_lines: vec![
                ReferenceLine {
                    label: "overbought",
                    value: RSI_OVERBOUGHT,
                },
                ReferenceLine {
                    label: "oversold",
                    value: RSI_OVERSOLD,
                },
            ],
        };

        Self {
            title: title.to_owned(),
            dates: rows.iter().map(|r| r.bar.date).collect(),
            panes: vec![price, rsi],
        }
    }
}

/// Render `values` as a one-line sparkline scaled to `[low, high]`.
///
/// Undefined values become spaces. A degenerate range draws everything at
/// the middle level.
pub fn sparkline(values: &[Option<f64>], low: f64, high: f64) -> String {
    let span = high - low;
    values
        .iter()
        .map(|v| match v {
            None => ' ',
            Some(_) if span <= 0.0 => SPARK_LEVELS[SPARK_LEVELS.len() / 2],
            Some(v) => {
                let ratio = ((v - low) / span).clamp(0.0, 1.0);
                let idx = (ratio * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[idx]
            }
        })
        .collect()
}

/// Min and max over the defined values of every slice.
pub fn bounds<'a>(columns: impl IntoIterator<Item = &'a [Option<f64>]>) -> Option<(f64, f64)> {
    columns
        .into_iter()
        .flatten()
        .flatten()
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}
