use serde::Serialize;

use crate::indicator::IndicatorSeries;
use crate::model::Metadata;
use crate::signal::{RsiZone, Trend};

/// Headline metrics for the latest trading day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub latest_close: Option<f64>,
    pub change_pct: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<f64>,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub trend: Option<Trend>,
    pub rsi_zone: Option<RsiZone>,
}

impl Summary {
    pub fn build(series: &IndicatorSeries, metadata: &Metadata) -> Self {
        let mut summary = Self {
            fifty_two_week_high: metadata.fifty_two_week_high,
            fifty_two_week_low: metadata.fifty_two_week_low,
            volume: metadata.volume,
            ..Self::default()
        };

        let Some(last) = series.last() else {
            return summary;
        };

        let close = last.bar.close;
        summary.latest_close = Some(close);
        summary.change_pct = series
            .rows
            .len()
            .checked_sub(2)
            .and_then(|i| percent_change(series.rows[i].bar.close, close));
        summary.ma_short = last.ma_short;
        summary.ma_long = last.ma_long;
        summary.rsi = last.rsi;
        summary.trend = Trend::classify(close, last.ma_short, last.ma_long);
        summary.rsi_zone = RsiZone::classify(last.rsi);
        summary
    }
}

/// Percent change from `previous` to `current`; `None` when `previous` is zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}
