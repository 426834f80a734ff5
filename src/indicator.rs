pub mod ma;
pub mod rsi;

use std::num::NonZeroUsize;

use error_stack::Report;
use nonzero_ext::nonzero;
use serde::Serialize;
use tracing::debug;

use crate::error::IndicatorError;
use crate::model::{PriceBar, PriceSeries};
use ma::Sma;
use rsi::Rsi;

pub const DEFAULT_MA_SHORT: NonZeroUsize = nonzero!(20usize);
pub const DEFAULT_MA_LONG: NonZeroUsize = nonzero!(50usize);
pub const DEFAULT_RSI: NonZeroUsize = nonzero!(14usize);

/// A technical analysis indicator over closing prices.
///
/// Closes must be in ascending chronological order (oldest first).
pub trait Indicator {
    /// Short name used in logs and chart legends (e.g. "MA20").
    fn name(&self) -> String;

    /// Minimum number of closes required before the first defined value.
    fn required_closes(&self) -> usize;

    /// Calculate one value per input close.
    ///
    /// The output has the same length as `closes`; entries without enough
    /// history (or otherwise undefined) are `None`. The value at index `i`
    /// only depends on `closes[..=i]`.
    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>>;
}

/// Window lengths used by [`IndicatorEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ma_short: DEFAULT_MA_SHORT.get(),
            ma_long: DEFAULT_MA_LONG.get(),
            rsi: DEFAULT_RSI.get(),
        }
    }
}

/// A price bar annotated with derived indicator values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
}

/// A price series extended with `ma_short`, `ma_long` and `rsi` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub rsi_window: usize,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// The last `n` rows (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

/// Computes moving averages and RSI for a price series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    ma_short: Sma,
    ma_long: Sma,
    rsi: Rsi,
}

impl IndicatorEngine {
    pub fn new(settings: &IndicatorSettings) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            ma_short: Sma::new(settings.ma_short)?,
            ma_long: Sma::new(settings.ma_long)?,
            rsi: Rsi::new(settings.rsi)?,
        })
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorSeries {
        let closes = series.closes();
        if closes.len() < self.ma_long.required_closes() {
            debug!(
                rows = closes.len(),
                required = self.ma_long.required_closes(),
                "series shorter than the long window; leading values stay undefined"
            );
        }

        let ma_short = self.ma_short.calculate(&closes);
        let ma_long = self.ma_long.calculate(&closes);
        let rsi = self.rsi.calculate(&closes);

        debug!(
            rows = closes.len(),
            short = %self.ma_short.name(),
            long = %self.ma_long.name(),
            rsi = %self.rsi.name(),
            "indicators computed"
        );

        let rows = series
            .bars()
            .iter()
            .zip(ma_short)
            .zip(ma_long)
            .zip(rsi)
            .map(|(((bar, ma_short), ma_long), rsi)| IndicatorRow {
                bar: bar.clone(),
                ma_short,
                ma_long,
                rsi,
            })
            .collect();

        IndicatorSeries {
            ma_short_window: self.ma_short.period(),
            ma_long_window: self.ma_long.period(),
            rsi_window: self.rsi.period(),
            rows,
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            ma_short: Sma::from_nonzero(DEFAULT_MA_SHORT),
            ma_long: Sma::from_nonzero(DEFAULT_MA_LONG),
            rsi: Rsi::from_nonzero(DEFAULT_RSI),
        }
    }
}

/// Annotate `series` with MA20, MA50 and RSI14.
pub fn compute_indicators(series: &PriceSeries) -> IndicatorSeries {
    IndicatorEngine::default().compute(series)
}
