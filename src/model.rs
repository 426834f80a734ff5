use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lookback period offered to the user.
///
/// String representations match the provider's `range` parameter
/// (e.g. `"6mo"`, `"1y"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    Month1,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "6mo")]
    Month6,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "2y")]
    Year2,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Self::Month1,
        Self::Month3,
        Self::Month6,
        Self::Year1,
        Self::Year2,
    ];

    /// Parse a period string (case-insensitive) into a `Period`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Some(Self::Month1),
            "3mo" => Some(Self::Month3),
            "6mo" => Some(Self::Month6),
            "1y" => Some(Self::Year1),
            "2y" => Some(Self::Year2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
            Self::Month6 => "6mo",
            Self::Year1 => "1y",
            Self::Year2 => "2y",
        }
    }

    /// Human-readable label, e.g. "6 months".
    pub fn label(self) -> &'static str {
        match self {
            Self::Month1 => "1 month",
            Self::Month3 => "3 months",
            Self::Month6 => "6 months",
            Self::Year1 => "1 year",
            Self::Year2 => "2 years",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Daily bars for one ticker, strictly ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from raw bars in any order.
    ///
    /// Bars with negative or non-finite fields are dropped. When two bars share
    /// a date the later one in the input wins.
    pub fn from_bars(bars: Vec<PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(PriceBar::is_valid).collect();
        // Stable sort keeps input order among equal dates, so the last one is the newest.
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Descriptive data returned alongside a price series. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub display_name: Option<String>,
    pub currency: Option<String>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<f64>,
}
