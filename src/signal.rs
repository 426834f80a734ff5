use std::fmt;

use serde::Serialize;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Qualitative trend derived from the latest close and both moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Neutral,
}

impl Trend {
    /// Classify `close` against the short and long averages.
    ///
    /// Returns `None` when either average is undefined.
    pub fn classify(close: f64, ma_short: Option<f64>, ma_long: Option<f64>) -> Option<Self> {
        let (short, long) = (ma_short?, ma_long?);
        Some(if close > short && close > long {
            Self::Uptrend
        } else if close < short && close < long {
            Self::Downtrend
        } else {
            Self::Neutral
        })
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Uptrend => "price is above both moving averages (uptrend)",
            Self::Downtrend => "price is below both moving averages (downtrend)",
            Self::Neutral => "price is between the moving averages (neutral)",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uptrend => write!(f, "uptrend"),
            Self::Downtrend => write!(f, "downtrend"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Qualitative RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: Option<f64>) -> Option<Self> {
        let rsi = rsi?;
        Some(if rsi > RSI_OVERBOUGHT {
            Self::Overbought
        } else if rsi < RSI_OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        })
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Overbought => "RSI above 70: the stock may be overbought",
            Self::Oversold => "RSI below 30: the stock may be oversold",
            Self::Neutral => "RSI between 30 and 70: neutral momentum",
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overbought => write!(f, "overbought"),
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}
