use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;

use crate::error::AnalysisError;
use crate::indicator::{IndicatorEngine, IndicatorSeries};
use crate::model::{Metadata, Period};
use crate::provider::MarketData;
use crate::summary::Summary;

/// Result of one fetch → compute cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub period: Period,
    pub metadata: Metadata,
    pub summary: Summary,
    #[serde(skip)]
    pub series: IndicatorSeries,
}

impl Analysis {
    /// Display name from metadata, falling back to the ticker symbol.
    pub fn title(&self) -> &str {
        self.metadata.display_name.as_deref().unwrap_or(&self.symbol)
    }
}

/// Trim and uppercase a user-supplied ticker.
pub fn normalize_symbol(raw: &str) -> Result<String, Report<AnalysisError>> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(Report::new(AnalysisError::EmptySymbol));
    }
    Ok(symbol)
}

/// Run one analysis cycle for `symbol` over `period`.
///
/// Indicators are only computed when the provider returns at least one row.
pub async fn analyze(
    provider: &dyn MarketData,
    engine: &IndicatorEngine,
    symbol: &str,
    period: Period,
) -> Result<Analysis, Report<AnalysisError>> {
    let symbol = normalize_symbol(symbol)?;

    info!(
        provider = provider.name(),
        symbol = %symbol,
        period = %period,
        "fetching price history"
    );

    let snapshot = provider
        .fetch(&symbol, period)
        .await
        .change_context(AnalysisError::Fetch {
            symbol: symbol.clone(),
        })?
        .filter(|s| !s.series.is_empty())
        .ok_or_else(|| {
            Report::new(AnalysisError::NoData {
                symbol: symbol.clone(),
            })
        })?;

    let series = engine.compute(&snapshot.series);
    let summary = Summary::build(&series, &snapshot.metadata);

    info!(
        symbol = %symbol,
        rows = series.len(),
        trend = ?summary.trend,
        rsi_zone = ?summary.rsi_zone,
        "analysis complete"
    );

    Ok(Analysis {
        symbol,
        period,
        metadata: snapshot.metadata,
        summary,
        series,
    })
}
