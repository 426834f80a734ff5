pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::FetchError;
use crate::model::{Metadata, Period, PriceSeries};

/// Price history and descriptive data for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub series: PriceSeries,
    pub metadata: Metadata,
}

/// Abstraction over a source of daily price history.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn MarketData`).
pub trait MarketData: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `period`.
    ///
    /// `Ok(None)` means the provider has no data for the symbol.
    fn fetch(
        &self,
        symbol: &str,
        period: Period,
    ) -> BoxFuture<'_, Result<Option<MarketSnapshot>, Report<FetchError>>>;
}
