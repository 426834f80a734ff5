use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use error_stack::{Report, ResultExt, bail};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::model::{Metadata, Period, PriceBar, PriceSeries};
use crate::provider::{MarketData, MarketSnapshot};

const PROVIDER_NAME: &str = "yahoo";
const USER_AGENT: &str = concat!("stock-analyzer/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(2u32);

/// Daily bars from the Yahoo Finance chart endpoint.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<FetchError>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .change_context(FetchError::Request {
                provider: PROVIDER_NAME.into(),
            })
            .attach("failed to build HTTP client")?;

        let base_url = Url::parse(config.base_url.trim())
            .change_context(FetchError::Request {
                provider: PROVIDER_NAME.into(),
            })
            .attach_with(|| format!("base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!(FetchError::Request {
                provider: PROVIDER_NAME.into(),
            });
        }

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(DEFAULT_REQUESTS_PER_SECOND);

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }

    /// The ticker is a single path segment, so `?`, `#` and `/` are percent-encoded.
    fn chart_url(&self, symbol: &str) -> Result<Url, Report<FetchError>> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Report::new(FetchError::Request {
                    provider: PROVIDER_NAME.into(),
                })
                .attach("base URL cannot carry a path")
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

impl MarketData for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch(
        &self,
        symbol: &str,
        period: Period,
    ) -> BoxFuture<'_, Result<Option<MarketSnapshot>, Report<FetchError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = self.chart_url(&symbol)?;
            let params = [("range", period.as_str()), ("interval", "1d")];

            debug!(%url, period = %period, "requesting chart");

            let response = self
                .client
                .get(url)
                .query(&params)
                .send()
                .await
                .change_context(FetchError::Request {
                    provider: PROVIDER_NAME.into(),
                })
                .attach_with(|| format!("symbol: {symbol}"))?;

            if response.status() == StatusCode::NOT_FOUND {
                info!(symbol = %symbol, "symbol not found");
                return Ok(None);
            }

            if !response.status().is_success() {
                return Err(Report::new(FetchError::Request {
                    provider: PROVIDER_NAME.into(),
                })
                .attach(format!("HTTP status: {}", response.status())));
            }

            let body: ChartResponse =
                response
                    .json()
                    .await
                    .change_context(FetchError::ResponseParse {
                        provider: PROVIDER_NAME.into(),
                    })?;

            let snapshot = body.into_snapshot();

            info!(
                symbol = %symbol,
                period = %period,
                rows = snapshot.as_ref().map_or(0, |s| s.series.len()),
                "chart fetch complete"
            );

            Ok(snapshot)
        })
    }
}

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    /// Seconds since epoch, one per bar
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    regular_market_volume: Option<f64>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

/// Column arrays aligned with `timestamp`; any entry may be `null`.
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_snapshot(self) -> Option<MarketSnapshot> {
        if let Some(err) = self.chart.error {
            debug!(
                code = %err.code,
                description = err.description.as_deref().unwrap_or(""),
                "chart returned error"
            );
            return None;
        }

        let result = self.chart.result?.into_iter().next()?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let offset = result.meta.gmtoffset;

        let bars = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(PriceBar {
                    date: DateTime::from_timestamp(ts.checked_add(offset)?, 0)?.date_naive(),
                    open: value_at(&quote.open, i)?,
                    high: value_at(&quote.high, i)?,
                    low: value_at(&quote.low, i)?,
                    close: value_at(&quote.close, i)?,
                    volume: value_at(&quote.volume, i)?,
                })
            })
            .collect();

        let series = PriceSeries::from_bars(bars);
        if series.is_empty() {
            return None;
        }

        let meta = result.meta;
        Some(MarketSnapshot {
            series,
            metadata: Metadata {
                display_name: meta.long_name.or(meta.short_name),
                currency: meta.currency,
                fifty_two_week_high: meta.fifty_two_week_high,
                fifty_two_week_low: meta.fifty_two_week_low,
                volume: meta.regular_market_volume,
            },
        })
    }
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "fiftyTwoWeekHigh": 260.1,
                    "fiftyTwoWeekLow": 164.08,
                    "regularMarketVolume": 45123456,
                    "gmtoffset": -14400
                },
                "timestamp": [1717421400, 1717507800, 1717594200],
                "indicators": {
                    "quote": [{
                        "open":   [192.9, 194.6, null],
                        "high":   [194.9, 195.3, 196.5],
                        "low":    [192.1, 193.0, 194.0],
                        "close":  [194.0, 194.3, 195.9],
                        "volume": [50080500, 47471400, 54156800]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).expect("parse failed")
    }

    #[test]
    fn chart_response_parses_into_snapshot() {
        let snapshot = parse(SAMPLE).into_snapshot().unwrap();
        // third row has a null open and is dropped
        assert_eq!(snapshot.series.len(), 2);
        let first = &snapshot.series.bars()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(first.open, 192.9);
        assert_eq!(first.close, 194.0);
        assert_eq!(first.volume, 50_080_500.0);

        assert_eq!(snapshot.metadata.display_name.as_deref(), Some("Apple Inc."));
        assert_eq!(snapshot.metadata.currency.as_deref(), Some("USD"));
        assert_eq!(snapshot.metadata.fifty_two_week_high, Some(260.1));
        assert_eq!(snapshot.metadata.volume, Some(45_123_456.0));
    }

    #[test]
    fn chart_error_is_absent() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse(json).into_snapshot().is_none());
    }

    #[test]
    fn empty_result_is_absent() {
        let json = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse(json).into_snapshot().is_none());
    }

    #[test]
    fn result_without_rows_is_absent() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(json).into_snapshot().is_none());
    }

    #[test]
    fn missing_metadata_fields_are_none() {
        let json = r#"{"chart":{"result":[{
            "meta":{"shortName":"ACME"},
            "timestamp":[1717421400],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[10]}]}
        }],"error":null}}"#;
        let snapshot = parse(json).into_snapshot().unwrap();
        assert_eq!(snapshot.metadata.display_name.as_deref(), Some("ACME"));
        assert_eq!(snapshot.metadata.fifty_two_week_low, None);
        assert_eq!(snapshot.metadata.volume, None);
    }

    #[test]
    fn overflowing_timestamp_row_is_dropped() {
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":3600},
            "timestamp":[1717421400, 9223372036854775807],
            "indicators":{"quote":[{"open":[1.0,2.0],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0,2.0],"volume":[10,20]}]}
        }],"error":null}}"#;
        let snapshot = parse(json).into_snapshot().unwrap();
        assert_eq!(snapshot.series.len(), 1);
        assert_eq!(snapshot.series.bars()[0].close, 1.0);
    }

    #[test]
    fn base_url_must_parse() {
        let config = ProviderConfig {
            base_url: "not a url".into(),
            ..ProviderConfig::default()
        };
        assert!(YahooProvider::new(&config).is_err());
    }

    /// Accept one connection, answer with `status` and `body`, and hand back the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (YahooProvider, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let head = String::from_utf8_lossy(&head).into_owned();
            head.lines().next().unwrap_or_default().to_owned()
        });

        let config = ProviderConfig {
            base_url: format!("http://{addr}"),
            ..ProviderConfig::default()
        };
        (YahooProvider::new(&config).unwrap(), handle)
    }

    fn request_target(line: &str) -> (String, String) {
        let target = line.split_whitespace().nth(1).unwrap();
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        (path.to_owned(), query.to_owned())
    }

    #[tokio::test]
    async fn fetch_requests_selected_period() {
        let (provider, server) = serve_once("200 OK", SAMPLE).await;
        let snapshot = provider.fetch("AAPL", Period::Year1).await.unwrap().unwrap();
        assert_eq!(snapshot.series.len(), 2);

        let line = server.await.unwrap();
        assert!(line.starts_with("GET "));
        let (path, query) = request_target(&line);
        assert_eq!(path, "/v8/finance/chart/AAPL");
        assert_eq!(query, "range=1y&interval=1d");
    }

    #[tokio::test]
    async fn fetch_not_found_is_absent() {
        let (provider, server) = serve_once("404 Not Found", "{}").await;
        let result = provider.fetch("ZZZZ", Period::Month1).await.unwrap();
        assert!(result.is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_server_error_is_request_error() {
        let (provider, server) = serve_once("500 Internal Server Error", "{}").await;
        let err = provider.fetch("AAPL", Period::Month6).await.unwrap_err();
        assert!(matches!(err.current_context(), FetchError::Request { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_keeps_symbol_inside_path() {
        let (provider, server) = serve_once("404 Not Found", "{}").await;
        let result = provider.fetch("MSFT?range=max&x=", Period::Month1).await.unwrap();
        assert!(result.is_none());

        let (path, query) = request_target(&server.await.unwrap());
        assert_eq!(path, "/v8/finance/chart/MSFT%3Frange=max&x=");
        assert_eq!(query, "range=1mo&interval=1d");
    }

    #[tokio::test]
    async fn fetch_encodes_slash_and_fragment() {
        let (provider, server) = serve_once("404 Not Found", "{}").await;
        provider.fetch("BRK/B#x", Period::Month3).await.unwrap();

        let (path, query) = request_target(&server.await.unwrap());
        assert_eq!(path, "/v8/finance/chart/BRK%2FB%23x");
        assert_eq!(query, "range=3mo&interval=1d");
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_chart() {
        let provider = YahooProvider::new(&ProviderConfig::default()).unwrap();
        let snapshot = provider.fetch("AAPL", Period::Month1).await.unwrap().unwrap();
        assert!(!snapshot.series.is_empty());
    }
}
