use async_trait::async_trait;
use bardata_core::interval::Interval;
use bardata_core::raw::{Cell, ColumnKey, RawTable};
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::BarProvider;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance market data provider.
/// No authentication required. Limited to ~60 days of intraday history.
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_CHART_URL.to_string())
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Mozilla/5.0")
                .build()
                .expect("failed to build reqwest client"),
            base_url,
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

fn price_cell(values: &[Option<f64>], i: usize) -> Cell {
    match values.get(i).copied().flatten() {
        Some(v) => Cell::Float(v),
        None => Cell::Null,
    }
}

/// Build a raw table from one chart result, columns keyed per symbol the
/// way the API nests them. Missing values stay null; the cleaner decides
/// what to drop.
fn raw_table_from_result(symbol: &str, result: &YahooResult) -> Result<RawTable, ProviderError> {
    let mut table = RawTable::new(vec![
        ColumnKey::nested(["Open", symbol]),
        ColumnKey::nested(["High", symbol]),
        ColumnKey::nested(["Low", symbol]),
        ColumnKey::nested(["Close", symbol]),
        ColumnKey::nested(["Volume", symbol]),
    ]);

    let Some(timestamps) = result.timestamp.as_ref() else {
        return Ok(table);
    };
    if result.indicators.quote.is_empty() {
        return Ok(table);
    }

    let quote = &result.indicators.quote[0];
    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = Utc
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| ProviderError::Parse(format!("invalid unix timestamp: {ts}")))?;

        let volume = match quote.volume.get(i).copied().flatten() {
            Some(v) => Cell::Int(v),
            None => Cell::Null,
        };

        table.push_row(
            timestamp,
            vec![
                price_cell(&quote.open, i),
                price_cell(&quote.high, i),
                price_cell(&quote.low, i),
                price_cell(&quote.close, i),
                volume,
            ],
        );
    }

    Ok(table)
}

#[async_trait]
impl BarProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<RawTable, ProviderError> {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, symbol))
            .query(&[
                ("period1", &start_ts.to_string()),
                ("period2", &end_ts.to_string()),
                ("interval", &interval.to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 60,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: body,
            });
        }

        let body: YahooResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse response: {e}")))?;

        if let Some(error) = body.chart.error {
            return Err(ProviderError::Api {
                status: 0,
                message: format!("{}: {}", error.code, error.description),
            });
        }

        let results = body
            .chart
            .result
            .ok_or_else(|| ProviderError::Parse("no results in response".into()))?;

        let table = match results.first() {
            Some(result) => raw_table_from_result(symbol, result)?,
            None => RawTable::new(Vec::new()),
        };

        if table.is_empty() {
            return Err(ProviderError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        debug!("{symbol}: received {} raw row(s)", table.len());
        Ok(table)
    }
}
