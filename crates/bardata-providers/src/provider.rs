use async_trait::async_trait;
use bardata_core::interval::Interval;
use bardata_core::raw::RawTable;
use chrono::NaiveDate;

use crate::error::ProviderError;

/// Trait for fetching raw OHLCV bar tables from an external source.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Provider name (for logging/display).
    fn name(&self) -> &str;

    /// Fetch bars for a symbol over a date range (inclusive) at the given
    /// interval. Returns the response as-is: nulls, composite columns, and
    /// ordering are preserved for the cleaner to deal with.
    /// Fails with [`ProviderError::NoData`] if the range holds no bars.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<RawTable, ProviderError>;
}
