//! Data providers for fetching raw OHLCV bar tables.

pub mod error;
pub mod provider;
pub mod yahoo;
