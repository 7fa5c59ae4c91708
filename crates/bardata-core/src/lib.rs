//! Core types, the OHLCV table cleaner, and the CSV-backed store for
//! historical bar data.

pub mod bar;
pub mod clean;
pub mod error;
pub mod interval;
pub mod raw;
pub mod schema;
pub mod store;
