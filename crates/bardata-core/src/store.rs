use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::bar::Bar;
use crate::error::BarDataError;
use crate::interval::Interval;
use crate::raw::RawTable;
use crate::schema;

/// Filesystem-backed store for raw and cleaned bar data in CSV format.
///
/// Layout: `{root}/data/raw/{SYMBOL}_{start}_{end}_{interval}.csv` and
/// `{root}/data/processed/{SYMBOL}_{start}_{end}_{interval}_cleaned.csv`.
pub struct BarStore {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl BarStore {
    /// Create a store rooted at the given directory.
    /// The `data/raw` and `data/processed` subdirectories are used
    /// automatically; call [`ensure_dirs`](Self::ensure_dirs) before writing.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let data_dir = root.as_ref().join("data");
        Self {
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
        }
    }

    /// Create both storage directories if absent.
    pub fn ensure_dirs(&self) -> Result<(), BarDataError> {
        std::fs::create_dir_all(&self.raw_dir)?;
        std::fs::create_dir_all(&self.processed_dir)?;
        Ok(())
    }

    fn file_stem(symbol: &str, start: NaiveDate, end: NaiveDate, interval: Interval) -> String {
        format!("{symbol}_{start}_{end}_{interval}")
    }

    /// Path to the raw CSV file for a fetch tuple.
    pub fn raw_path(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> PathBuf {
        self.raw_dir
            .join(format!("{}.csv", Self::file_stem(symbol, start, end, interval)))
    }

    /// Path to the cleaned CSV file for a fetch tuple.
    pub fn processed_path(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> PathBuf {
        self.processed_dir.join(format!(
            "{}_cleaned.csv",
            Self::file_stem(symbol, start, end, interval)
        ))
    }

    /// Write the unmodified provider response. Overwrites if present.
    pub fn write_raw(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
        raw: &RawTable,
    ) -> Result<(), BarDataError> {
        schema::write_raw_csv(&self.raw_path(symbol, start, end, interval), raw)
    }

    /// Write cleaned bars. Overwrites if present.
    pub fn write_cleaned(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
        bars: &[Bar],
    ) -> Result<(), BarDataError> {
        schema::write_bars_csv(&self.processed_path(symbol, start, end, interval), bars)
    }

    /// Read cleaned bars back for a fetch tuple.
    pub fn read_cleaned(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<Bar>, BarDataError> {
        let path = self.processed_path(symbol, start, end, interval);
        if !path.exists() {
            return Err(BarDataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        schema::read_bars_csv(&path)
    }

    /// Check whether a cleaned file exists for a fetch tuple.
    pub fn has_cleaned(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> bool {
        self.processed_path(symbol, start, end, interval).exists()
    }

    /// List cleaned dataset file names, sorted. Optionally filter by symbol.
    pub fn list_cleaned(&self, symbol: Option<&str>) -> Result<Vec<String>, BarDataError> {
        if !self.processed_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.processed_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.ends_with("_cleaned.csv") {
                continue;
            }
            if let Some(sym) = symbol
                && !name.starts_with(&format!("{sym}_"))
            {
                continue;
            }
            names.push(name.to_string());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{Cell, ColumnKey};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_bars() -> Vec<Bar> {
        vec![
            Bar {
                timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 14, 30, 0).unwrap(),
                open: dec!(150.00),
                high: dec!(151.00),
                low: dec!(149.00),
                close: dec!(150.50),
                volume: 1000,
            },
            Bar {
                timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 14, 31, 0).unwrap(),
                open: dec!(150.50),
                high: dec!(152.00),
                low: dec!(150.00),
                close: dec!(151.00),
                volume: 2000,
            },
        ]
    }

    fn sample_raw() -> RawTable {
        let mut raw = RawTable::new(vec![
            ColumnKey::nested(["Open", "AAPL"]),
            ColumnKey::nested(["High", "AAPL"]),
            ColumnKey::nested(["Low", "AAPL"]),
            ColumnKey::nested(["Close", "AAPL"]),
            ColumnKey::nested(["Volume", "AAPL"]),
        ]);
        raw.push_row(
            Utc.with_ymd_and_hms(2026, 1, 5, 14, 30, 0).unwrap(),
            vec![
                Cell::Float(150.0),
                Cell::Float(151.0),
                Cell::Float(149.0),
                Cell::Float(150.5),
                Cell::Int(1000),
            ],
        );
        raw
    }

    #[test]
    fn path_formats() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());

        let raw = store.raw_path(
            "AAPL",
            date(2026, 1, 5),
            date(2026, 1, 11),
            Interval::OneMinute,
        );
        assert_eq!(
            raw,
            dir.path().join("data/raw/AAPL_2026-01-05_2026-01-11_1m.csv")
        );

        let processed = store.processed_path(
            "AAPL",
            date(2026, 1, 5),
            date(2026, 1, 11),
            Interval::OneMinute,
        );
        assert_eq!(
            processed,
            dir.path()
                .join("data/processed/AAPL_2026-01-05_2026-01-11_1m_cleaned.csv")
        );
    }

    #[test]
    fn ensure_dirs_creates_both() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        store.ensure_dirs().unwrap();
        assert!(dir.path().join("data/raw").exists());
        assert!(dir.path().join("data/processed").exists());
    }

    #[test]
    fn write_and_read_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        store.ensure_dirs().unwrap();

        let bars = sample_bars();
        store
            .write_cleaned(
                "AAPL",
                date(2026, 1, 5),
                date(2026, 1, 11),
                Interval::OneMinute,
                &bars,
            )
            .unwrap();
        assert!(store.has_cleaned(
            "AAPL",
            date(2026, 1, 5),
            date(2026, 1, 11),
            Interval::OneMinute
        ));

        let result = store
            .read_cleaned(
                "AAPL",
                date(2026, 1, 5),
                date(2026, 1, 11),
                Interval::OneMinute,
            )
            .unwrap();
        assert_eq!(result, bars);
    }

    #[test]
    fn read_cleaned_missing_returns_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        store.ensure_dirs().unwrap();

        let result = store.read_cleaned(
            "AAPL",
            date(2026, 1, 5),
            date(2026, 1, 11),
            Interval::OneMinute,
        );
        assert!(matches!(result, Err(BarDataError::NoData { .. })));
    }

    #[test]
    fn write_raw_preserves_provider_response() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        store.ensure_dirs().unwrap();

        store
            .write_raw(
                "AAPL",
                date(2026, 1, 5),
                date(2026, 1, 11),
                Interval::OneMinute,
                &sample_raw(),
            )
            .unwrap();

        let contents = std::fs::read_to_string(store.raw_path(
            "AAPL",
            date(2026, 1, 5),
            date(2026, 1, 11),
            Interval::OneMinute,
        ))
        .unwrap();
        assert!(contents.starts_with("timestamp,Open_AAPL,High_AAPL"));
    }

    #[test]
    fn list_cleaned_filters_by_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        store.ensure_dirs().unwrap();

        let bars = sample_bars();
        store
            .write_cleaned(
                "AAPL",
                date(2026, 1, 5),
                date(2026, 1, 11),
                Interval::OneMinute,
                &bars,
            )
            .unwrap();
        store
            .write_cleaned(
                "MSFT",
                date(2026, 1, 5),
                date(2026, 1, 11),
                Interval::OneMinute,
                &bars,
            )
            .unwrap();

        let all = store.list_cleaned(None).unwrap();
        assert_eq!(all.len(), 2);

        let aapl = store.list_cleaned(Some("AAPL")).unwrap();
        assert_eq!(aapl, vec!["AAPL_2026-01-05_2026-01-11_1m_cleaned.csv"]);
    }

    #[test]
    fn list_cleaned_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = BarStore::new(dir.path());
        assert!(store.list_cleaned(None).unwrap().is_empty());
    }
}
