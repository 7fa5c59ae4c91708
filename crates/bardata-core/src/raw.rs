use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::bar::Bar;

/// One raw table cell, prior to type enforcement.
///
/// Providers hand back whatever the wire gave them; coercion to the final
/// numeric types happens in the cleaner. A failed coercion yields `None`,
/// which the cleaner treats as a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Float(f64),
    Int(i64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Coerce to a decimal price.
    pub fn as_price(&self) -> Option<Decimal> {
        match self {
            Cell::Null => None,
            Cell::Float(v) => Decimal::try_from(*v).ok(),
            Cell::Int(i) => Some(Decimal::from(*i)),
            Cell::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Coerce to an integer volume. Fractional or non-finite values fail.
    pub fn as_volume(&self) -> Option<i64> {
        fn from_f64(v: f64) -> Option<i64> {
            // i64::MAX as f64 rounds up to 2^63, which overflows i64
            (v.is_finite()
                && v.fract() == 0.0
                && v >= i64::MIN as f64
                && v < i64::MAX as f64)
                .then(|| v as i64)
        }

        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(*i),
            Cell::Float(v) => from_f64(*v),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| s.parse().ok().and_then(from_f64))
            }
        }
    }
}

/// The five canonical value fields of a price bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OhlcvField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl OhlcvField {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "open" => Some(OhlcvField::Open),
            "high" => Some(OhlcvField::High),
            "low" => Some(OhlcvField::Low),
            "close" => Some(OhlcvField::Close),
            "volume" => Some(OhlcvField::Volume),
            _ => None,
        }
    }
}

/// A possibly composite column name: an ordered list of string parts,
/// e.g. `["Open", "AAPL"]` when the provider nests columns per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKey {
    parts: Vec<String>,
}

impl ColumnKey {
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    pub fn nested(parts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Join the parts into a single flat name.
    pub fn flatten(&self) -> String {
        self.parts.join("_")
    }

    /// Which OHLCV field this column carries, keyed off the first part.
    pub fn field(&self) -> Option<OhlcvField> {
        self.parts.first().and_then(|p| OhlcvField::from_label(p))
    }
}

/// One raw row: a timestamp key plus one cell per column.
///
/// A row shorter than the table's column list is treated as having nulls
/// in the missing positions.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub timestamp: DateTime<Utc>,
    pub cells: Vec<Cell>,
}

/// An unmodified tabular provider response: column keys plus timestamped
/// rows. May contain nulls, non-numeric text, unsorted or duplicate
/// timestamps. The cleaner turns this into a valid bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<ColumnKey>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(columns: Vec<ColumnKey>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, timestamp: DateTime<Utc>, cells: Vec<Cell>) {
        self.rows.push(RawRow { timestamp, cells });
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Re-wrap cleaned bars as a flat raw table.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut table = Self::new(vec![
            ColumnKey::flat("Open"),
            ColumnKey::flat("High"),
            ColumnKey::flat("Low"),
            ColumnKey::flat("Close"),
            ColumnKey::flat("Volume"),
        ]);
        for bar in bars {
            table.push_row(
                bar.timestamp,
                vec![
                    Cell::Text(bar.open.to_string()),
                    Cell::Text(bar.high.to_string()),
                    Cell::Text(bar.low.to_string()),
                    Cell::Text(bar.close.to_string()),
                    Cell::Int(bar.volume),
                ],
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_key_flattens_to_itself() {
        assert_eq!(ColumnKey::flat("Open").flatten(), "Open");
    }

    #[test]
    fn nested_key_joins_with_underscore() {
        let key = ColumnKey::nested(["Close", "AAPL"]);
        assert_eq!(key.flatten(), "Close_AAPL");
        assert_eq!(key.field(), Some(OhlcvField::Close));
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        assert_eq!(ColumnKey::flat("volume").field(), Some(OhlcvField::Volume));
        assert_eq!(ColumnKey::flat("VOLUME").field(), Some(OhlcvField::Volume));
        assert_eq!(ColumnKey::flat("Adj Close").field(), None);
    }

    #[test]
    fn price_coercion() {
        assert_eq!(Cell::Text("100.5".into()).as_price(), Some(dec!(100.5)));
        assert_eq!(Cell::Int(100).as_price(), Some(dec!(100)));
        assert_eq!(Cell::Text("N/A".into()).as_price(), None);
        assert_eq!(Cell::Null.as_price(), None);
        assert_eq!(Cell::Float(f64::NAN).as_price(), None);
    }

    #[test]
    fn volume_coercion() {
        assert_eq!(Cell::Int(500).as_volume(), Some(500));
        assert_eq!(Cell::Float(500.0).as_volume(), Some(500));
        assert_eq!(Cell::Text("500".into()).as_volume(), Some(500));
        assert_eq!(Cell::Float(500.5).as_volume(), None);
        assert_eq!(Cell::Text("n/a".into()).as_volume(), None);
        assert_eq!(Cell::Null.as_volume(), None);
    }

    #[test]
    fn volume_coercion_rejects_out_of_range_floats() {
        // 2^63: representable as f64 but one past i64::MAX
        assert_eq!(Cell::Float(9_223_372_036_854_775_808.0).as_volume(), None);
        assert_eq!(Cell::Float(f64::INFINITY).as_volume(), None);
        assert_eq!(
            Cell::Float(-9_223_372_036_854_775_808.0).as_volume(),
            Some(i64::MIN)
        );
    }
}
