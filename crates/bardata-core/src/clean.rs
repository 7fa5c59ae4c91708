use rust_decimal::Decimal;

use crate::bar::Bar;
use crate::raw::{Cell, OhlcvField, RawRow, RawTable};

/// What to do with bars whose volume is zero.
///
/// A zero-volume bar can be read as a valid "no trade occurred" sample or
/// as dead data. The default drops them: downstream consumers treat a bar
/// as evidence of trading activity, and intraday feeds pad quiet minutes
/// with synthetic zero-volume rows. Negative volume is invalid under
/// either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VolumePolicy {
    /// Drop rows whose volume is not strictly positive.
    #[default]
    DropZeroVolume,
    /// Keep zero-volume rows as valid no-trade bars.
    KeepZeroVolume,
}

/// Clean a raw OHLCV table into a valid bar series.
///
/// Pure and deterministic: no I/O, no logging. In order:
/// 1. flatten composite columns and locate the five OHLCV fields,
/// 2. drop rows with a null in any column,
/// 3. sort ascending by timestamp, dropping duplicate timestamps
///    (first occurrence wins),
/// 4. apply the volume policy,
/// 5. coerce prices to `Decimal` and volume to integer, dropping rows
///    where coercion fails.
///
/// An empty input yields an empty output. If any of the five field columns
/// is absent entirely, every row is incomplete and the output is empty.
pub fn clean(raw: &RawTable, policy: VolumePolicy) -> Vec<Bar> {
    let col_of = |field: OhlcvField| {
        raw.columns()
            .iter()
            .position(|key| key.field() == Some(field))
    };

    let Some(open_col) = col_of(OhlcvField::Open) else {
        return Vec::new();
    };
    let Some(high_col) = col_of(OhlcvField::High) else {
        return Vec::new();
    };
    let Some(low_col) = col_of(OhlcvField::Low) else {
        return Vec::new();
    };
    let Some(close_col) = col_of(OhlcvField::Close) else {
        return Vec::new();
    };
    let Some(volume_col) = col_of(OhlcvField::Volume) else {
        return Vec::new();
    };

    let column_count = raw.columns().len();

    // Short rows are missing cells, which count as nulls.
    let mut rows: Vec<&RawRow> = raw
        .rows()
        .iter()
        .filter(|row| row.cells.len() == column_count && !row.cells.iter().any(Cell::is_null))
        .collect();

    rows.sort_by_key(|row| row.timestamp);
    rows.dedup_by_key(|row| row.timestamp);

    // Negative volume is invalid under either policy; only zero is contested.
    rows.retain(|row| {
        row.cells[volume_col]
            .as_volume()
            .is_none_or(|volume| match policy {
                VolumePolicy::DropZeroVolume => volume > 0,
                VolumePolicy::KeepZeroVolume => volume >= 0,
            })
    });

    rows.iter()
        .filter_map(|row| {
            let price = |col: usize| -> Option<Decimal> { row.cells[col].as_price() };
            Some(Bar {
                timestamp: row.timestamp,
                open: price(open_col)?,
                high: price(high_col)?,
                low: price(low_col)?,
                close: price(close_col)?,
                volume: row.cells[volume_col].as_volume()?,
            })
        })
        .collect()
}
