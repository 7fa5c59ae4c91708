use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::bar::Bar;
use crate::error::BarDataError;
use crate::raw::{Cell, RawTable};

/// Column order for cleaned bar files.
pub const BAR_HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn cell_to_field(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Float(v) => v.to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::Text(s) => s.clone(),
    }
}

/// Write a raw table as CSV with flattened column headers.
/// Nulls become empty fields.
pub fn write_raw_csv(path: &Path, raw: &RawTable) -> Result<(), BarDataError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["timestamp".to_string()];
    header.extend(raw.columns().iter().map(|key| key.flatten()));
    writer.write_record(&header)?;

    for row in raw.rows() {
        let mut record = vec![format_timestamp(row.timestamp)];
        record.extend(row.cells.iter().map(cell_to_field));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write cleaned bars as CSV.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), BarDataError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(BAR_HEADER)?;

    for bar in bars {
        writer.write_record([
            format_timestamp(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Read cleaned bars back from CSV.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, BarDataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.len() != BAR_HEADER.len() {
            return Err(BarDataError::InvalidData(format!(
                "expected {} fields, got {}",
                BAR_HEADER.len(),
                record.len()
            )));
        }

        let timestamp = DateTime::parse_from_rfc3339(&record[0])
            .map_err(|e| BarDataError::InvalidData(format!("invalid timestamp '{}': {e}", &record[0])))?
            .with_timezone(&Utc);

        let price = |i: usize| {
            record[i].parse().map_err(|e| {
                BarDataError::InvalidData(format!("invalid {} '{}': {e}", BAR_HEADER[i], &record[i]))
            })
        };

        let volume = record[5].parse().map_err(|e| {
            BarDataError::InvalidData(format!("invalid volume '{}': {e}", &record[5]))
        })?;

        bars.push(Bar {
            timestamp,
            open: price(1)?,
            high: price(2)?,
            low: price(3)?,
            close: price(4)?,
            volume,
        });
    }

    Ok(bars)
}
