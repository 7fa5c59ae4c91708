use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BarDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No data stored for {symbol} from {start} to {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
