use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the trip analytics engine.
///
/// Every variant is a local, recoverable failure; the caller decides whether
/// to re-prompt, report or exit.
#[derive(Debug, Error)]
pub enum Error {
    /// City name outside the supported set.
    #[error("unknown city '{0}' (expected Chicago, New York City or Washington)")]
    UnknownCity(String),

    /// Month name outside January..June (or "all").
    #[error("unknown month '{0}' (expected January to June, or all)")]
    UnknownMonth(String),

    /// Day name outside Monday..Sunday (or "all").
    #[error("unknown day '{0}' (expected Monday to Sunday, or all)")]
    UnknownDay(String),

    /// No backing file exists for the city.
    #[error("no trip data found for {city} under {}", .root.display())]
    DatasetNotFound { city: String, root: PathBuf },

    /// A required column is absent from the source header.
    #[error("source for {city} is missing required column '{column}'")]
    MissingColumn { city: String, column: &'static str },

    /// A row could not be turned into a valid trip record.
    #[error("line {line}: cannot parse {column} from '{value}'")]
    MalformedRow {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// A row the source could not decode into text cells.
    #[error("line {line}: unreadable row ({reason})")]
    UndecodableRow { line: usize, reason: String },

    /// File extension with no reader.
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// JSON payload that is not an array of objects.
    #[error("invalid JSON records: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, Error>;
