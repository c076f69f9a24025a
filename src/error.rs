//! Error types shared across the dashboard pipeline.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single request against the statistics API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("API returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode API response: {0}")]
    Decode(String),
}

/// A filter change that would break the current selection's invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("start date {start} must not be after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("date {date} is outside the available range {min} to {max}")]
    OutOfBounds {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

#[derive(Error, Debug)]
pub enum PharsError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PharsError>;
