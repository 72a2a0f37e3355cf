use thiserror::Error;

use crate::models::MonthKey;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid month key {0:?}, expected YYYY-MM")]
    InvalidMonth(String),
    #[error("month {0} is not in the catalog")]
    UnknownMonth(MonthKey),
    #[error("data unavailable for {month}: {source}")]
    DataUnavailable {
        month: MonthKey,
        #[source]
        source: LoadFailure,
    },
}

impl ChartError {
    pub fn unavailable(month: MonthKey, source: LoadFailure) -> Self {
        Self::DataUnavailable { month, source }
    }
}

/// Why one of a month's two resources could not be turned into records.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed rows in {resource}: {source}")]
    Csv {
        resource: String,
        #[source]
        source: csv::Error,
    },
    #[error("{resource} is missing column {column}")]
    MissingColumn {
        resource: String,
        column: &'static str,
    },
    #[error("{resource} row {row}: {column} = {value} is not a finite non-negative number")]
    InvalidValue {
        resource: String,
        row: usize,
        column: &'static str,
        value: f64,
    },
    #[error("{resource} has no rows")]
    Empty { resource: String },
}
