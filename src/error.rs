use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// A required field was absent. Fatal for the item it belongs to, never for the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("required field '{0}' not found")]
    MissingField(&'static str),

    #[error("no skin id in url {0}")]
    MissingSkinId(String),
}

/// Operator-supplied range rejected before any page is fetched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("min range can not be lower than 1 (got {0})")]
    MinBelowOne(i64),

    #[error("max range {max} is higher than the last skin id in the database ({last})")]
    MaxAboveStore { max: i64, last: i64 },

    #[error("min range {min} is greater than max range {max}")]
    Inverted { min: i64, max: i64 },
}
