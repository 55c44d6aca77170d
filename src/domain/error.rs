use thiserror::Error;

/// Why an inbound envelope could not be turned into a [`FileToProcess`].
///
/// The `Display` text is the exact response body callers expect.
///
/// [`FileToProcess`]: crate::domain::models::FileToProcess
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("No message received")]
    MissingMessage,
    #[error("Invalid message format")]
    InvalidEnvelope,
    #[error("No data in message")]
    MissingData,
    #[error("Invalid base64 data")]
    InvalidEncoding,
    #[error("Invalid JSON data")]
    InvalidPayload,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
    #[error("access to {bucket}/{key} denied: {cause}")]
    PermissionDenied {
        bucket: String,
        key: String,
        cause: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("object {bucket}/{key} is not valid UTF-8 text")]
    InvalidText { bucket: String, key: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("row {row}: sku must not be empty")]
    EmptySku { row: usize },
    #[error("row {row}: quantity must be non-negative, got {quantity}")]
    NegativeQuantity { row: usize, quantity: i64 },
    #[error("row {row}: invalid unit_price '{value}'")]
    InvalidPrice { row: usize, value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("unit of work already finished")]
    Finished,
    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

/// Failure of one reconciliation pass. Every variant is returned only after
/// the unit of work has been rolled back.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Error procesando el archivo: {0}")]
    Fetch(#[from] FetchError),
    #[error("Error procesando el archivo: {0}")]
    Parse(#[from] ParseError),
    #[error("Error procesando el archivo: {0}")]
    Store(#[from] StoreError),
}

impl ReconciliationError {
    /// Text of the underlying cause, without the prefix.
    pub fn cause(&self) -> String {
        match self {
            Self::Fetch(e) => e.to_string(),
            Self::Parse(e) => e.to_string(),
            Self::Store(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_render_response_bodies() {
        assert_eq!(DecodeError::MissingMessage.to_string(), "No message received");
        assert_eq!(
            DecodeError::MissingField("filename").to_string(),
            "Missing required field: filename"
        );
    }

    #[test]
    fn reconciliation_error_embeds_cause() {
        let err = ReconciliationError::from(FetchError::Transport("Error de descarga".into()));
        assert_eq!(err.to_string(), "Error procesando el archivo: Error de descarga");
        assert_eq!(err.cause(), "Error de descarga");
    }
}
