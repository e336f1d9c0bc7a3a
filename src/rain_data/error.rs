use crate::types::station::StationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse history data for station {station}")]
    JsonParse {
        station: StationId,
        #[source]
        source: reqwest::Error,
    },
}
