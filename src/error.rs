use crate::rain_data::error::RetrievalError;
use crate::stations::error::RegistryError;
use crate::types::station::StationId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegenstatError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to construct the HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Station {0} is not present in the station registry")]
    UnknownStation(StationId),

    #[error("Month {0} is out of range (expected 1-12)")]
    InvalidMonth(u32),

    #[error("No station available to resolve the request (station registry is empty)")]
    NoStationFound,

    #[error("A newer selection was made while this request was in flight")]
    SelectionSuperseded,

    #[error("Failed to write theme preference to '{0}'")]
    ThemeWrite(PathBuf, #[source] std::io::Error),
}
