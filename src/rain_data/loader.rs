use crate::rain_data::error::RetrievalError;
use crate::types::daily::DailyRecord;
use crate::types::station::StationId;
use log::{info, warn};
use reqwest::Client;

/// Downloads per-station history files from the dashboard's static data
/// directory.
pub struct HistoryLoader {
    base_url: String,
    client: Client,
}

impl HistoryLoader {
    pub fn new(base_url: &str, client: Client) -> HistoryLoader {
        HistoryLoader {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Downloads and parses the full recorded history of one station.
    ///
    /// Any network failure, non-success status or malformed payload surfaces
    /// as a [`RetrievalError`]; the caller caches nothing in that case.
    pub async fn download(&self, station: StationId) -> Result<Vec<DailyRecord>, RetrievalError> {
        let url = format!("{}/{}", self.base_url, station.history_path());
        info!("Downloading history from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrievalError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    RetrievalError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    RetrievalError::NetworkRequest(url, e)
                });
            }
        };

        let records = response
            .json::<Vec<DailyRecord>>()
            .await
            .map_err(|e| RetrievalError::JsonParse { station, source: e })?;
        info!(
            "Downloaded {} daily records for station {}",
            records.len(),
            station
        );
        Ok(records)
    }
}
