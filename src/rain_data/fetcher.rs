use crate::rain_data::error::RetrievalError;
use crate::rain_data::loader::HistoryLoader;
use crate::types::daily::DailyRecord;
use crate::types::month::MonthKey;
use crate::types::station::StationId;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-lifetime memoization over station history downloads.
///
/// Keys are `(station, year, month)` selections, but the cached value is
/// always the station's *full* history, so every key for one station aliases
/// the same `Arc`: at most one download is ever issued per station file, and
/// entries are never evicted.
pub struct HistoryFetcher {
    loader: HistoryLoader,
    cache: Mutex<HistoryCache>,
}

#[derive(Default)]
struct HistoryCache {
    by_month: HashMap<MonthKey, Arc<[DailyRecord]>>,
    by_station: HashMap<StationId, Arc<[DailyRecord]>>,
}

impl HistoryFetcher {
    pub fn new(loader: HistoryLoader) -> Self {
        Self {
            loader,
            cache: Mutex::new(HistoryCache::default()),
        }
    }

    /// Returns the full history backing the given month selection, from the
    /// cache when possible.
    ///
    /// On failure nothing is written, so the next identical call hits the
    /// network again. Concurrent misses for one station may download twice;
    /// the first result to land is kept and the station files are immutable,
    /// so the duplicate is only wasted bandwidth.
    pub async fn fetch_month(&self, key: MonthKey) -> Result<Arc<[DailyRecord]>, RetrievalError> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(records) = cache.by_month.get(&key) {
                debug!("Cache hit for {}", key);
                return Ok(records.clone());
            }
            if let Some(records) = cache.by_station.get(&key.station).cloned() {
                // Another month of this station is already cached and the
                // file holds the full history: alias it under the new key.
                debug!("Reusing fetched history of station {} for {}", key.station, key);
                cache.by_month.insert(key, records.clone());
                return Ok(records);
            }
        } // lock released before the download

        warn!("Cache miss for {}. Downloading station history.", key);
        let downloaded: Arc<[DailyRecord]> = self.loader.download(key.station).await?.into();

        let mut cache = self.cache.lock().await;
        // A concurrent fetch may have landed while we were downloading, either
        // for this exact key or for another month of the same station. Adopt
        // whatever is already shared so every entry for the station stays
        // reference-identical.
        let shared = cache
            .by_month
            .get(&key)
            .or_else(|| cache.by_station.get(&key.station))
            .cloned()
            .unwrap_or(downloaded);
        cache.by_month.insert(key, shared.clone());
        cache
            .by_station
            .entry(key.station)
            .or_insert_with(|| shared.clone());
        Ok(shared)
    }
}
