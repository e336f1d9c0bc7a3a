//! This module provides the main entry point for the precipitation data
//! client. It ties the station registry, the history retrieval pipeline and
//! the month aggregator together behind one application context that a
//! dashboard constructs at startup and keeps for its whole session.

use crate::aggregate::{aggregate, MonthAggregate};
use crate::error::RegenstatError;
use crate::rain_data::fetcher::HistoryFetcher;
use crate::rain_data::loader::HistoryLoader;
use crate::selection::{SelectionCounter, SelectionTag};
use crate::stations::locate;
use crate::stations::registry::{RegistrySource, StationRegistry};
use crate::theme::{self, Theme};
use crate::types::month::MonthKey;
use crate::types::station::{Station, StationId};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Every retrieval carries a timeout so a hung server cannot leave a
/// selection waiting forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second
/// (index 1). Both values are represented as `f64`.
///
/// # Examples
///
/// ```
/// use regenstat::LatLon;
///
/// let munich = LatLon(48.1374, 11.5755);
/// assert_eq!(munich.0, 48.1374); // Latitude
/// assert_eq!(munich.1, 11.5755); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// The result bundle handed to the presentation layer: one station, one
/// month, the month's sorted records and its summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPrecipitation {
    pub station_id: StationId,
    pub station_name: String,
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    pub aggregate: MonthAggregate,
}

/// The main client struct for accessing station and precipitation data.
///
/// `Regenstat` owns all mutable application state: the station registry, the
/// history cache and the selection generation counter. It is constructed once
/// at startup — see [`Regenstat::new`] or the [`Regenstat::connect`] builder —
/// and never torn down within a session.
///
/// The station registry starts empty; call [`Regenstat::refresh_stations`] to
/// populate it. A failed refresh leaves the registry untouched, so the client
/// stays usable (with an empty station list) and the caller decides how to
/// surface the error.
///
/// # Examples
///
/// ```no_run
/// # use regenstat::{Regenstat, RegenstatError, StationId};
/// # async fn run() -> Result<(), RegenstatError> {
/// let client = Regenstat::new("https://rain.example.org").await?;
/// client.refresh_stations().await?;
///
/// let report = client
///     .monthly()
///     .station(StationId(19897))
///     .year(2024)
///     .month(3)
///     .call()
///     .await?;
/// match report {
///     Some(data) => println!("{}: {:.1} mm total", data.station_name, data.aggregate.total_mm),
///     None => println!("no data for this month"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Regenstat {
    registry: StationRegistry,
    source: RegistrySource,
    fetcher: HistoryFetcher,
    selections: SelectionCounter,
    cache_folder: PathBuf,
}

#[bon]
impl Regenstat {
    /// Creates a client with explicit settings.
    ///
    /// # Arguments
    ///
    /// * `.base_url(&str)`: **Required.** Root URL the dashboard's static
    ///   files are served from; `stations.geojson` and `data/` live beneath it.
    /// * `.cache_folder(PathBuf)`: Optional. Directory for the station disk
    ///   cache and the theme preference. Defaults to a crate-named folder in
    ///   the system cache directory; created if it doesn't exist.
    /// * `.timeout(Duration)`: Optional. Per-request timeout, defaults to
    ///   [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`RegenstatError::CacheDirResolution`] /
    /// [`RegenstatError::CacheDirCreation`] when the cache directory cannot be
    /// determined or created, and [`RegenstatError::HttpClient`] when the HTTP
    /// client cannot be constructed.
    #[builder]
    pub async fn connect(
        base_url: &str,
        cache_folder: Option<PathBuf>,
        timeout: Option<Duration>,
    ) -> Result<Self, RegenstatError> {
        let cache_folder = match cache_folder {
            Some(folder) => folder,
            None => get_cache_dir().map_err(RegenstatError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| RegenstatError::CacheDirCreation(cache_folder.clone(), e))?;

        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(RegenstatError::HttpClient)?;

        Ok(Self {
            registry: StationRegistry::empty(),
            source: RegistrySource::new(base_url, client.clone(), &cache_folder),
            fetcher: HistoryFetcher::new(HistoryLoader::new(base_url, client)),
            selections: SelectionCounter::default(),
            cache_folder,
        })
    }

    /// Creates a client with default cache location and timeout.
    pub async fn new(base_url: &str) -> Result<Self, RegenstatError> {
        Self::connect().base_url(base_url).call().await
    }

    /// Populates the station registry, from the disk cache when present and
    /// from the network otherwise. Returns the number of stations loaded.
    ///
    /// On error the registry keeps its previous contents (empty on the first
    /// call); the application stays usable and the caller reports the
    /// failure as a notification.
    pub async fn refresh_stations(&self) -> Result<usize, RegenstatError> {
        let stations = self.source.load().await?;
        let count = stations.len();
        self.registry.replace_all(stations);
        Ok(count)
    }

    /// The station registry backing lookups and nearest-station queries.
    pub fn stations(&self) -> &StationRegistry {
        &self.registry
    }

    /// Starts a new user selection, invalidating the tags of every request
    /// still in flight. Pass the tag to [`Regenstat::monthly`] to have stale
    /// completions rejected as [`RegenstatError::SelectionSuperseded`].
    pub fn begin_selection(&self) -> SelectionTag {
        self.selections.begin()
    }

    /// Picks the station for a fresh session: the one nearest to `location`,
    /// or the default station when no location is available (geolocation
    /// denied or unsupported) or the registry is empty.
    pub fn resolve_station(&self, location: Option<LatLon>) -> StationId {
        locate::resolve_station(&self.registry, location)
    }

    /// Loads one month of one station's precipitation.
    ///
    /// Runs the full pipeline: cache-or-fetch the station's history, then
    /// filter and summarize the requested month.
    ///
    /// # Arguments
    ///
    /// * `.station(StationId)`: **Required.** Must be present in the registry.
    /// * `.year(i32)` / `.month(u32)`: **Required.** The calendar month, month 1-12.
    /// * `.tag(SelectionTag)`: Optional. The selection this request belongs
    ///   to; see [`Regenstat::begin_selection`].
    ///
    /// # Returns
    ///
    /// `Ok(Some(..))` with the result bundle, or `Ok(None)` when the station
    /// has no records in that month — "no data" is a normal outcome, distinct
    /// from every error.
    ///
    /// # Errors
    ///
    /// [`RegenstatError::InvalidMonth`], [`RegenstatError::UnknownStation`],
    /// [`RegenstatError::SelectionSuperseded`], or a transparent
    /// [`crate::RetrievalError`] when the download fails (in which case
    /// nothing was cached and the same call can simply be retried).
    #[builder]
    pub async fn monthly(
        &self,
        station: StationId,
        year: i32,
        month: u32,
        tag: Option<SelectionTag>,
    ) -> Result<Option<MonthlyPrecipitation>, RegenstatError> {
        if !(1..=12).contains(&month) {
            return Err(RegenstatError::InvalidMonth(month));
        }
        let station_name = self
            .registry
            .name(station)
            .ok_or(RegenstatError::UnknownStation(station))?;

        let records = self
            .fetcher
            .fetch_month(MonthKey::new(station, year, month))
            .await?;

        // The cache write above is kept even for a stale selection (the data
        // is immutable); only the visible result is discarded.
        if let Some(tag) = tag {
            if !self.selections.is_current(tag) {
                return Err(RegenstatError::SelectionSuperseded);
            }
        }

        Ok(aggregate(&records, year, month).map(|aggregate| MonthlyPrecipitation {
            station_id: station,
            station_name,
            year,
            month,
            aggregate,
        }))
    }

    /// Like [`Regenstat::monthly`], but for the station nearest to a
    /// geographical location.
    ///
    /// # Errors
    ///
    /// [`RegenstatError::NoStationFound`] when the registry is empty; otherwise
    /// as [`Regenstat::monthly`].
    #[builder]
    pub async fn monthly_near(
        &self,
        location: LatLon,
        year: i32,
        month: u32,
        tag: Option<SelectionTag>,
    ) -> Result<Option<MonthlyPrecipitation>, RegenstatError> {
        let (station, _) = locate::nearest_station(&self.registry, location.0, location.1)
            .ok_or(RegenstatError::NoStationFound)?;
        self.monthly()
            .station(station.id)
            .year(year)
            .month(month)
            .maybe_tag(tag)
            .call()
            .await
    }

    /// Finds registered stations near a location, closest first.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The search center.
    /// * `.station_limit(usize)`: Optional. Maximum results, defaults to `5`.
    /// * `.max_distance_km(f64)`: Optional. Search radius; unlimited when absent.
    #[builder]
    pub fn find_stations(
        &self,
        location: LatLon,
        station_limit: Option<usize>,
        max_distance_km: Option<f64>,
    ) -> Vec<(Station, f64)> {
        locate::nearest_stations(
            &self.registry,
            location.0,
            location.1,
            station_limit.unwrap_or(5),
            max_distance_km,
        )
    }

    /// The persisted theme preference; light unless `"dark"` was saved.
    pub async fn theme(&self) -> Theme {
        theme::load_theme(&self.cache_folder).await
    }

    /// Persists the theme preference.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), RegenstatError> {
        theme::save_theme(&self.cache_folder, theme).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stations_geojson() -> serde_json::Value {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [10.0, 50.0]},
                    "properties": {
                        "station_id": "00001",
                        "station_name": "Alpha",
                        "elevation": 312.0,
                        "federal_state": "Bayern"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [11.0, 51.0]},
                    "properties": {
                        "station_id": "00002",
                        "station_name": "Beta",
                        "elevation": null,
                        "federal_state": "Hessen"
                    }
                }
            ]
        })
    }

    fn history_json() -> serde_json::Value {
        serde_json::json!([
            {"date": "2024-03-01", "precipitation": 2.0},
            {"date": "2024-03-05", "precipitation": 0.0},
            {"date": "2024-03-02", "precipitation": 4.0},
            {"date": "2024-01-15", "precipitation": 9.0}
        ])
    }

    async fn mount_stations(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/stations.geojson"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stations_geojson()))
            .mount(server)
            .await;
    }

    async fn mount_history(server: &MockServer, station_path: &str) {
        Mock::given(method("GET"))
            .and(path(station_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json()))
            .mount(server)
            .await;
    }

    async fn client_for(server: &MockServer, cache: &tempfile::TempDir) -> Regenstat {
        Regenstat::connect()
            .base_url(&server.uri())
            .cache_folder(cache.path().to_path_buf())
            .timeout(Duration::from_secs(5))
            .call()
            .await
            .expect("client should connect")
    }

    #[tokio::test]
    async fn monthly_runs_the_full_pipeline() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        mount_history(&server, "/data/rain_data_00001.json").await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;

        assert_eq!(client.refresh_stations().await.unwrap(), 2);

        let report = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(3)
            .call()
            .await
            .unwrap()
            .expect("march has data");

        assert_eq!(report.station_name, "Alpha");
        assert_eq!(report.year, 2024);
        assert_eq!(report.month, 3);
        assert_eq!(report.aggregate.records.len(), 3);
        assert_eq!(report.aggregate.total_mm, 6.0);
        assert_eq!(report.aggregate.rainy_days, 2);
        assert_eq!(report.aggregate.daily_mean_mm, 2.0);
        // Sorted ascending even though the source is shuffled.
        assert!(report
            .aggregate
            .records
            .windows(2)
            .all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    async fn empty_month_is_ok_none() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        mount_history(&server, "/data/rain_data_00001.json").await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;
        client.refresh_stations().await.unwrap();

        let report = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(7)
            .call()
            .await
            .unwrap();
        assert_eq!(report, None);
    }

    #[tokio::test]
    async fn unknown_station_and_invalid_month_are_rejected() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;
        client.refresh_stations().await.unwrap();

        let err = client
            .monthly()
            .station(StationId(999))
            .year(2024)
            .month(3)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RegenstatError::UnknownStation(StationId(999))));

        let err = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(13)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RegenstatError::InvalidMonth(13)));
    }

    #[tokio::test]
    async fn failed_history_fetch_is_retried_not_cached() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        Mock::given(method("GET"))
            .and(path("/data/rain_data_00001.json"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/rain_data_00001.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_json()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;
        client.refresh_stations().await.unwrap();

        let err = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(3)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RegenstatError::Retrieval(_)));

        // Same selection again: the failure was not cached.
        let report = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(3)
            .call()
            .await
            .unwrap();
        assert!(report.is_some());
    }

    #[tokio::test]
    async fn stale_selection_is_discarded() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        mount_history(&server, "/data/rain_data_00001.json").await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;
        client.refresh_stations().await.unwrap();

        let stale = client.begin_selection();
        let current = client.begin_selection();

        let err = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(3)
            .tag(stale)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RegenstatError::SelectionSuperseded));

        let report = client
            .monthly()
            .station(StationId(1))
            .year(2024)
            .month(3)
            .tag(current)
            .call()
            .await
            .unwrap();
        assert!(report.is_some());
    }

    #[tokio::test]
    async fn failed_registry_refresh_leaves_the_client_usable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stations.geojson"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;

        let err = client.refresh_stations().await.unwrap_err();
        assert!(matches!(err, RegenstatError::Registry(_)));
        assert!(client.stations().is_empty());
        // Lookups and resolution still work against the empty registry.
        assert_eq!(
            client.resolve_station(Some(LatLon(50.0, 10.0))),
            locate::DEFAULT_STATION
        );
    }

    #[tokio::test]
    async fn second_refresh_uses_the_disk_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stations.geojson"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stations_geojson()))
            .expect(1)
            .mount(&server)
            .await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;

        assert_eq!(client.refresh_stations().await.unwrap(), 2);
        assert_eq!(client.refresh_stations().await.unwrap(), 2);
        // expect(1) verifies the second refresh never reached the network.
    }

    #[tokio::test]
    async fn monthly_near_picks_the_nearest_station() {
        let server = MockServer::start().await;
        mount_stations(&server).await;
        mount_history(&server, "/data/rain_data_00002.json").await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;
        client.refresh_stations().await.unwrap();

        let report = client
            .monthly_near()
            .location(LatLon(51.1, 11.1))
            .year(2024)
            .month(1)
            .call()
            .await
            .unwrap()
            .expect("january has data");
        assert_eq!(report.station_id, StationId(2));
        assert_eq!(report.station_name, "Beta");
    }

    #[tokio::test]
    async fn monthly_near_needs_a_populated_registry() {
        let server = MockServer::start().await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;

        let err = client
            .monthly_near()
            .location(LatLon(51.1, 11.1))
            .year(2024)
            .month(1)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, RegenstatError::NoStationFound));
    }

    #[tokio::test]
    async fn theme_round_trips_through_the_cache_folder() {
        let server = MockServer::start().await;
        let cache = tempfile::tempdir().unwrap();
        let client = client_for(&server, &cache).await;

        assert_eq!(client.theme().await, Theme::Light);
        client.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(client.theme().await, Theme::Dark);
    }
}
