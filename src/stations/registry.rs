//! The station registry: parses the GeoJSON station collection into an
//! insertion-ordered station list and serves id lookups for the rest of the
//! crate. Parsed stations are cached on disk so later startups skip the
//! network entirely.

use crate::stations::error::RegistryError;
use crate::types::station::{Location, Station, StationId};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const STATIONS_FILE: &str = "stations.geojson";
const BINCODE_CACHE_FILE_NAME: &str = "stations.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Holds the immutable station set for the application's lifetime.
///
/// Constructed empty and populated once from the station feature collection.
/// Stations keep their source order, which also fixes the iteration order of
/// the nearest-station scan. A failed load leaves the registry exactly as it
/// was, so the application stays usable with an empty station list.
#[derive(Debug, Default)]
pub struct StationRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    stations: Vec<Station>,
    by_id: HashMap<StationId, usize>,
}

impl StationRegistry {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry directly from an already-parsed station list, e.g.
    /// the output of [`parse_features`].
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let registry = Self::default();
        registry.replace_all(stations);
        registry
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the full station record for `id`, or `None` if absent.
    pub fn get(&self, id: StationId) -> Option<Station> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.by_id.get(&id).map(|&idx| inner.stations[idx].clone())
    }

    /// Returns the display name for `id`, or `None` if absent.
    pub fn name(&self, id: StationId) -> Option<String> {
        self.get(id).map(|station| station.name)
    }

    /// All stations in source order.
    pub fn snapshot(&self) -> Vec<Station> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .stations
            .clone()
    }

    /// Runs `f` over the stations without cloning the list. Used by the
    /// nearest-station scan, which needs the source iteration order.
    pub(crate) fn with_stations<R>(&self, f: impl FnOnce(&[Station]) -> R) -> R {
        f(&self.inner.read().expect("registry lock poisoned").stations)
    }

    /// Replaces the registry contents with `stations`.
    ///
    /// Repeated identifiers follow the source's last-write-wins rule: the
    /// later record replaces the earlier one in place, keeping the first
    /// occurrence's position. Whether that overwrite is intentional upstream
    /// is unresolved, so each one is logged.
    pub(crate) fn replace_all(&self, stations: Vec<Station>) {
        let mut inner = Inner {
            stations: Vec::with_capacity(stations.len()),
            by_id: HashMap::with_capacity(stations.len()),
        };
        for station in stations {
            match inner.by_id.get(&station.id) {
                Some(&idx) => {
                    warn!(
                        "Duplicate station id {} in station collection; keeping the later record",
                        station.id
                    );
                    inner.stations[idx] = station;
                }
                None => {
                    inner.by_id.insert(station.id, inner.stations.len());
                    inner.stations.push(station);
                }
            }
        }
        *self.inner.write().expect("registry lock poisoned") = inner;
    }
}

/// Parses a GeoJSON feature collection into stations, in feature order.
///
/// The source encodes station ids as zero-padded strings; plain numbers are
/// accepted too. Coordinates are GeoJSON `[longitude, latitude]` pairs.
pub fn parse_features(geojson: &str) -> Result<Vec<Station>, RegistryError> {
    let collection: FeatureCollection = serde_json::from_str(geojson)?;
    collection
        .features
        .into_iter()
        .map(Station::try_from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: FeatureGeometry,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    station_id: RawStationId,
    station_name: String,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    federal_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureGeometry {
    /// `[longitude, latitude]`, per GeoJSON.
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStationId {
    Number(u32),
    Text(String),
}

impl TryFrom<Feature> for Station {
    type Error = RegistryError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        let id = match feature.properties.station_id {
            RawStationId::Number(n) => StationId(n),
            RawStationId::Text(raw) => StationId(
                raw.trim()
                    .parse()
                    .map_err(|_| RegistryError::InvalidStationId { raw })?,
            ),
        };
        let [longitude, latitude] = feature.geometry.coordinates;
        Ok(Station {
            id,
            name: feature.properties.station_name,
            location: Location {
                latitude,
                longitude,
                elevation: feature.properties.elevation,
            },
            federal_state: feature.properties.federal_state,
        })
    }
}

/// Loads the station list, from the bincode disk cache when present and from
/// the network otherwise.
pub(crate) struct RegistrySource {
    url: String,
    client: Client,
    cache_file: PathBuf,
}

impl RegistrySource {
    pub(crate) fn new(base_url: &str, client: Client, cache_dir: &Path) -> Self {
        Self {
            url: format!("{}/{}", base_url.trim_end_matches('/'), STATIONS_FILE),
            client,
            cache_file: cache_dir.join(BINCODE_CACHE_FILE_NAME),
        }
    }

    pub(crate) async fn load(&self) -> Result<Vec<Station>, RegistryError> {
        if tokio::fs::metadata(&self.cache_file).await.is_ok() {
            info!("Loading stations from cache file {:?}", self.cache_file);
            return self.load_cached().await;
        }
        let stations = self.fetch().await?;
        // A failed cache write only costs the next startup a refetch.
        if let Err(e) = self.store_cache(&stations).await {
            warn!("Failed to cache station list: {e}");
        }
        Ok(stations)
    }

    async fn load_cached(&self) -> Result<Vec<Station>, RegistryError> {
        let bytes = tokio::fs::read(&self.cache_file)
            .await
            .map_err(|e| RegistryError::CacheRead(self.cache_file.clone(), e))?;
        let (stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| RegistryError::CacheDecode(self.cache_file.clone(), Box::new(e)))?;
        Ok(stations)
    }

    async fn fetch(&self) -> Result<Vec<Station>, RegistryError> {
        info!("Downloading station collection from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RegistryError::NetworkRequest(self.url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    RegistryError::HttpStatus {
                        url: self.url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    RegistryError::NetworkRequest(self.url.clone(), e)
                });
            }
        };
        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::NetworkRequest(self.url.clone(), e))?;
        let stations = parse_features(&body)?;
        info!("Parsed {} stations from {}", stations.len(), self.url);
        Ok(stations)
    }

    async fn store_cache(&self, stations: &[Station]) -> Result<(), RegistryError> {
        let encoded = bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
            .map_err(|e| RegistryError::CacheEncode(Box::new(e)))?;
        tokio::fs::write(&self.cache_file, &encoded)
            .await
            .map_err(|e| RegistryError::CacheWrite(self.cache_file.clone(), e))
    }
}
