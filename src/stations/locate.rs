//! Nearest-station resolution over the registry's station set.
//!
//! Distances are great-circle (haversine, Earth radius 6371 km). The scan is
//! linear in registry source order; a candidate wins only with a strictly
//! smaller distance, so equidistant stations resolve to the earliest one.

use crate::regenstat::LatLon;
use crate::stations::registry::StationRegistry;
use crate::types::station::{Station, StationId};
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;

/// The station selected when no location is available (geolocation denied or
/// unsupported) or when the registry has nothing closer to offer.
pub const DEFAULT_STATION: StationId = StationId(19897);

/// Great-circle distance in kilometers between a query point and a station.
pub fn distance_km(latitude: f64, longitude: f64, station: &Station) -> f64 {
    distance(
        HaversineLocation {
            latitude,
            longitude,
        },
        HaversineLocation {
            latitude: station.location.latitude,
            longitude: station.location.longitude,
        },
        Units::Kilometers,
    )
}

/// Finds the station closest to the query point, with its distance in km.
///
/// Returns `None` when the registry is empty.
pub fn nearest_station(
    registry: &StationRegistry,
    latitude: f64,
    longitude: f64,
) -> Option<(Station, f64)> {
    registry.with_stations(|stations| {
        let mut best: Option<(Station, f64)> = None;
        for station in stations {
            let dist_km = distance_km(latitude, longitude, station);
            // Strict comparison: ties keep the earliest-iterated station.
            if best.as_ref().is_none_or(|(_, min)| dist_km < *min) {
                best = Some((station.clone(), dist_km));
            }
        }
        best
    })
}

/// Finds up to `limit` stations closest to the query point, sorted ascending
/// by distance, optionally restricted to `max_distance_km`.
pub fn nearest_stations(
    registry: &StationRegistry,
    latitude: f64,
    longitude: f64,
    limit: usize,
    max_distance_km: Option<f64>,
) -> Vec<(Station, f64)> {
    if limit == 0 {
        return vec![];
    }
    let mut candidates: Vec<(Station, f64)> = registry.with_stations(|stations| {
        stations
            .iter()
            .filter_map(|station| {
                let dist_km = distance_km(latitude, longitude, station);
                match max_distance_km {
                    Some(max) if dist_km > max => None,
                    _ => Some((station.clone(), dist_km)),
                }
            })
            .collect()
    });
    // Stable sort, so equal distances also keep source order.
    candidates.sort_by_key(|(_, dist_km)| OrderedFloat(*dist_km));
    candidates.truncate(limit);
    candidates
}

/// Resolves the station for a fresh selection.
///
/// A known location picks the nearest registered station; no location (or an
/// empty registry) falls back to [`DEFAULT_STATION`]. The fallback is a
/// normal outcome, not an error.
pub fn resolve_station(registry: &StationRegistry, location: Option<LatLon>) -> StationId {
    match location {
        Some(LatLon(latitude, longitude)) => nearest_station(registry, latitude, longitude)
            .map(|(station, _)| station.id)
            .unwrap_or(DEFAULT_STATION),
        None => DEFAULT_STATION,
    }
}
