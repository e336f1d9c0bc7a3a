//! Defines the data structures representing rain-gauge stations and their
//! metadata as loaded from the station feature collection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// The numeric identifier of a rain-gauge station (e.g., `19897`).
///
/// The identifier also determines where the station's daily precipitation
/// history lives: the id is zero-padded to five digits and embedded in a
/// deterministic file name under `data/`.
///
/// # Examples
///
/// ```
/// use regenstat::StationId;
///
/// assert_eq!(StationId(42).history_path(), "data/rain_data_00042.json");
/// assert_eq!(StationId(17450).history_path(), "data/rain_data_17450.json");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(pub u32);

impl StationId {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Relative path of the station's full-history file, id zero-padded to 5 digits.
    pub fn history_path(self) -> String {
        format!("data/rain_data_{:05}.json", self.0)
    }
}

impl Display for StationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single rain-gauge station and its descriptive metadata.
///
/// Built from one feature of the station collection. Immutable after load;
/// owned by the [`crate::StationRegistry`] for the application's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// The unique station identifier.
    pub id: StationId,
    /// The human-readable station name shown in selection lists.
    pub name: String,
    /// Geographical location details (latitude, longitude, elevation).
    pub location: Location,
    /// The federal state the station reports under, if known.
    pub federal_state: Option<String>,
}

/// Represents the geographical location of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<f64>,
}
