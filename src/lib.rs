mod aggregate;
mod error;
mod rain_data;
mod regenstat;
mod selection;
mod stations;
mod theme;
mod types;
mod utils;

pub use error::RegenstatError;
pub use regenstat::*;

pub use aggregate::{aggregate, month_bounds, MonthAggregate};
pub use selection::SelectionTag;
pub use theme::{load_theme, save_theme, Theme};

pub use stations::locate::{
    distance_km, nearest_station, nearest_stations, resolve_station, DEFAULT_STATION,
};
pub use stations::registry::{parse_features, StationRegistry};

pub use types::daily::DailyRecord;
pub use types::month::MonthKey;
pub use types::station::{Location, Station, StationId};

pub use rain_data::error::RetrievalError;
pub use rain_data::fetcher::HistoryFetcher;
pub use rain_data::loader::HistoryLoader;
pub use stations::error::RegistryError;
