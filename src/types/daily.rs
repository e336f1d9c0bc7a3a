use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of measured precipitation, loaded verbatim from a station's
/// history file.
///
/// History files contain one entry per recorded day with an ISO `YYYY-MM-DD`
/// date and a non-negative precipitation amount in millimeters. Days without
/// a measurement are simply absent.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar day of the measurement (no time component).
    pub date: NaiveDate,
    /// Measured precipitation in millimeters. Non-negative.
    pub precipitation: f64,
}
