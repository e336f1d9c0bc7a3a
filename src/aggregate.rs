//! Reduces a station's full daily history to one calendar month plus the
//! summary statistics the dashboard displays next to the chart.

use crate::types::daily::DailyRecord;
use chrono::{Datelike, NaiveDate};

/// One month of a station's records together with its derived statistics.
///
/// Ephemeral: recomputed on every selection change, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthAggregate {
    /// The records of the selected month, sorted ascending by date.
    pub records: Vec<DailyRecord>,
    /// Sum of all precipitation in the month, in millimeters.
    pub total_mm: f64,
    /// Number of days with precipitation strictly above zero.
    pub rainy_days: usize,
    /// `total_mm` divided by the number of *recorded* days. Days without a
    /// record do not count as zero.
    pub daily_mean_mm: f64,
}

/// Filters `records` down to `year`/`month` and computes the summary.
///
/// Returns `None` when no record falls in the requested month — the "no data
/// for this month" state, deliberately distinct from any retrieval error (and
/// never a division by zero). The sort is stable, so records sharing a date
/// keep their source order.
pub fn aggregate(records: &[DailyRecord], year: i32, month: u32) -> Option<MonthAggregate> {
    let mut filtered: Vec<DailyRecord> = records
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .copied()
        .collect();
    filtered.sort_by_key(|r| r.date);

    if filtered.is_empty() {
        return None;
    }

    let total_mm: f64 = filtered.iter().map(|r| r.precipitation).sum();
    let rainy_days = filtered.iter().filter(|r| r.precipitation > 0.0).count();
    let daily_mean_mm = total_mm / filtered.len() as f64;

    Some(MonthAggregate {
        records: filtered,
        total_mm,
        rainy_days,
        daily_mean_mm,
    })
}

/// First and last calendar day of the given month, for clipping a chart's
/// category axis to the selection. `None` for months outside 1-12.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next_month.pred_opt()?))
}
