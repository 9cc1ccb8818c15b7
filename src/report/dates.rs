//! Date dimension generation.

use chrono::{Days, Months, NaiveDate};
use serde_json::Value;

use super::definition::{DateDimension, IntervalUnit};
use super::error::{ReportError, ReportResult};
use crate::metadata::Row;

/// Format used for generated date values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rows of a date dimension: one `{name: "YYYY-MM-DD"}` row per step.
pub fn date_rows(spec: &DateDimension) -> ReportResult<Vec<Row>> {
    let dates = date_range(spec.start, spec.end, spec.interval, spec.interval_unit)?;
    Ok(dates
        .into_iter()
        .map(|date| {
            let mut row = Row::new();
            row.insert(
                spec.name.clone(),
                Value::String(date.format(DATE_FORMAT).to_string()),
            );
            row
        })
        .collect())
}

/// Dates `start + i * interval` (in `unit`) for `i = 0, 1, ...` up to `end`.
///
/// Each step is offset from `start`, so month-end clamping on one step does
/// not carry into the next. A `start` after `end` yields nothing.
pub fn date_range(
    start: NaiveDate,
    end: NaiveDate,
    interval: i64,
    unit: IntervalUnit,
) -> ReportResult<Vec<NaiveDate>> {
    if interval <= 0 {
        return Err(ReportError::invalid(format!(
            "date interval must be positive, got {}",
            interval
        )));
    }

    let mut dates = Vec::new();
    for i in 0i64.. {
        let Some(date) = i.checked_mul(interval).and_then(|n| offset(start, n, unit)) else {
            break;
        };
        if date > end {
            break;
        }
        dates.push(date);
    }
    Ok(dates)
}

/// `start` moved forward by `n` units; `None` past the representable range.
fn offset(start: NaiveDate, n: i64, unit: IntervalUnit) -> Option<NaiveDate> {
    match unit {
        IntervalUnit::Days => start.checked_add_days(Days::new(u64::try_from(n).ok()?)),
        IntervalUnit::Weeks => {
            start.checked_add_days(Days::new(u64::try_from(n.checked_mul(7)?).ok()?))
        }
        IntervalUnit::Months => add_months(start, n),
        IntervalUnit::Quarters => add_months(start, n.checked_mul(3)?),
        IntervalUnit::Years => add_months(start, n.checked_mul(12)?),
    }
}

fn add_months(start: NaiveDate, n: i64) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(u32::try_from(n).ok()?))
}
