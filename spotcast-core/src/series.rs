use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::SpotcastError;

/// One hourly observation of every field of a series.
///
/// `values` is ordered like the owning series' `fields`. `NaN` marks a
/// missing field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Start of the hour.
    pub timestamp: DateTime<Utc>,
    /// Field values, one per series field.
    pub values: Vec<f64>,
}

impl HourlyPoint {
    /// Build a point.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, values: Vec<f64>) -> Self {
        Self { timestamp, values }
    }

    /// Returns true if any field is missing.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }
}

/// A named, ordered sequence of hourly points from one source.
///
/// Raw series hold UTC instants and the market time zone that defines their
/// calendar days. A repaired series holds wall-clock hours encoded as UTC and
/// has `tz == UTC`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Source name, used in errors and reports.
    pub name: String,
    /// Value column names.
    pub fields: Vec<String>,
    /// Time zone whose calendar days the series follows.
    pub tz: Tz,
    /// Points in time order.
    pub points: Vec<HourlyPoint>,
}

impl Series {
    /// Create an empty series.
    pub fn new(name: impl Into<String>, fields: Vec<String>, tz: Tz) -> Self {
        Self {
            name: name.into(),
            fields,
            tz,
            points: Vec::new(),
        }
    }

    /// Replace the points, keeping name, fields, and time zone.
    #[must_use]
    pub fn with_points(mut self, points: Vec<HourlyPoint>) -> Self {
        self.points = points;
        self
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of a field by name.
    #[must_use]
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Wall-clock time of a point in the series' time zone.
    #[must_use]
    pub fn local_time(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        self.tz.from_utc_datetime(&ts.naive_utc()).naive_local()
    }

    /// Last wall-clock hour present, if any.
    #[must_use]
    pub fn last_local_hour(&self) -> Option<NaiveDateTime> {
        self.points.last().map(|p| self.local_time(p.timestamp))
    }

    /// First calendar day present, if any.
    #[must_use]
    pub fn first_local_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| self.local_time(p.timestamp).date())
    }

    /// Check that every point carries one value per field.
    ///
    /// # Errors
    /// Returns `InvalidArg` naming the first malformed point.
    pub fn check_shape(&self) -> Result<(), SpotcastError> {
        let width = self.fields.len();
        if let Some((row, p)) = self
            .points
            .iter()
            .enumerate()
            .find(|(_, p)| p.values.len() != width)
        {
            return Err(SpotcastError::InvalidArg(format!(
                "{}: point {row} at {} has {} values, expected {width}",
                self.name,
                p.timestamp.format("%Y-%m-%dT%H:%M:%S"),
                p.values.len()
            )));
        }
        Ok(())
    }

    /// Check that no hour is delivered twice.
    ///
    /// Timestamps are truncated to the hour first, so `10:00` and `10:20`
    /// collide. Order of the points does not matter.
    ///
    /// # Errors
    /// Returns `DuplicateTimestamp` for the earliest repeated hour.
    pub fn check_unique_hours(&self) -> Result<(), SpotcastError> {
        let mut hours: Vec<DateTime<Utc>> = self
            .points
            .iter()
            .map(|p| truncate_to_hour(p.timestamp))
            .collect();
        hours.sort_unstable();
        if let Some(pair) = hours.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SpotcastError::DuplicateTimestamp {
                series: self.name.clone(),
                timestamp: iso_hour(pair[0]),
            });
        }
        Ok(())
    }

    /// Check that timestamps strictly increase with a one-hour step.
    ///
    /// # Errors
    /// Returns `UnorderedTimestamps` at the first row that breaks the step.
    pub fn check_hourly(&self) -> Result<(), SpotcastError> {
        for (row, pair) in self.points.windows(2).enumerate() {
            if pair[1].timestamp - pair[0].timestamp != Duration::hours(1) {
                return Err(SpotcastError::UnorderedTimestamps {
                    series: self.name.clone(),
                    row: row + 1,
                });
            }
        }
        Ok(())
    }
}

/// Truncate an instant to the start of its hour.
#[must_use]
pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::hours(1)).unwrap_or(ts)
}

/// ISO-8601 rendering used in errors and the cache format.
#[must_use]
pub fn iso_hour(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn check_hourly_reports_first_break() {
        let s = Series::new("price", vec!["SPOTPrice".into()], Tz::UTC).with_points(vec![
            HourlyPoint::new(ts(0), vec![1.0]),
            HourlyPoint::new(ts(1), vec![1.0]),
            HourlyPoint::new(ts(3), vec![1.0]),
        ]);
        assert_eq!(
            s.check_hourly(),
            Err(SpotcastError::UnorderedTimestamps {
                series: "price".into(),
                row: 2
            })
        );
    }

    #[test]
    fn unique_hours_ignore_order_but_not_minutes() {
        let shuffled = Series::new("price", vec!["SPOTPrice".into()], Tz::UTC).with_points(vec![
            HourlyPoint::new(ts(2), vec![1.0]),
            HourlyPoint::new(ts(0), vec![1.0]),
            HourlyPoint::new(ts(1), vec![1.0]),
        ]);
        assert_eq!(shuffled.check_unique_hours(), Ok(()));

        let offset = Utc.with_ymd_and_hms(2020, 1, 1, 1, 20, 0).unwrap();
        let twice = shuffled.with_points(vec![
            HourlyPoint::new(ts(2), vec![1.0]),
            HourlyPoint::new(offset, vec![1.0]),
            HourlyPoint::new(ts(1), vec![1.0]),
        ]);
        assert_eq!(
            twice.check_unique_hours(),
            Err(SpotcastError::DuplicateTimestamp {
                series: "price".into(),
                timestamp: "2020-01-01T01:00:00".into()
            })
        );
    }

    #[test]
    fn truncation_drops_minutes() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 5, 42, 17).unwrap();
        assert_eq!(truncate_to_hour(t), ts(5));
        assert_eq!(iso_hour(t), "2020-01-01T05:42:17");
    }

    #[test]
    fn local_time_follows_zone() {
        let s = Series::new("grid", vec![], chrono_tz::Europe::Berlin);
        assert_eq!(s.local_time(ts(0)).to_string(), "2020-01-01 01:00:00");
    }
}
