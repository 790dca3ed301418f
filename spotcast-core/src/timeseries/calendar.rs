use std::collections::BTreeMap;

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::series::truncate_to_hour;
use crate::{EndBound, HourlyPoint, RepairReport, Series, SpotcastError};

/// Calendar a repaired series must cover.
///
/// Every day from `start` through `end` contributes 24 wall-clock hours,
/// except the last day, which stops at `end_hour` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarRange {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
    /// Last hour on `end`, in `0..=23`.
    pub end_hour: u32,
}

impl CalendarRange {
    /// Build a validated range.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `end < start` or `end_hour > 23`.
    pub fn new(start: NaiveDate, end: NaiveDate, end_hour: u32) -> Result<Self, SpotcastError> {
        if end < start {
            return Err(SpotcastError::InvalidArg(format!(
                "calendar end {end} is before start {start}"
            )));
        }
        if end_hour > 23 {
            return Err(SpotcastError::InvalidArg(format!(
                "calendar end hour {end_hour} is not in 0..=23"
            )));
        }
        Ok(Self {
            start,
            end,
            end_hour,
        })
    }

    /// Whole days from `start` through `end`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `end < start`.
    pub fn days(start: NaiveDate, end: NaiveDate) -> Result<Self, SpotcastError> {
        Self::new(start, end, 23)
    }

    /// Turn a request's end bound into a concrete range.
    ///
    /// `latest_available` is the last wall-clock hour the source actually
    /// delivered; it is only consulted for `EndBound::Latest`.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the bound is `Latest` and nothing was
    /// delivered, or when the resulting range is inverted.
    pub fn resolve(
        start: NaiveDate,
        end: &EndBound,
        latest_available: Option<NaiveDateTime>,
    ) -> Result<Self, SpotcastError> {
        match *end {
            EndBound::At { date, hour } => Self::new(start, date, hour),
            EndBound::Latest => {
                let last = latest_available.ok_or_else(|| {
                    SpotcastError::InvalidArg(format!(
                        "cannot resolve latest end from {start}: source delivered no data"
                    ))
                })?;
                Self::new(start, last.date(), last.hour())
            }
        }
    }

    /// Number of calendar days touched by the range.
    #[must_use]
    pub fn day_count(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Position of a wall-clock hour on the calendar, if it lies inside.
    #[must_use]
    pub fn slot_of(&self, local: NaiveDateTime) -> Option<usize> {
        let day = usize::try_from((local.date() - self.start).num_days()).ok()?;
        let slot = day * 24 + local.hour() as usize;
        (slot < expected_hours(self)).then_some(slot)
    }

    /// Wall-clock hour at a calendar position, encoded as UTC.
    #[must_use]
    pub fn slot_time(&self, slot: usize) -> DateTime<Utc> {
        let hours = i64::try_from(slot).unwrap_or(i64::MAX);
        Utc.from_utc_datetime(&(self.start.and_time(chrono::NaiveTime::MIN) + Duration::hours(hours)))
    }
}

/// Number of hourly slots a repaired series must have.
///
/// `days * 24 - 23 + end_hour`, where `days` counts both ends.
#[must_use]
pub fn expected_hours(range: &CalendarRange) -> usize {
    range.day_count() * 24 - 23 + range.end_hour as usize
}

/// First instant of a local calendar day.
///
/// When midnight is ambiguous the earlier instant is used; when it does not
/// exist the day starts at the first valid local hour.
#[must_use]
pub fn local_day_start_utc(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _) => Some(first.with_timezone(&Utc)),
        LocalResult::None => (1..=3).find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }),
    }
}

/// Length of a local calendar day in hours (23 or 25 on DST transitions).
#[must_use]
pub fn day_length_hours(date: NaiveDate, tz: Tz) -> i64 {
    let next = date.succ_opt();
    match (
        local_day_start_utc(date, tz),
        next.and_then(|d| local_day_start_utc(d, tz)),
    ) {
        (Some(a), Some(b)) => (b - a).num_hours(),
        _ => 24,
    }
}

/// Repair a raw series onto its complete wall-clock calendar.
///
/// See [`repair_with_stats`]; this variant discards the report.
///
/// # Errors
/// Same as [`repair_with_stats`].
pub fn repair(series: &Series, range: &CalendarRange) -> Result<Series, SpotcastError> {
    repair_with_stats(series, range).map(|(s, _)| s)
}

/// Repair a raw series onto its complete wall-clock calendar.
///
/// The result is a new series with exactly [`expected_hours`] points, one per
/// wall-clock hour of `range` in the series' time zone, stamped as UTC.
///
/// - Days whose local length is 23 hours and that report exactly 23 points get
///   their last hour repeated; 25-hour days reporting exactly 25 points keep
///   their first 24. Values are placed positionally on hours 0..23.
/// - Any other day is placed by wall-clock hour; a repeated hour keeps its
///   first occurrence.
/// - Every hour still missing copies the value emitted 24 slots earlier
///   (same hour of the previous day).
///
/// # Errors
/// - `InvalidArg` if a point does not carry one value per field.
/// - `DuplicateTimestamp` if two points fall in the same hour.
/// - `CalendarRepair` if a point lies outside `range` or the produced length
///   does not match the calendar.
/// - `StartTooEarly` if an hour of the first day is missing.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "spotcast::calendar::repair",
        skip(series),
        fields(series = %series.name, raw_rows = series.len()),
        err,
    )
)]
pub fn repair_with_stats(
    series: &Series,
    range: &CalendarRange,
) -> Result<(Series, RepairReport), SpotcastError> {
    series.check_shape()?;
    series.check_unique_hours()?;
    let expected = expected_hours(range);

    let mut ordered: Vec<(DateTime<Utc>, &HourlyPoint)> = series
        .points
        .iter()
        .map(|p| (truncate_to_hour(p.timestamp), p))
        .collect();
    ordered.sort_by_key(|(ts, _)| *ts);

    let mut by_day: BTreeMap<NaiveDate, Vec<(NaiveDateTime, &HourlyPoint)>> = BTreeMap::new();
    for (ts, p) in &ordered {
        let local = series.local_time(*ts);
        if range.slot_of(local).is_none() {
            return Err(SpotcastError::calendar(
                &series.name,
                format!(
                    "point at {} lies outside {}..{} (end hour {})",
                    local.format("%Y-%m-%dT%H:%M:%S"),
                    range.start,
                    range.end,
                    range.end_hour
                ),
            ));
        }
        by_day.entry(local.date()).or_default().push((local, *p));
    }

    let mut slots: Vec<Option<&[f64]>> = vec![None; expected];
    let mut dst_days = 0usize;
    for (date, points) in &by_day {
        let base = usize::try_from((*date - range.start).num_days()).unwrap_or(0) * 24;
        let day_len = day_length_hours(*date, series.tz);
        let positional = (day_len == 23 && points.len() == 23) || (day_len == 25 && points.len() == 25);
        if positional {
            dst_days += 1;
            let values = points.iter().map(|(_, p)| p.values.as_slice());
            let padded = values
                .chain(points.last().map(|(_, p)| p.values.as_slice()))
                .take(24);
            for (h, v) in padded.enumerate() {
                if let Some(slot) = slots.get_mut(base + h) {
                    *slot = Some(v);
                }
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(%date, day_len, "normalized daylight-saving day to 24 hours");
        } else {
            for (local, p) in points {
                let slot = base + local.hour() as usize;
                if slots[slot].is_none() {
                    slots[slot] = Some(p.values.as_slice());
                }
            }
        }
    }

    // one point per slot; check_hourly below verifies the spacing
    let mut out: Vec<HourlyPoint> = Vec::with_capacity(expected);
    let mut filled = 0usize;
    for (k, slot) in slots.iter().enumerate() {
        let values = match slot {
            Some(v) => v.to_vec(),
            None if k < 24 => {
                return Err(SpotcastError::StartTooEarly {
                    series: series.name.clone(),
                    date: range.start.to_string(),
                });
            }
            None => {
                filled += 1;
                out[k - 24].values.clone()
            }
        };
        out.push(HourlyPoint::new(range.slot_time(k), values));
    }

    #[cfg(feature = "tracing")]
    {
        if filled > 0 {
            tracing::debug!(series = %series.name, filled, "filled missing hours from the previous day");
        }
    }

    let repaired = Series {
        name: series.name.clone(),
        fields: series.fields.clone(),
        tz: Tz::UTC,
        points: out,
    };
    repaired.check_hourly()?;
    let report = RepairReport {
        series: series.name.clone(),
        raw_rows: series.len(),
        repaired_rows: repaired.len(),
        filled_hours: filled,
        dst_days,
    };
    Ok((repaired, report))
}
