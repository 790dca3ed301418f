use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Europe::Berlin;
use proptest::prelude::*;
use spotcast_core::{
    CalendarRange, EndBound, HourlyPoint, Series, SpotcastError, Tz, expected_hours, repair,
    repair_with_stats,
};

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, m, day).unwrap()
}

fn utc_hourly(start: DateTime<Utc>, hours: i64, value: impl Fn(i64) -> f64) -> Vec<HourlyPoint> {
    (0..hours)
        .map(|h| HourlyPoint::new(start + Duration::hours(h), vec![value(h)]))
        .collect()
}

fn price(points: Vec<HourlyPoint>, tz: Tz) -> Series {
    Series::new("price", vec!["SPOTPrice".into()], tz).with_points(points)
}

/// Every instant from local midnight of `from` to local midnight after `to`.
fn local_days(from: NaiveDate, to: NaiveDate) -> Vec<HourlyPoint> {
    let start = Berlin
        .from_local_datetime(&from.and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc);
    let end = Berlin
        .from_local_datetime(&to.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc);
    let hours = (end - start).num_hours();
    utc_hourly(start, hours, |h| h as f64)
}

#[test]
fn ten_clean_days_repair_to_240_unique_hours() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let raw = price(utc_hourly(t0, 240, |h| h as f64), Tz::UTC);
    let range = CalendarRange::days(d(1, 1), d(1, 10)).unwrap();
    let (out, report) = repair_with_stats(&raw, &range).unwrap();
    assert_eq!(out.len(), 240);
    assert_eq!(report.filled_hours, 0);
    out.check_hourly().unwrap();
    assert_eq!(out.points, raw.points);
}

#[test]
fn missing_hour_copies_the_previous_day() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut points = utc_hourly(t0, 240, |h| if h == 10 { 37.5 } else { h as f64 });
    points.remove(34);
    let raw = price(points, Tz::UTC);
    let range = CalendarRange::days(d(1, 1), d(1, 10)).unwrap();

    let (out, report) = repair_with_stats(&raw, &range).unwrap();
    assert_eq!(out.len(), 240);
    assert_eq!(out.points[34].timestamp, Utc.with_ymd_and_hms(2020, 1, 2, 10, 0, 0).unwrap());
    assert_eq!(out.points[34].values, vec![37.5]);
    assert_eq!(report.filled_hours, 1);
    assert_eq!(report.raw_rows, 239);
    // input untouched
    assert_eq!(raw.len(), 239);
}

#[test]
fn a_whole_missing_day_is_filled_from_the_day_before() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let points: Vec<_> = utc_hourly(t0, 72, |h| h as f64)
        .into_iter()
        .filter(|p| p.timestamp.date_naive() != d(1, 2))
        .collect();
    let out = repair(&price(points, Tz::UTC), &CalendarRange::days(d(1, 1), d(1, 3)).unwrap()).unwrap();
    assert_eq!(out.len(), 72);
    for h in 0..24 {
        assert_eq!(out.points[24 + h].values, out.points[h].values);
    }
}

#[test]
fn missing_first_day_hour_is_start_too_early() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut points = utc_hourly(t0, 48, |h| h as f64);
    points.remove(3);
    let err = repair(&price(points, Tz::UTC), &CalendarRange::days(d(1, 1), d(1, 2)).unwrap()).unwrap_err();
    assert_eq!(
        err,
        SpotcastError::StartTooEarly {
            series: "price".into(),
            date: "2020-01-01".into()
        }
    );
}

#[test]
fn duplicate_hours_are_fatal_even_with_minute_offsets() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut points = utc_hourly(t0, 24, |h| h as f64);
    points.push(HourlyPoint::new(t0 + Duration::minutes(5 * 60 + 30), vec![1.0]));
    let err = repair(&price(points, Tz::UTC), &CalendarRange::days(d(1, 1), d(1, 1)).unwrap()).unwrap_err();
    assert_eq!(
        err,
        SpotcastError::DuplicateTimestamp {
            series: "price".into(),
            timestamp: "2020-01-01T05:00:00".into()
        }
    );
}

#[test]
fn points_outside_the_range_are_rejected() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let raw = price(utc_hourly(t0, 48, |h| h as f64), Tz::UTC);
    let range = CalendarRange::new(d(1, 1), d(1, 2), 16).unwrap();
    assert!(matches!(
        repair(&raw, &range),
        Err(SpotcastError::CalendarRepair { .. })
    ));
}

#[test]
fn partial_last_day_stops_at_end_hour() {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let expected = 9 * 24 + 17;
    let mut points = utc_hourly(t0, expected as i64, |h| h as f64);
    // last hour of the range is missing
    points.pop();
    let range = CalendarRange::resolve(d(1, 1), &EndBound::At { date: d(1, 10), hour: 16 }, None).unwrap();
    assert_eq!(expected_hours(&range), expected);

    let out = repair(&price(points, Tz::UTC), &range).unwrap();
    assert_eq!(out.len(), expected);
    let last = out.points.last().unwrap();
    assert_eq!(last.timestamp.hour(), 16);
    assert_eq!(last.values, out.points[expected - 25].values);
}

#[test]
fn spring_forward_day_repeats_its_last_hour() {
    let raw = price(local_days(d(3, 28), d(3, 30)), Berlin);
    assert_eq!(raw.len(), 71);
    let (out, report) =
        repair_with_stats(&raw, &CalendarRange::days(d(3, 28), d(3, 30)).unwrap()).unwrap();
    assert_eq!(out.len(), 72);
    assert_eq!(out.tz, Tz::UTC);
    assert_eq!(report.dst_days, 1);
    assert_eq!(report.filled_hours, 0);

    for h in 0..23 {
        assert_eq!(out.points[24 + h].values, vec![(24 + h) as f64]);
    }
    assert_eq!(out.points[47].values, vec![46.0]);
    assert_eq!(out.points[48].values, vec![47.0]);
    assert_eq!(out.points[47].timestamp, Utc.with_ymd_and_hms(2020, 3, 29, 23, 0, 0).unwrap());
}

#[test]
fn fall_back_day_keeps_its_first_24_hours() {
    let raw = price(local_days(d(10, 24), d(10, 26)), Berlin);
    assert_eq!(raw.len(), 73);
    let (out, report) =
        repair_with_stats(&raw, &CalendarRange::days(d(10, 24), d(10, 26)).unwrap()).unwrap();
    assert_eq!(out.len(), 72);
    assert_eq!(report.dst_days, 1);
    for h in 0..24 {
        assert_eq!(out.points[24 + h].values, vec![(24 + h) as f64]);
    }
    assert_eq!(out.points[48].values, vec![49.0]);
    out.check_hourly().unwrap();
}

#[test]
fn dst_day_with_other_counts_is_placed_by_wall_clock_hour() {
    let mut points = local_days(d(3, 28), d(3, 29));
    // drop local 05:00 on the short day (index 24 + 4, since 02:00 does not exist)
    points.remove(28);
    let raw = price(points, Berlin);
    let (out, report) =
        repair_with_stats(&raw, &CalendarRange::days(d(3, 28), d(3, 29)).unwrap()).unwrap();
    assert_eq!(out.len(), 48);
    assert_eq!(report.dst_days, 0);
    assert_eq!(report.filled_hours, 2);
    assert_eq!(out.points[26].values, out.points[2].values);
    assert_eq!(out.points[29].values, out.points[5].values);
    assert_eq!(out.points[27].values, vec![26.0]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dropped_hours_are_filled_from_the_day_before(
        (days, dropped) in (2u32..10).prop_flat_map(|days| {
            (Just(days), prop::collection::btree_set(24usize..days as usize * 24, 0..30))
        })
    ) {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let points: Vec<_> = utc_hourly(t0, i64::from(days) * 24, |h| h as f64)
            .into_iter()
            .enumerate()
            .filter(|(k, _)| !dropped.contains(k))
            .map(|(_, p)| p)
            .collect();
        let range = CalendarRange::days(d(1, 1), d(1, days)).unwrap();
        let (out, report) = repair_with_stats(&price(points, Tz::UTC), &range).unwrap();

        prop_assert_eq!(out.len(), days as usize * 24);
        prop_assert_eq!(report.filled_hours, dropped.len());
        for pair in out.points.windows(2) {
            prop_assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        for &k in &dropped {
            prop_assert_eq!(&out.points[k].values, &out.points[k - 24].values);
        }
    }
}
