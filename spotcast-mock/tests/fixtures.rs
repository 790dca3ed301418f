use chrono::{NaiveDate, TimeZone, Utc};
use spotcast_core::{
    CalendarRange, FetchRequest, SeriesSource, SpotcastError, repair_with_stats,
};
use spotcast_mock::{DynamicMockSource, MockBehavior, MockSource};

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, m, day).unwrap()
}

#[tokio::test]
async fn fixture_follows_the_local_calendar_across_dst() {
    let src = MockSource::price();
    let s = src.fetch_range(&FetchRequest::days(d(3, 28), d(3, 30))).await.unwrap();
    assert_eq!(s.len(), 71);
    assert_eq!(s.fields, vec!["SPOTPrice".to_string()]);

    let autumn = src.fetch_range(&FetchRequest::days(d(10, 24), d(10, 26))).await.unwrap();
    assert_eq!(autumn.len(), 73);
}

#[tokio::test]
async fn overlapping_fetches_agree() {
    let src = MockSource::grid();
    let a = src.fetch_range(&FetchRequest::days(d(1, 1), d(1, 5))).await.unwrap();
    let b = src.fetch_range(&FetchRequest::days(d(1, 3), d(1, 7))).await.unwrap();
    let overlap = a.points.iter().find(|p| p.timestamp == b.points[0].timestamp).unwrap();
    assert_eq!(overlap, &b.points[0]);
}

#[tokio::test]
async fn latest_stops_at_the_configured_hour() {
    let latest = d(1, 10).and_hms_opt(16, 0, 0).unwrap();
    let src = MockSource::weather().with_tz(chrono_tz::UTC).with_latest(latest);
    let s = src.fetch_range(&FetchRequest::until_latest(d(1, 1))).await.unwrap();
    assert_eq!(s.len(), 9 * 24 + 17);
    assert_eq!(s.last_local_hour(), Some(latest));
}

#[tokio::test]
async fn dynamic_mock_damages_delivered_data() {
    let (src, ctl) = DynamicMockSource::new_with_controller(MockSource::price().with_tz(chrono_tz::UTC));
    let hole = Utc.with_ymd_and_hms(2020, 1, 2, 10, 0, 0).unwrap();
    ctl.drop_hours([hole]).await;

    let req = FetchRequest::days(d(1, 1), d(1, 3));
    let raw = src.fetch_range(&req).await.unwrap();
    assert_eq!(raw.len(), 71);
    let (_, report) = repair_with_stats(&raw, &CalendarRange::days(d(1, 1), d(1, 3)).unwrap()).unwrap();
    assert_eq!(report.filled_hours, 1);

    ctl.duplicate_hours([Utc.with_ymd_and_hms(2020, 1, 1, 3, 0, 0).unwrap()]).await;
    let raw = src.fetch_range(&req).await.unwrap();
    assert!(matches!(
        repair_with_stats(&raw, &CalendarRange::days(d(1, 1), d(1, 3)).unwrap()),
        Err(SpotcastError::DuplicateTimestamp { .. })
    ));
    assert_eq!(ctl.requests().await.len(), 2);
}

#[tokio::test]
async fn dynamic_mock_fails_and_hangs_on_command() {
    let (src, ctl) = DynamicMockSource::new_with_controller(MockSource::grid());
    ctl.set_behavior(MockBehavior::Fail(SpotcastError::source_failure("grid", "http 503"))).await;
    let req = FetchRequest::days(d(1, 1), d(1, 2));
    assert!(matches!(src.fetch_range(&req).await, Err(SpotcastError::Source { .. })));

    ctl.set_behavior(MockBehavior::Hang).await;
    let hung = tokio::time::timeout(std::time::Duration::from_millis(20), src.fetch_range(&req)).await;
    assert!(hung.is_err());

    ctl.clear_all().await;
    assert!(src.fetch_range(&req).await.is_ok());
    assert_eq!(ctl.requests().await.len(), 1);
}
