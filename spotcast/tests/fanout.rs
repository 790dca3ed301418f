mod helpers;

use std::time::Duration;

use helpers::{d, src};
use spotcast::{FetchRequest, Pipeline, PipelineConfig, SpotcastError};
use spotcast_mock::{DynamicMockSource, MockBehavior, MockSource};

fn jan() -> FetchRequest {
    FetchRequest::days(d(2020, 1, 1), d(2020, 1, 3))
}

#[test]
fn builder_rejects_empty_and_duplicate_registrations() {
    let err = Pipeline::builder().build().err().unwrap();
    assert!(matches!(err, SpotcastError::InvalidArg(_)));

    let err = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(src(MockSource::grid().named("price")))
        .build()
        .err()
        .unwrap();
    match err {
        SpotcastError::InvalidArg(msg) => assert!(msg.contains("price"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn builder_keeps_registration_order_and_config() {
    let p = Pipeline::builder()
        .with_source(src(MockSource::weather()))
        .with_source(src(MockSource::price()))
        .target_column("Temp")
        .source_timeout(Duration::from_secs(3))
        .build()
        .unwrap();
    assert_eq!(p.source_names(), ["weather", "price"]);
    assert_eq!(p.config().target_column, "Temp");
    assert_eq!(p.config().source_timeout, Some(Duration::from_secs(3)));
    assert_eq!(p.config().request_timeout, None);

    let p = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .config(PipelineConfig {
            request_timeout: Some(Duration::from_secs(9)),
            ..PipelineConfig::default()
        })
        .build()
        .unwrap();
    assert_eq!(p.config().target_column, "SPOTPrice");
    assert_eq!(p.config().request_timeout, Some(Duration::from_secs(9)));
}

#[tokio::test]
async fn fetch_all_returns_series_in_registration_order() {
    let p = Pipeline::builder()
        .with_source(src(MockSource::weather()))
        .with_source(src(MockSource::price()))
        .build()
        .unwrap();
    let series = p.fetch_all(&jan()).await.unwrap();
    let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["weather", "price"]);
    assert!(series.iter().all(|s| s.len() == 72));
}

#[tokio::test]
async fn failing_source_is_tagged_and_discards_the_rest() {
    let (grid, ctl) = DynamicMockSource::new_with_controller(MockSource::grid());
    ctl.set_behavior(MockBehavior::Fail(SpotcastError::Persist("boom".into())))
        .await;
    let p = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(grid)
        .build()
        .unwrap();

    let err = p.dataset(&jan()).await.unwrap_err();
    assert_eq!(err, SpotcastError::source_failure("grid", "persist: boom"));
    assert!(!err.is_integrity_violation());
}

#[tokio::test]
async fn several_failures_are_aggregated() {
    let (a, ctl_a) = DynamicMockSource::new_with_controller(MockSource::price());
    let (b, ctl_b) = DynamicMockSource::new_with_controller(MockSource::grid());
    ctl_a
        .set_behavior(MockBehavior::Fail(SpotcastError::source_failure("price", "503")))
        .await;
    ctl_b
        .set_behavior(MockBehavior::Fail(SpotcastError::Persist("io".into())))
        .await;
    let p = Pipeline::builder().with_source(a).with_source(b).build().unwrap();

    match p.fetch_all(&jan()).await.unwrap_err() {
        SpotcastError::AllSourcesFailed(errs) => {
            assert_eq!(
                errs,
                vec![
                    SpotcastError::source_failure("price", "503"),
                    SpotcastError::source_failure("grid", "persist: io"),
                ]
            );
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn hanging_source_hits_its_timeout() {
    let (weather, ctl) = DynamicMockSource::new_with_controller(MockSource::weather());
    ctl.set_behavior(MockBehavior::Hang).await;
    let p = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(weather)
        .source_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = p.dataset(&jan()).await.unwrap_err();
    assert_eq!(err, SpotcastError::source_timeout("weather"));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_bounds_the_whole_fan_out() {
    let slow = MockSource::grid().with_latency(Duration::from_secs(10));
    let p = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(src(slow))
        .request_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = p.fetch_all(&jan()).await.unwrap_err();
    assert_eq!(err, SpotcastError::request_timeout("fetch"));
}

#[tokio::test(start_paused = true)]
async fn slow_source_within_its_timeout_succeeds() {
    let slow = MockSource::grid().with_latency(Duration::from_millis(20));
    let p = Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(src(slow))
        .source_timeout(Duration::from_secs(1))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let table = p.dataset(&jan()).await.unwrap();
    assert_eq!(table.row_count(), 72);
}
