use chrono::NaiveDate;
use spotcast_types::{EndBound, PipelineConfig, RowCountPolicy, SplitConfig, WindowSpec};

#[test]
fn end_bound_roundtrip() {
    let date = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
    for bound in [EndBound::At { date, hour: 16 }, EndBound::Latest] {
        let json = serde_json::to_string(&bound).expect("serialize end bound");
        let de: EndBound = serde_json::from_str(&json).expect("deserialize end bound");
        assert_eq!(de, bound);
    }
}

#[test]
fn latest_implies_truncating_alignment() {
    let date = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
    assert_eq!(
        RowCountPolicy::for_end(&EndBound::Latest),
        RowCountPolicy::TruncateToShortest
    );
    assert_eq!(
        RowCountPolicy::for_end(&EndBound::end_of_day(date)),
        RowCountPolicy::Exact
    );
}

#[test]
fn window_spec_gap_is_horizon_minus_one() {
    assert_eq!(WindowSpec::for_horizon(168, 1).gap, 0);
    assert_eq!(WindowSpec::for_horizon(168, 24).gap, 23);
    assert_eq!(WindowSpec::for_horizon(168, 168).gap, 167);
    assert_eq!(WindowSpec::new(168, 23).horizon_hours(), 24);
}

#[test]
fn split_config_defaults_and_roundtrip() {
    let cfg = SplitConfig::default();
    assert!((cfg.test_fraction - 0.2).abs() < f64::EPSILON);
    assert_eq!(cfg.window, WindowSpec::new(168, 0));
    assert!(cfg.scale);

    let json = serde_json::to_string(&cfg).expect("serialize split config");
    let de: SplitConfig = serde_json::from_str(&json).expect("deserialize split config");
    assert_eq!(de, cfg);
}

#[test]
fn pipeline_config_roundtrip() {
    let cfg = PipelineConfig {
        target_column: "Price".into(),
        source_timeout: Some(std::time::Duration::from_millis(1500)),
        request_timeout: None,
    };
    let json = serde_json::to_string(&cfg).expect("serialize pipeline config");
    let de: PipelineConfig = serde_json::from_str(&json).expect("deserialize pipeline config");
    assert_eq!(de.target_column, "Price");
    assert_eq!(de.source_timeout.map(|d| d.as_millis()), Some(1500));
    assert!(de.request_timeout.is_none());
}
