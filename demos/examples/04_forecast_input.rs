use spotcast::{Pipeline, ScalerState, SplitConfig, difference};
use spotcast_demos::common::{demo_request, get_sources, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let scaler_path = dir.path().join("scaler.json");

    let pipeline = get_sources()
        .into_iter()
        .fold(Pipeline::builder(), |b, s| b.with_source(s))
        .build()?;

    // Training side: fit and persist the scaler.
    let cfg = SplitConfig::default();
    let prepared = pipeline.prepare(&demo_request(), &cfg).await?;
    let Some(scaler) = prepared.scaler() else {
        return Err("scaling was disabled".into());
    };
    scaler.save(&scaler_path)?;

    // Serving side: reload it and build the model input.
    let loaded = ScalerState::load(&scaler_path)?;
    let input = pipeline
        .forecast_input(&demo_request(), &loaded, cfg.window.window_size)
        .await?;
    println!(
        "model input: {} rows x {} columns, last hour {}",
        input.row_count(),
        input.num_columns(),
        input
            .timestamps()
            .last()
            .map(|t| spotcast::iso_hour(*t))
            .unwrap_or_default()
    );

    // Pretend the model predicted the scaled target; map it back to prices.
    let target = input.column_index(loaded.target()).unwrap_or(0);
    let fake_prediction = [input.value(input.row_count() - 1, target)];
    println!("prediction in EUR/MWh: {:.2}", loaded.inverse_target(&fake_prediction)[0]);

    // Differenced models predict changes; integrate them back from the last row.
    let raw = pipeline.dataset(&demo_request()).await?;
    let (_, state) = difference(&raw)?;
    let levels = state.integrate("SPOTPrice", &[0.5, -0.25, 1.0])?;
    println!("integrated deltas: {levels:?}");
    Ok(())
}
