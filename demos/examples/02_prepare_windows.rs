use spotcast::{Pipeline, SplitConfig, WindowSpec};
use spotcast_demos::common::{demo_request, get_sources, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let pipeline = get_sources()
        .into_iter()
        .fold(Pipeline::builder(), |b, s| b.with_source(s))
        .target_column("SPOTPrice")
        .build()?;

    // One week of history predicting the price a day ahead.
    let cfg = SplitConfig {
        window: WindowSpec::for_horizon(7 * 24, 24),
        ..SplitConfig::default()
    };
    let prepared = pipeline.prepare(&demo_request(), &cfg).await?;

    let train = prepared.train_windows()?;
    let test = prepared.test_windows()?;
    println!(
        "train rows={} windows={} | test rows={} windows={}",
        prepared.train().row_count(),
        train.len(),
        prepared.test().row_count(),
        test.len()
    );

    if let Some(scaler) = prepared.scaler() {
        let s = scaler.target_scale();
        println!("target scale: median={:.3} iqr={:.3}", s.median(), s.iqr());
    }

    let tensor = train.to_tensor();
    println!("train tensor shape: {:?}", tensor.shape);

    for (i, batch) in train.shuffled_batches(64, 7)?.take(3).enumerate() {
        let first = batch.first().map(|w| w.index);
        println!("batch {i}: {} windows, first index {first:?}", batch.len());
    }
    Ok(())
}
