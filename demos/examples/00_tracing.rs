use spotcast::Pipeline;
use spotcast_demos::common::{demo_request, get_sources};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=debug SPOTCAST_DEMOS_LATENCY_MS=200
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let pipeline = get_sources()
        .into_iter()
        .fold(Pipeline::builder(), |b, s| b.with_source(s))
        .build()?;

    let (table, report) = pipeline.dataset_with_report(&demo_request()).await?;
    tracing::info!(rows = table.row_count(), sources = report.sources.len(), "done");
    println!("aligned {} rows x {} columns", table.row_count(), table.num_columns());
    Ok(())
}
