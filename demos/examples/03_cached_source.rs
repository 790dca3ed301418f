use spotcast::{CacheConfig, Pipeline, SourceBuilder};
use spotcast_demos::common::{demo_request, get_sources, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cache = CacheConfig::new(dir.path());

    let cached: Vec<_> = get_sources()
        .into_iter()
        .map(|raw| SourceBuilder::new(raw).with_cache(&cache))
        .collect();
    for b in &cached {
        println!("{}", render_stack(&b.describe()));
    }

    let pipeline = cached
        .into_iter()
        .map(SourceBuilder::build)
        .fold(Pipeline::builder(), |b, s| b.with_source(s))
        .build()?;

    let first = pipeline.dataset(&demo_request()).await?;
    let second = pipeline.dataset(&demo_request()).await?;
    println!(
        "first={} rows, second={} rows, identical={}",
        first.row_count(),
        second.row_count(),
        first == second
    );
    for name in pipeline.source_names() {
        let path = cache.path_for(name);
        println!("{name}: cached at {} ({})", path.display(), path.exists());
    }
    Ok(())
}

fn render_stack(stack: &[impl std::fmt::Display]) -> String {
    stack.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}
