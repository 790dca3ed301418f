use chrono::NaiveDate;
use spotcast::{EndBound, FetchRequest, Pipeline};
use spotcast_demos::common::{get_sources, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut builder = Pipeline::builder();
    for source in get_sources() {
        builder = builder.with_source(source);
    }
    let pipeline = builder.build()?;

    // A range across the spring daylight-saving switch, ending mid-day.
    let start = NaiveDate::from_ymd_opt(2020, 3, 27).unwrap();
    let end = EndBound::At {
        date: NaiveDate::from_ymd_opt(2020, 3, 30).unwrap(),
        hour: 11,
    };
    let (table, report) = pipeline
        .dataset_with_report(&FetchRequest::new(start, end))
        .await?;

    println!("--- Repair ---");
    for r in &report.sources {
        println!(
            "{:<8} raw={:>3} repaired={:>3} filled={} dst_days={}",
            r.series, r.raw_rows, r.repaired_rows, r.filled_hours, r.dst_days
        );
    }

    println!("--- Aligned table ({} rows) ---", table.row_count());
    println!("Time                 {}", table.columns().join("  "));
    for i in [0, 1, table.row_count() - 1] {
        let cells: Vec<String> = table.row(i).iter().map(|v| format!("{v:.1}")).collect();
        println!("{}  {}", spotcast::iso_hour(table.timestamps()[i]), cells.join("  "));
    }
    Ok(())
}
