use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::series::iso_hour;
use crate::{AlignedTable, HourlyPoint, Series, SpotcastError, Tz};

/// Name of the leading timestamp column.
pub const TIME_COLUMN: &str = "Time";
/// Timestamp format of the `Time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn csv_err(e: csv::Error) -> SpotcastError {
    SpotcastError::Persist(e.to_string())
}

fn write_rows<'r, W: Write>(
    writer: W,
    fields: &[String],
    rows: impl Iterator<Item = (DateTime<Utc>, &'r [f64])>,
) -> Result<(), SpotcastError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(std::iter::once(TIME_COLUMN).chain(fields.iter().map(String::as_str)))
        .map_err(csv_err)?;
    for (ts, values) in rows {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(iso_hour(ts));
        record.extend(values.iter().map(|v| if v.is_nan() { String::new() } else { v.to_string() }));
        w.write_record(&record).map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

/// Rows read back from the cache format.
struct Rows {
    fields: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Vec<f64>>,
}

fn read_rows<R: Read>(reader: R, label: &str) -> Result<Rows, SpotcastError> {
    let mut r = csv::Reader::from_reader(reader);
    let headers = r.headers().map_err(csv_err)?.clone();
    let mut cols = headers.iter();
    if cols.next() != Some(TIME_COLUMN) {
        return Err(SpotcastError::Persist(format!(
            "{label}: first column must be {TIME_COLUMN}"
        )));
    }
    let fields: Vec<String> = cols.map(str::to_string).collect();

    let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
    let mut values = Vec::new();
    for (row, record) in r.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw_ts = record.get(0).unwrap_or_default();
        let ts = NaiveDateTime::parse_from_str(raw_ts, TIME_FORMAT)
            .map_err(|e| SpotcastError::Persist(format!("{label}: row {row}: bad time {raw_ts:?}: {e}")))?
            .and_utc();
        if let Some(prev) = timestamps.last() {
            if ts == *prev {
                return Err(SpotcastError::DuplicateTimestamp {
                    series: label.to_string(),
                    timestamp: iso_hour(ts),
                });
            }
            if ts < *prev {
                return Err(SpotcastError::UnorderedTimestamps {
                    series: label.to_string(),
                    row,
                });
            }
        }
        let vals = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.is_empty() {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>().map_err(|e| {
                        SpotcastError::Persist(format!("{label}: row {row}: bad value {cell:?}: {e}"))
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        timestamps.push(ts);
        values.push(vals);
    }
    Ok(Rows {
        fields,
        timestamps,
        values,
    })
}

/// Write a series in the cache format. Missing values become empty cells.
///
/// # Errors
/// Returns `Persist` on I/O or encoding failures.
pub fn write_series<W: Write>(writer: W, series: &Series) -> Result<(), SpotcastError> {
    write_rows(
        writer,
        &series.fields,
        series.points.iter().map(|p| (p.timestamp, p.values.as_slice())),
    )
}

/// Read a series written by [`write_series`].
///
/// # Errors
/// - `Persist` for malformed files.
/// - `DuplicateTimestamp` or `UnorderedTimestamps` if rows are not strictly ascending.
pub fn read_series<R: Read>(reader: R, name: &str, tz: Tz) -> Result<Series, SpotcastError> {
    let rows = read_rows(reader, name)?;
    let points = rows
        .timestamps
        .into_iter()
        .zip(rows.values)
        .map(|(ts, v)| HourlyPoint::new(ts, v))
        .collect();
    let series = Series::new(name, rows.fields, tz).with_points(points);
    series
        .check_shape()
        .map_err(|e| SpotcastError::Persist(e.to_string()))?;
    Ok(series)
}

/// Write an aligned table in the cache format.
///
/// # Errors
/// Returns `Persist` on I/O or encoding failures.
pub fn write_table<W: Write>(writer: W, table: &AlignedTable) -> Result<(), SpotcastError> {
    write_rows(
        writer,
        table.columns(),
        (0..table.row_count()).map(|r| (table.timestamps()[r], table.row(r))),
    )
}

/// Read a table written by [`write_table`]; table invariants are re-checked.
///
/// # Errors
/// Same as [`read_series`], plus any [`AlignedTable::new`] violation.
pub fn read_table<R: Read>(reader: R) -> Result<AlignedTable, SpotcastError> {
    let rows = read_rows(reader, "table")?;
    let width = rows.fields.len();
    if let Some(row) = rows.values.iter().position(|v| v.len() != width) {
        return Err(SpotcastError::Persist(format!("table: row {row} has the wrong width")));
    }
    AlignedTable::new(rows.timestamps, rows.fields, rows.values.concat())
}

/// Write a series to `path`, creating parent directories.
///
/// # Errors
/// Returns `Persist` on I/O or encoding failures.
pub fn save_series(path: &Path, series: &Series) -> Result<(), SpotcastError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_series(File::create(path)?, series)
}

/// Read a series from `path`.
///
/// # Errors
/// Same as [`read_series`], plus `Persist` if the file cannot be opened.
pub fn load_series(path: &Path, name: &str, tz: Tz) -> Result<Series, SpotcastError> {
    read_series(File::open(path)?, name, tz)
}
