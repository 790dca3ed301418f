use std::collections::HashSet;

use chrono::Duration;

use crate::series::iso_hour;
use crate::{AlignedTable, RowCountPolicy, Series, SpotcastError};

/// Join repaired series into one wide table.
///
/// The first series is the timestamp backbone. Every other series is joined
/// as-of: for each backbone timestamp the nearest preceding-or-equal point is
/// taken if it is less than one hour older. Hour-level gaps are never bridged.
///
/// Under [`RowCountPolicy::TruncateToShortest`] every series is first cut to
/// the shortest length, keeping its oldest rows.
///
/// # Errors
/// - `InvalidArg` for an empty input list or a malformed point.
/// - `RowCountMismatch` under `Exact` when lengths differ.
/// - `UnorderedTimestamps` if a series is not strictly increasing.
/// - `DuplicateColumn` if two series share a field name.
/// - `AlignmentGap` for the first cell left empty or holding `NaN`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "spotcast::align",
        skip(series),
        fields(series = series.len(), policy = ?policy),
        err,
    )
)]
pub fn align(series: &[Series], policy: RowCountPolicy) -> Result<AlignedTable, SpotcastError> {
    let Some(backbone) = series.first() else {
        return Err(SpotcastError::InvalidArg("no series to align".into()));
    };

    let mut seen = HashSet::new();
    for s in series {
        s.check_shape()?;
        for f in &s.fields {
            if !seen.insert(f.as_str()) {
                return Err(SpotcastError::DuplicateColumn { column: f.clone() });
            }
        }
    }

    let rows = match policy {
        RowCountPolicy::TruncateToShortest => {
            let shortest = series.iter().map(Series::len).min().unwrap_or(0);
            #[cfg(feature = "tracing")]
            {
                let dropped: usize = series.iter().map(|s| s.len() - shortest).sum();
                if dropped > 0 {
                    tracing::info!(shortest, dropped, "truncated series to a common length");
                }
            }
            shortest
        }
        _ => {
            for s in &series[1..] {
                if s.len() != backbone.len() {
                    return Err(SpotcastError::RowCountMismatch {
                        left: backbone.name.clone(),
                        left_rows: backbone.len(),
                        right: s.name.clone(),
                        right_rows: s.len(),
                    });
                }
            }
            backbone.len()
        }
    };

    for s in series {
        if let Some(row) = s.points[..rows]
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SpotcastError::UnorderedTimestamps {
                series: s.name.clone(),
                row: row + 1,
            });
        }
    }

    let columns: Vec<String> = series.iter().flat_map(|s| s.fields.iter().cloned()).collect();
    let width = columns.len();
    let timestamps: Vec<_> = backbone.points[..rows].iter().map(|p| p.timestamp).collect();
    let mut data = vec![f64::NAN; rows * width];

    let mut offset = 0;
    for s in series {
        let points = &s.points[..rows];
        let mut j = 0usize;
        for (r, ts) in timestamps.iter().enumerate() {
            while j + 1 < points.len() && points[j + 1].timestamp <= *ts {
                j += 1;
            }
            let Some(p) = points.get(j) else { continue };
            if p.timestamp <= *ts && *ts - p.timestamp < Duration::hours(1) {
                data[r * width + offset..r * width + offset + s.fields.len()]
                    .copy_from_slice(&p.values);
            }
        }
        offset += s.fields.len();
    }

    if let Some(cell) = data.iter().position(|v| v.is_nan()) {
        let row = cell / width;
        return Err(SpotcastError::AlignmentGap {
            column: columns[cell % width].clone(),
            row,
            timestamp: iso_hour(timestamps[row]),
        });
    }

    AlignedTable::new(timestamps, columns, data)
}
