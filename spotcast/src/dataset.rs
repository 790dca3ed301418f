use std::sync::Arc;

use spotcast_core::{
    AlignedTable, CalendarRange, DatasetReport, FetchRequest, RobustScaler, RowCountPolicy,
    ScalerState, Series, SeriesSource, SplitConfig, SpotcastError, WindowSet, WindowSpec, align,
    latest_window, repair_with_stats, split, train_test_split,
};

use crate::Pipeline;
use crate::util::{collapse_errors, join_with_deadline, relabel_timeout};

/// Chronologically split, optionally scaled data ready for windowing.
///
/// The scaler, when present, was fitted on the training rows only and has
/// been applied to both partitions.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    train: AlignedTable,
    test: AlignedTable,
    scaler: Option<ScalerState>,
    window: WindowSpec,
    target: String,
}

impl PreparedDataset {
    /// Split `table` and scale it according to `cfg`.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a bad test fraction or an unknown target,
    /// and `DegenerateColumn` when a training column is constant.
    pub fn from_table(
        table: &AlignedTable,
        cfg: &SplitConfig,
        target: &str,
    ) -> Result<Self, SpotcastError> {
        if table.column_index(target).is_none() {
            return Err(SpotcastError::InvalidArg(format!(
                "target column {target} not in table"
            )));
        }
        let (train, test) = train_test_split(table, cfg.test_fraction)?;
        let (train, test, scaler) = if cfg.scale {
            let state = RobustScaler::fit(&train, target)?;
            let train = state.transform(&train)?;
            let test = state.transform(&test)?;
            (train, test, Some(state))
        } else {
            (train, test, None)
        };
        Ok(Self {
            train,
            test,
            scaler,
            window: cfg.window,
            target: target.to_string(),
        })
    }

    /// Training rows (scaled when a scaler was fitted).
    #[must_use]
    pub const fn train(&self) -> &AlignedTable {
        &self.train
    }

    /// Test rows, scaled with the training statistics.
    #[must_use]
    pub const fn test(&self) -> &AlignedTable {
        &self.test
    }

    /// Fitted scaler, if scaling was requested.
    #[must_use]
    pub const fn scaler(&self) -> Option<&ScalerState> {
        self.scaler.as_ref()
    }

    /// Window geometry used for both partitions.
    #[must_use]
    pub const fn window(&self) -> WindowSpec {
        self.window
    }

    /// Target column name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Sliding windows over the training rows.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the window size is zero.
    pub fn train_windows(&self) -> Result<WindowSet<'_>, SpotcastError> {
        split(&self.train, &self.window, &self.target)
    }

    /// Sliding windows over the test rows.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the window size is zero.
    pub fn test_windows(&self) -> Result<WindowSet<'_>, SpotcastError> {
        split(&self.test, &self.window, &self.target)
    }
}

impl Pipeline {
    /// Fetch every source concurrently for the same request.
    ///
    /// Results come back in registration order. Any failure discards the
    /// successful fetches.
    ///
    /// # Errors
    /// Returns the single failing source's error, `AllSourcesFailed` when
    /// several fail, or `RequestTimeout` when the request deadline passes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::pipeline::fetch_all",
            skip(self),
            fields(sources = self.sources.len()),
            err,
        )
    )]
    pub async fn fetch_all(&self, req: &FetchRequest) -> Result<Vec<Series>, SpotcastError> {
        req.validate()?;
        let timeout = self.cfg.source_timeout;
        let tasks = self.sources.iter().map(|src| {
            let src: Arc<dyn SeriesSource> = Arc::clone(src);
            async move {
                let name = src.name().to_string();
                Self::source_call_with_timeout(&name, timeout, src.fetch_range(req)).await
            }
        });
        let results = join_with_deadline(tasks, self.cfg.request_timeout)
            .await
            .map_err(|e| relabel_timeout("fetch", e))?;

        let mut series = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for r in results {
            match r {
                Ok(s) => series.push(s),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(series)
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(failed = errors.len(), "discarding partial fetch results");
            Err(collapse_errors(errors))
        }
    }

    /// Fetch, repair, and align every source into one table.
    ///
    /// # Errors
    /// Propagates fetch errors and every repair or alignment integrity violation.
    pub async fn dataset(&self, req: &FetchRequest) -> Result<AlignedTable, SpotcastError> {
        self.dataset_with_report(req).await.map(|(table, _)| table)
    }

    /// Like [`Pipeline::dataset`], also reporting what repair and alignment did.
    ///
    /// With `EndBound::Latest` every source is repaired up to the last hour it
    /// delivered, and the aligner truncates to the shortest result.
    ///
    /// # Errors
    /// Propagates fetch errors and every repair or alignment integrity violation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::pipeline::dataset",
            skip(self),
            fields(start = %req.start, latest = req.end.is_latest()),
            err,
        )
    )]
    pub async fn dataset_with_report(
        &self,
        req: &FetchRequest,
    ) -> Result<(AlignedTable, DatasetReport), SpotcastError> {
        let raw = self.fetch_all(req).await?;

        let mut repaired = Vec::with_capacity(raw.len());
        let mut reports = Vec::with_capacity(raw.len());
        for series in &raw {
            let range = CalendarRange::resolve(req.start, &req.end, series.last_local_hour())?;
            let (fixed, report) = repair_with_stats(series, &range)?;
            repaired.push(fixed);
            reports.push(report);
        }

        let policy = RowCountPolicy::for_end(&req.end);
        let truncated_rows = match policy {
            RowCountPolicy::TruncateToShortest => {
                let min = repaired.iter().map(Series::len).min().unwrap_or(0);
                repaired.iter().map(|s| s.len() - min).sum()
            }
            _ => 0,
        };
        let table = align(&repaired, policy)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            rows = table.row_count(),
            columns = table.num_columns(),
            truncated_rows,
            "dataset aligned"
        );

        let report = DatasetReport {
            sources: reports,
            rows: table.row_count(),
            columns: table.num_columns(),
            truncated_rows,
        };
        Ok((table, report))
    }

    /// Build the dataset, split it chronologically, and fit the scaler on the training rows.
    ///
    /// # Errors
    /// Propagates [`Pipeline::dataset`] errors and [`PreparedDataset::from_table`] errors.
    pub async fn prepare(
        &self,
        req: &FetchRequest,
        cfg: &SplitConfig,
    ) -> Result<PreparedDataset, SpotcastError> {
        let table = self.dataset(req).await?;
        PreparedDataset::from_table(&table, cfg, &self.cfg.target_column)
    }

    /// The most recent `window_size` rows, scaled with a previously saved state.
    ///
    /// # Errors
    /// Propagates [`Pipeline::dataset`] errors, `InvalidArg` when the table is
    /// shorter than the window, and `ColumnMismatch` when `scaler` was fitted
    /// on other columns.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::pipeline::forecast_input",
            skip(self, scaler),
            err,
        )
    )]
    pub async fn forecast_input(
        &self,
        req: &FetchRequest,
        scaler: &ScalerState,
        window_size: usize,
    ) -> Result<AlignedTable, SpotcastError> {
        let table = self.dataset(req).await?;
        let recent = latest_window(&table, window_size)?;
        scaler.transform(&recent)
    }
}
