use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use spotcast_core::{PipelineConfig, SeriesSource, SpotcastError};

/// Orchestrator that fetches every registered source and turns the result
/// into aligned, model-ready data.
pub struct Pipeline {
    pub(crate) sources: Vec<Arc<dyn SeriesSource>>,
    pub(crate) cfg: PipelineConfig,
}

/// Builder for constructing a `Pipeline` with custom configuration.
pub struct PipelineBuilder {
    sources: Vec<Arc<dyn SeriesSource>>,
    cfg: PipelineConfig,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Create a new builder with default configuration and no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: vec![],
            cfg: PipelineConfig::default(),
        }
    }

    /// Register a source.
    ///
    /// Registration order matters: the first source is the timestamp backbone
    /// of the aligned table and its columns come first.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: PipelineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Column that windows predict and the target scaler is fitted on.
    #[must_use]
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.cfg.target_column = column.into();
        self
    }

    /// Bound each individual source fetch.
    #[must_use]
    pub const fn source_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.source_timeout = Some(timeout);
        self
    }

    /// Bound the whole fetch fan-out.
    ///
    /// When exceeded, returns a `RequestTimeout` error for the operation.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Build the `Pipeline`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no sources were registered or two sources share a name.
    pub fn build(self) -> Result<Pipeline, SpotcastError> {
        if self.sources.is_empty() {
            return Err(SpotcastError::InvalidArg(
                "no sources registered; add at least one via with_source(...)".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for s in &self.sources {
            if !seen.insert(s.name()) {
                return Err(SpotcastError::InvalidArg(format!(
                    "source {} registered twice",
                    s.name()
                )));
            }
        }
        if self.cfg.target_column.is_empty() {
            return Err(SpotcastError::InvalidArg("target column is empty".into()));
        }
        Ok(Pipeline {
            sources: self.sources,
            cfg: self.cfg,
        })
    }
}

/// Attach the source name to an error that does not already carry one.
pub fn tag_err(source_name: &str, e: SpotcastError) -> SpotcastError {
    match e {
        e @ (SpotcastError::Source { .. }
        | SpotcastError::SourceTimeout { .. }
        | SpotcastError::RequestTimeout { .. }
        | SpotcastError::AllSourcesFailed(_)) => e,
        e if e.is_integrity_violation() => e,
        other => SpotcastError::Source {
            source_name: source_name.to_string(),
            msg: other.to_string(),
        },
    }
}

/// Apply an optional request-level deadline to a future.
pub(crate) async fn with_request_deadline<T, Fut>(
    deadline: Option<Duration>,
    fut: Fut,
) -> Result<T, SpotcastError>
where
    Fut: core::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| SpotcastError::request_timeout("request")),
        None => Ok(fut.await),
    }
}

impl Pipeline {
    /// Start building a new `Pipeline`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use spotcast::Pipeline;
    /// use spotcast_mock::MockSource;
    ///
    /// let pipeline = Pipeline::builder()
    ///     .with_source(Arc::new(MockSource::price()))
    ///     .with_source(Arc::new(MockSource::grid()))
    ///     .source_timeout(std::time::Duration::from_secs(30))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Names of the registered sources, in registration order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Wrap a source future with an optional timeout and standardized timeout error mapping.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::core::source_call_with_timeout",
            skip(fut),
            fields(
                timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            ),
        )
    )]
    pub(crate) async fn source_call_with_timeout<T, Fut>(
        source_name: &str,
        timeout: Option<Duration>,
        fut: Fut,
    ) -> Result<T, SpotcastError>
    where
        Fut: core::future::Future<Output = Result<T, SpotcastError>>,
    {
        let res = match timeout {
            Some(t) => (tokio::time::timeout(t, fut).await)
                .unwrap_or_else(|_| Err(SpotcastError::source_timeout(source_name))),
            None => fut.await,
        };
        res.map_err(|e| tag_err(source_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_err_wraps_plain_errors_only() {
        let e = tag_err("grid", SpotcastError::Persist("disk full".into()));
        assert_eq!(e, SpotcastError::source_failure("grid", "persist: disk full"));

        let timeout = SpotcastError::source_timeout("weather");
        assert_eq!(tag_err("grid", timeout.clone()), timeout);

        let dup = SpotcastError::DuplicateTimestamp {
            series: "price".into(),
            timestamp: "2020-01-01T00:00:00".into(),
        };
        assert_eq!(tag_err("price", dup.clone()), dup);
    }

    #[tokio::test]
    async fn request_deadline_maps_to_request_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            1
        };
        let res = with_request_deadline(Some(Duration::from_millis(1)), slow).await;
        assert!(matches!(res, Err(SpotcastError::RequestTimeout { .. })));
        assert_eq!(with_request_deadline(None, async { 2 }).await, Ok(2));
    }
}
