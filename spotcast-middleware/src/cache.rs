use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use spotcast_core::persist::{load_series, save_series};
use spotcast_core::{EndBound, FetchRequest, Middleware, Series, SeriesSource, SpotcastError};
use spotcast_types::CacheConfig;

const META_FILE: &str = "meta.json";

/// Sidecar stored next to the cache file; the CSV itself carries no zone.
#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    tz: Tz,
}

/// A `SeriesSource` that persists fetched series and serves covered ranges from disk.
///
/// Requests with a fixed end bound that fall inside the cached span are sliced
/// from the cache file without calling the inner source. Everything else
/// (`Latest`, or a range reaching outside the cache) is fetched, merged with
/// the cached hours it touches, and written back. Fresh values win over
/// cached ones for the same hour.
pub struct CacheMiddleware {
    inner: Arc<dyn SeriesSource>,
    cfg: CacheConfig,
    lock: Mutex<()>,
}

impl CacheMiddleware {
    /// Wrap `inner` with a cache rooted at `cfg.directory`.
    pub fn new(inner: Arc<dyn SeriesSource>, cfg: CacheConfig) -> Self {
        Self {
            inner,
            cfg,
            lock: Mutex::new(()),
        }
    }

    /// Location of this source's cache file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.cfg.path_for(self.inner.name())
    }

    fn meta_path(&self) -> PathBuf {
        self.path().with_file_name(META_FILE)
    }

    /// Load the cached series; a missing or unreadable cache counts as empty.
    fn load(&self) -> Option<Series> {
        let path = self.path();
        if !path.exists() {
            return None;
        }
        let loaded = fs::read_to_string(self.meta_path())
            .map_err(SpotcastError::from)
            .and_then(|m| {
                serde_json::from_str::<CacheMeta>(&m).map_err(|e| SpotcastError::Persist(e.to_string()))
            })
            .and_then(|meta| load_series(&path, self.inner.name(), meta.tz));
        match loaded {
            Ok(s) => Some(s),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(source = self.inner.name(), error = %_e, "ignoring unreadable cache");
                None
            }
        }
    }

    fn store(&self, series: &Series) -> Result<(), SpotcastError> {
        save_series(&self.path(), series)?;
        let meta = serde_json::to_string(&CacheMeta { tz: series.tz })
            .map_err(|e| SpotcastError::Persist(e.to_string()))?;
        fs::write(self.meta_path(), meta)?;
        Ok(())
    }
}

fn end_local(req: &FetchRequest) -> Option<NaiveDateTime> {
    match req.end {
        EndBound::At { date, hour } => date.and_hms_opt(hour, 0, 0),
        EndBound::Latest => None,
    }
}

/// Cached points between local midnight of `req.start` and `end`, if the cache spans them.
fn covered_slice(cached: &Series, req: &FetchRequest, end: NaiveDateTime) -> Option<Series> {
    let start = req.start.and_hms_opt(0, 0, 0)?;
    let first = cached.points.first().map(|p| cached.local_time(p.timestamp))?;
    let last = cached.last_local_hour()?;
    if first > start || last < end {
        return None;
    }
    let points = cached
        .points
        .iter()
        .filter(|p| {
            let local = cached.local_time(p.timestamp);
            local >= start && local <= end
        })
        .cloned()
        .collect();
    Some(cached.clone().with_points(points))
}

/// True when the two spans overlap or sit next to each other.
fn touches(a: &Series, b: &Series) -> bool {
    match (a.points.first(), a.points.last(), b.points.first(), b.points.last()) {
        (Some(a0), Some(a1), Some(b0), Some(b1)) => {
            b0.timestamp <= a1.timestamp + Duration::hours(1)
                && a0.timestamp <= b1.timestamp + Duration::hours(1)
        }
        _ => false,
    }
}

fn merge(cached: Series, fresh: &Series) -> Series {
    let mut by_hour: BTreeMap<_, _> = cached
        .points
        .iter()
        .map(|p| (p.timestamp, p.clone()))
        .collect();
    for p in &fresh.points {
        by_hour.insert(p.timestamp, p.clone());
    }
    cached.with_points(by_hour.into_values().collect())
}

#[async_trait]
impl SeriesSource for CacheMiddleware {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn vendor(&self) -> &str {
        self.inner.vendor()
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::middleware::cache::fetch_range",
            skip(self),
            fields(source = self.inner.name()),
        )
    )]
    async fn fetch_range(&self, req: &FetchRequest) -> Result<Series, SpotcastError> {
        req.validate()?;
        let _guard = self.lock.lock().await;
        let cached = self.load();

        if let (Some(c), Some(end)) = (&cached, end_local(req))
            && let Some(hit) = covered_slice(c, req, end)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(rows = hit.len(), "cache hit");
            return Ok(hit);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(cached = cached.is_some(), "cache miss");
        let fresh = self.inner.fetch_range(req).await?;
        // merge() keys by timestamp and would collapse a repeated hour
        fresh.check_unique_hours()?;
        if fresh.is_empty() {
            return Ok(fresh);
        }
        let merged = match cached {
            Some(c) if c.fields == fresh.fields && c.tz == fresh.tz && touches(&c, &fresh) => {
                merge(c, &fresh)
            }
            _ => fresh.clone(),
        };
        self.store(&merged)?;
        Ok(fresh)
    }
}

/// Middleware factory that wraps a source in a [`CacheMiddleware`].
pub struct CacheLayer {
    cfg: CacheConfig,
}

impl CacheLayer {
    /// Layer persisting under `cfg`.
    #[must_use]
    pub const fn new(cfg: CacheConfig) -> Self {
        Self { cfg }
    }
}

impl Middleware for CacheLayer {
    fn apply(self: Box<Self>, inner: Arc<dyn SeriesSource>) -> Arc<dyn SeriesSource> {
        Arc::new(CacheMiddleware::new(inner, self.cfg))
    }

    fn name(&self) -> &'static str {
        "CacheMiddleware"
    }

    fn config_json(&self) -> serde_json::Value {
        json!({
            "directory": self.cfg.directory.display().to_string(),
            "file_name": self.cfg.file_name,
        })
    }
}
