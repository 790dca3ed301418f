use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use spotcast_core::{FetchRequest, Series, SeriesSource, SpotcastError};

use crate::MockSource;

/// Instruction for how `fetch_range` should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Serve the wrapped fixture for the requested range.
    Fixture,
    /// Return the provided series regardless of the request.
    Return(Series),
    /// Fail immediately with the provided error.
    Fail(SpotcastError),
    /// Hang indefinitely (simulate a stalled provider).
    Hang,
}

#[derive(Debug)]
struct InternalState {
    behavior: MockBehavior,
    dropped: Vec<DateTime<Utc>>,
    duplicated: Vec<DateTime<Utc>>,
    requests: Vec<FetchRequest>,
}

impl Default for InternalState {
    fn default() -> Self {
        Self {
            behavior: MockBehavior::Fixture,
            dropped: Vec::new(),
            duplicated: Vec::new(),
            requests: Vec::new(),
        }
    }
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for subsequent fetches.
    pub async fn set_behavior(&self, behavior: MockBehavior) {
        self.state.lock().await.behavior = behavior;
    }

    /// Remove these instants from every delivered series.
    pub async fn drop_hours(&self, hours: impl IntoIterator<Item = DateTime<Utc>>) {
        self.state.lock().await.dropped.extend(hours);
    }

    /// Deliver these instants twice.
    pub async fn duplicate_hours(&self, hours: impl IntoIterator<Item = DateTime<Utc>>) {
        self.state.lock().await.duplicated.extend(hours);
    }

    /// Copy of every request received so far.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Reset behavior, damage rules, and the request log.
    pub async fn clear_all(&self) {
        *self.state.lock().await = InternalState::default();
    }
}

/// A source that defers all behavior to an external controller.
pub struct DynamicMockSource {
    inner: MockSource,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockSource {
    /// Wrap a fixture source and return it with its controller.
    #[must_use]
    pub fn new_with_controller(inner: MockSource) -> (Arc<dyn SeriesSource>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { inner, state });
        (me as Arc<dyn SeriesSource>, controller)
    }
}

#[async_trait]
impl SeriesSource for DynamicMockSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn vendor(&self) -> &str {
        "DynamicMock"
    }

    async fn fetch_range(&self, req: &FetchRequest) -> Result<Series, SpotcastError> {
        // snapshot without holding the lock across await points
        let (behavior, dropped, duplicated) = {
            let mut guard = self.state.lock().await;
            guard.requests.push(*req);
            (
                guard.behavior.clone(),
                guard.dropped.clone(),
                guard.duplicated.clone(),
            )
        };

        let mut series = match behavior {
            MockBehavior::Fixture => self.inner.series(req)?,
            MockBehavior::Return(s) => s,
            MockBehavior::Fail(e) => return Err(e),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        series.points.retain(|p| !dropped.contains(&p.timestamp));
        let mut damaged = Vec::with_capacity(series.points.len() + duplicated.len());
        for p in series.points {
            let twice = duplicated.contains(&p.timestamp);
            damaged.push(p.clone());
            if twice {
                damaged.push(p);
            }
        }
        series.points = damaged;
        Ok(series)
    }
}
