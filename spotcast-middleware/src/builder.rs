//! Builder for composing sources with middleware layers.
//!
//! Layers are stored outermost-first (last added = outermost) and applied in
//! reverse during `build()`, so `builder.with_x().with_y()` yields `Y(X(raw))`.

use std::sync::Arc;

use serde_json::json;
use spotcast_core::{Middleware, SeriesSource};
use spotcast_types::CacheConfig;

use crate::cache::CacheLayer;

/// Generic middleware builder for composing a source with layered wrappers.
pub struct SourceBuilder {
    raw: Arc<dyn SeriesSource>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl SourceBuilder {
    /// Create a new builder from a raw, unwrapped source.
    #[must_use]
    pub fn new(raw: Arc<dyn SeriesSource>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    /// Add or replace the persisted cache layer.
    #[must_use]
    pub fn with_cache(mut self, cfg: &CacheConfig) -> Self {
        self.layers.retain(|m| m.name() != "CacheMiddleware");
        self.layers.insert(0, Box::new(CacheLayer::new(cfg.clone())));
        self
    }

    /// Remove the cache layer if present.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.layers.retain(|m| m.name() != "CacheMiddleware");
        self
    }

    /// Snapshot of the layer stack, outermost first, ending with the raw source.
    #[must_use]
    pub fn describe(&self) -> Vec<serde_json::Value> {
        self.layers
            .iter()
            .map(|l| json!({ "name": l.name(), "config": l.config_json() }))
            .chain(std::iter::once(
                json!({ "name": "RawSource", "config": { "name": self.raw.name() } }),
            ))
            .collect()
    }

    /// Apply every layer, innermost first, and return the wrapped source.
    #[must_use]
    pub fn build(self) -> Arc<dyn SeriesSource> {
        self.layers
            .into_iter()
            .rev()
            .fold(self.raw, |inner, layer| layer.apply(inner))
    }
}
