//! Ordered-source engine acquisition
//!
//! A single loader owns the process-wide engine binding and its status.
//! Sources are tried in order under a bounded wait; individual source
//! failures are recoverable and only exhaustion of the whole list is
//! reported to the caller.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use super::{EngineSource, EngineUnavailable, TraceEngine};

/// Upper bound on a single source acquisition attempt.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(15);

/// Loader lifecycle, published to presentation collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Acquires the tracing engine from an ordered list of delivery sources.
///
/// The binding, once made, lives for the rest of the session; rebinding
/// attempts are no-ops and the first successful source wins.
pub struct EngineLoader {
    sources: Vec<Box<dyn EngineSource>>,
    source_timeout: Duration,
    engine: OnceLock<Arc<dyn TraceEngine>>,
    status: watch::Sender<EngineStatus>,
}

impl EngineLoader {
    pub fn new(sources: Vec<Box<dyn EngineSource>>) -> Self {
        let (status, _) = watch::channel(EngineStatus::Idle);
        Self {
            sources,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            engine: OnceLock::new(),
            status,
        }
    }

    /// Override the per-source wait bound.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.borrow()
    }

    /// Watch status transitions (loading indicators, error banners).
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status.subscribe()
    }

    /// The bound engine, if a source has already delivered one.
    pub fn engine(&self) -> Option<Arc<dyn TraceEngine>> {
        self.engine.get().cloned()
    }

    /// Make the tracing engine available.
    ///
    /// Returns immediately when an engine is already bound, performing no
    /// source activity. Otherwise tries each delivery source in order:
    /// network failures, unusable payloads and timeouts all count as "this
    /// source failed" and the loader moves on to the next one. Only
    /// exhaustion of the whole list surfaces as [`EngineUnavailable`].
    pub async fn ensure_ready(&self) -> Result<Arc<dyn TraceEngine>, EngineUnavailable> {
        if let Some(engine) = self.engine() {
            return Ok(engine);
        }

        self.status.send_replace(EngineStatus::Loading);

        for source in &self.sources {
            match tokio::time::timeout(self.source_timeout, source.acquire()).await {
                Ok(Ok(engine)) => {
                    // First bind wins; a concurrent attempt that landed
                    // earlier keeps its engine.
                    let engine = Arc::clone(self.engine.get_or_init(|| engine));
                    self.status.send_replace(EngineStatus::Ready);
                    info!(source = source.name(), "tracing engine bound");
                    return Ok(engine);
                }
                Ok(Err(err)) => {
                    warn!(source = source.name(), %err, "engine source failed");
                }
                Err(_) => {
                    warn!(
                        source = source.name(),
                        timeout = ?self.source_timeout,
                        "engine source timed out"
                    );
                }
            }
        }

        // A concurrent attempt may have bound an engine while this one was
        // exhausting its sources.
        if let Some(engine) = self.engine() {
            self.status.send_replace(EngineStatus::Ready);
            return Ok(engine);
        }

        self.status.send_replace(EngineStatus::Error);
        Err(EngineUnavailable)
    }

    /// Re-run the full source list after a failed load.
    ///
    /// Each call is an independent pass over the sources; callers may
    /// retry any number of times without corrupting loader state.
    pub async fn retry(&self) -> Result<Arc<dyn TraceEngine>, EngineUnavailable> {
        self.ensure_ready().await
    }
}
