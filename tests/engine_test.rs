//! Integration tests for engine acquisition
//!
//! Exercises the loader's ordered-source behavior with deterministic stub
//! sources; no network access is involved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use vectorit::{
    EngineLoader, EngineSource, EngineStatus, EngineUnavailable, PixelBuffer, SourceError,
    TraceEngine, TraceError,
};
use vectorit::profile::ParameterProfile;

struct StubEngine;

impl TraceEngine for StubEngine {
    fn trace(&self, _buffer: &PixelBuffer, _profile: &ParameterProfile) -> Result<String, TraceError> {
        Ok("<svg width=\"10\" height=\"10\"/>".to_string())
    }
}

/// Source that fails its first `failures` acquisitions, then succeeds.
struct FlakySource {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl FlakySource {
    fn new(failures: usize) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                failures,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl EngineSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn acquire(&self) -> Result<Arc<dyn TraceEngine>, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(SourceError::Network("connection refused".to_string()))
        } else {
            Ok(Arc::new(StubEngine))
        }
    }
}

/// Source that never completes its acquisition.
struct StalledSource;

#[async_trait]
impl EngineSource for StalledSource {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn acquire(&self) -> Result<Arc<dyn TraceEngine>, SourceError> {
        std::future::pending().await
    }
}

// ============================================================================
// Acquisition
// ============================================================================

#[tokio::test]
async fn test_first_source_binds_engine() {
    let (source, _) = FlakySource::new(0);
    let loader = EngineLoader::new(vec![Box::new(source)]);

    assert_eq!(loader.status(), EngineStatus::Idle);
    assert!(loader.ensure_ready().await.is_ok());
    assert_eq!(loader.status(), EngineStatus::Ready);
    assert!(loader.engine().is_some());
}

#[tokio::test]
async fn test_ensure_ready_is_idempotent() {
    let (source, calls) = FlakySource::new(0);
    let loader = EngineLoader::new(vec![Box::new(source)]);

    loader.ensure_ready().await.unwrap();
    loader.ensure_ready().await.unwrap();
    loader.ensure_ready().await.unwrap();

    // Only the first call performs any source activity.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(loader.status(), EngineStatus::Ready);
}

#[tokio::test]
async fn test_falls_through_failed_sources() {
    let (broken, broken_calls) = FlakySource::new(usize::MAX);
    let (working, working_calls) = FlakySource::new(0);
    let loader = EngineLoader::new(vec![Box::new(broken), Box::new(working)]);

    assert!(loader.ensure_ready().await.is_ok());
    assert_eq!(broken_calls.load(Ordering::SeqCst), 1);
    assert_eq!(working_calls.load(Ordering::SeqCst), 1);
    assert_eq!(loader.status(), EngineStatus::Ready);
}

// ============================================================================
// Exhaustion and retry
// ============================================================================

#[tokio::test]
async fn test_exhaustion_reports_error_status() {
    let (a, _) = FlakySource::new(usize::MAX);
    let (b, _) = FlakySource::new(usize::MAX);
    let loader = EngineLoader::new(vec![Box::new(a), Box::new(b)]);

    assert!(matches!(loader.ensure_ready().await, Err(EngineUnavailable)));
    assert_eq!(loader.status(), EngineStatus::Error);
    assert!(loader.engine().is_none());
}

#[tokio::test]
async fn test_retry_after_source_recovers() {
    // Unreachable on the first pass, reachable on the second.
    let (source, calls) = FlakySource::new(1);
    let loader = EngineLoader::new(vec![Box::new(source)]);

    assert!(loader.ensure_ready().await.is_err());
    assert_eq!(loader.status(), EngineStatus::Error);

    assert!(loader.retry().await.is_ok());
    assert_eq!(loader.status(), EngineStatus::Ready);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test]
async fn test_stalled_source_times_out_and_next_is_tried() {
    let (working, _) = FlakySource::new(0);
    let loader = EngineLoader::new(vec![Box::new(StalledSource), Box::new(working)])
        .with_source_timeout(Duration::from_millis(50));

    assert!(loader.ensure_ready().await.is_ok());
    assert_eq!(loader.status(), EngineStatus::Ready);
}

#[tokio::test]
async fn test_all_sources_stalled_is_exhaustion() {
    let loader = EngineLoader::new(vec![Box::new(StalledSource), Box::new(StalledSource)])
        .with_source_timeout(Duration::from_millis(50));

    assert!(matches!(loader.ensure_ready().await, Err(EngineUnavailable)));
    assert_eq!(loader.status(), EngineStatus::Error);
}

// ============================================================================
// Status publication
// ============================================================================

#[tokio::test]
async fn test_loading_status_is_observable() {
    let loader = Arc::new(
        EngineLoader::new(vec![Box::new(StalledSource)])
            .with_source_timeout(Duration::from_millis(200)),
    );

    let task = tokio::spawn({
        let loader = Arc::clone(&loader);
        async move { loader.ensure_ready().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loader.status(), EngineStatus::Loading);

    assert!(task.await.unwrap().is_err());
    assert_eq!(loader.status(), EngineStatus::Error);
}

#[tokio::test]
async fn test_subscribers_see_terminal_status() {
    let (source, _) = FlakySource::new(0);
    let loader = EngineLoader::new(vec![Box::new(source)]);
    let mut status = loader.subscribe();

    loader.ensure_ready().await.unwrap();

    status.changed().await.unwrap();
    assert_eq!(*status.borrow(), EngineStatus::Ready);
}
