//! Tracing engine acquisition and bindings
//!
//! The tracing algorithm itself is an external capability: pixels in,
//! vector markup out. This module defines the capability trait, the
//! delivery sources it can be obtained from, and the loader that tries
//! those sources in order until one yields a usable engine.

mod loader;
mod remote;
mod vtrace;

pub use loader::{DEFAULT_SOURCE_TIMEOUT, EngineLoader, EngineStatus};
pub use remote::{EngineBinder, HttpEngineSource};
pub use vtrace::{BundledEngineSource, VtracerEngine};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::preprocess::PixelBuffer;
use crate::profile::ParameterProfile;

/// A bound tracing capability.
///
/// Implementations must be cheap to share across tasks; the loader hands
/// out one `Arc` binding for the whole session. Tracing is pure CPU work,
/// so the entry point is synchronous and callers are expected to move the
/// invocation off the async runtime themselves.
pub trait TraceEngine: Send + Sync {
    /// Convert a pixel buffer into vector markup under the given profile.
    fn trace(&self, buffer: &PixelBuffer, profile: &ParameterProfile) -> Result<String, TraceError>;
}

/// Failure raised by a bound engine during tracing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TraceError {
    message: String,
}

impl TraceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One of the redundant locations an engine can be obtained from.
#[async_trait]
pub trait EngineSource: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Attempt to produce a usable engine binding.
    async fn acquire(&self) -> Result<Arc<dyn TraceEngine>, SourceError>;
}

/// Failure of a single delivery source.
///
/// Recovered by moving on to the next source in the loader's list; never
/// surfaced to the conversion caller on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("source delivered no usable engine: {0}")]
    Binding(String),
}

/// Every delivery source was tried and none produced an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no delivery source produced a usable tracing engine")]
pub struct EngineUnavailable;
