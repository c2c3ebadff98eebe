//! Conversion orchestration
//!
//! Sequences engine readiness, preprocessing, parameter resolution, the
//! trace invocation and output normalization, and owns the process-wide
//! conversion state machine. At most one conversion result is live at a
//! time: every state transition is gated on an attempt generation, so a
//! conversion superseded by a newer request discards its completion
//! instead of delivering it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task;
use tracing::debug;

use crate::engine::{EngineLoader, EngineUnavailable, TraceError};
use crate::preprocess::{self, ImageAsset, PreprocessError};
use crate::profile::{ParameterProfile, TraceSettings};

/// Vector markup produced by a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    /// The SVG text.
    pub markup: String,
    /// Whether fixed pixel dimensions were rewritten to percentage sizing.
    pub normalized: bool,
}

/// Why a conversion attempt terminated without a result.
///
/// None of these are fatal: every failure leaves the converter able to
/// accept a new attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ConvertError {
    #[error("image is {size} bytes, over the 10 MiB intake limit")]
    AssetTooLarge { size: usize },
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("no tracing engine is available")]
    EngineUnavailable,
    #[error("tracing engine failed: {0}")]
    TracingEngineFailure(String),
    #[error("superseded by a newer conversion")]
    Superseded,
}

impl From<PreprocessError> for ConvertError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::AssetTooLarge { size } => ConvertError::AssetTooLarge { size },
            PreprocessError::Decode(e) => ConvertError::Decode(e.to_string()),
        }
    }
}

impl From<EngineUnavailable> for ConvertError {
    fn from(_: EngineUnavailable) -> Self {
        ConvertError::EngineUnavailable
    }
}

impl From<TraceError> for ConvertError {
    fn from(err: TraceError) -> Self {
        ConvertError::TracingEngineFailure(err.to_string())
    }
}

/// Conversion lifecycle published to presentation collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConversionState {
    Idle,
    Processing,
    Succeeded(ConversionResult),
    Failed(ConvertError),
}

/// Runs conversions and owns the conversion state machine.
pub struct Converter {
    loader: Arc<EngineLoader>,
    state: watch::Sender<ConversionState>,
    attempt: AtomicU64,
}

impl Converter {
    pub fn new(loader: Arc<EngineLoader>) -> Self {
        let (state, _) = watch::channel(ConversionState::Idle);
        Self {
            loader,
            state,
            attempt: AtomicU64::new(0),
        }
    }

    pub fn loader(&self) -> &EngineLoader {
        &self.loader
    }

    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    /// Watch conversion state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.subscribe()
    }

    /// The published result of the most recent successful conversion.
    pub fn result(&self) -> Option<ConversionResult> {
        match &*self.state.borrow() {
            ConversionState::Succeeded(result) => Some(result.clone()),
            _ => None,
        }
    }

    /// Drop the current result and return to `Idle`, invalidating any
    /// conversion still in flight. Call when the source asset is replaced
    /// or the session is cleared.
    pub fn reset(&self) {
        self.attempt.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ConversionState::Idle);
    }

    /// Run one full conversion: ensure the engine is ready, preprocess the
    /// asset, resolve the parameter profile, trace, and normalize the
    /// output for container-responsive sizing.
    ///
    /// Returns [`ConvertError::Superseded`] when a newer conversion (or a
    /// [`Converter::reset`]) started while this one was in flight; the
    /// stale outcome is discarded rather than published.
    pub async fn convert(
        &self,
        asset: ImageAsset,
        settings: TraceSettings,
    ) -> Result<ConversionResult, ConvertError> {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;

        let engine = match self.loader.ensure_ready().await {
            Ok(engine) => engine,
            Err(EngineUnavailable) => {
                return Err(self.fail(attempt, ConvertError::EngineUnavailable));
            }
        };

        self.publish(attempt, ConversionState::Processing);
        // Give the host a chance to render the processing indicator before
        // the CPU-bound work starts.
        task::yield_now().await;

        let profile = ParameterProfile::resolve(settings.detail, settings.colors);
        let detail = settings.detail;
        let traced = task::spawn_blocking(move || -> Result<String, ConvertError> {
            let buffer = preprocess::prepare(&asset, detail)?;
            Ok(engine.trace(&buffer, &profile)?)
        })
        .await;

        let markup = match traced {
            Ok(Ok(markup)) => markup,
            Ok(Err(err)) => return Err(self.fail(attempt, err)),
            // A panicking engine is contained by the task boundary.
            Err(join) => {
                let err = ConvertError::TracingEngineFailure(join.to_string());
                return Err(self.fail(attempt, err));
            }
        };

        let (markup, normalized) = normalize_dimensions(&markup);
        let result = ConversionResult { markup, normalized };

        if self.publish(attempt, ConversionState::Succeeded(result.clone())) {
            Ok(result)
        } else {
            Err(ConvertError::Superseded)
        }
    }

    fn fail(&self, attempt: u64, err: ConvertError) -> ConvertError {
        if self.publish(attempt, ConversionState::Failed(err.clone())) {
            err
        } else {
            ConvertError::Superseded
        }
    }

    /// Publish a state transition unless this attempt has been superseded.
    fn publish(&self, attempt: u64, state: ConversionState) -> bool {
        if self.attempt.load(Ordering::SeqCst) != attempt {
            debug!(attempt, "discarding stale conversion transition");
            return false;
        }
        self.state.send_replace(state);
        true
    }
}

/// Rewrite the first fixed `width="N"` and `height="N"` attributes to
/// percentage sizing so the markup fills its container instead of
/// rendering at intrinsic pixel size. Everything else is left untouched.
pub fn normalize_dimensions(markup: &str) -> (String, bool) {
    let mut out = markup.to_string();
    let width = replace_first_pixel_attr(&mut out, "width=\"");
    let height = replace_first_pixel_attr(&mut out, "height=\"");
    (out, width || height)
}

/// Replace the first `needle<digits>"` occurrence with `needle100%"`.
fn replace_first_pixel_attr(markup: &mut String, needle: &str) -> bool {
    let mut from = 0;
    while let Some(found) = markup[from..].find(needle) {
        let start = from + found + needle.len();
        let rest = &markup[start..];
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 && rest[digits..].starts_with('"') {
            markup.replace_range(start..start + digits, "100%");
            return true;
        }
        from = start;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rewrites_both_dimensions_once() {
        let markup = r#"<svg width="800" height="600"><rect width="20" height="10"/></svg>"#;
        let (out, normalized) = normalize_dimensions(markup);

        assert!(normalized);
        assert_eq!(
            out,
            r#"<svg width="100%" height="100%"><rect width="20" height="10"/></svg>"#
        );
        assert_eq!(out.matches("width=\"100%\"").count(), 1);
        assert_eq!(out.matches("height=\"100%\"").count(), 1);
    }

    #[test]
    fn test_normalize_skips_non_numeric_dimensions() {
        let markup = r#"<svg width="100%" height="auto"><path d="M0 0"/></svg>"#;
        let (out, normalized) = normalize_dimensions(markup);

        assert!(!normalized);
        assert_eq!(out, markup);
    }

    #[test]
    fn test_normalize_leaves_other_content_alone() {
        let markup = r#"<svg viewBox="0 0 800 600" width="800"><path d="M800 600"/></svg>"#;
        let (out, _) = normalize_dimensions(markup);

        assert!(out.contains(r#"viewBox="0 0 800 600""#));
        assert!(out.contains(r#"d="M800 600""#));
        assert!(out.contains(r#"width="100%""#));
    }

    #[test]
    fn test_normalize_without_dimensions() {
        let markup = "<svg><path d=\"M0 0\"/></svg>";
        let (out, normalized) = normalize_dimensions(markup);

        assert!(!normalized);
        assert_eq!(out, markup);
    }
}
