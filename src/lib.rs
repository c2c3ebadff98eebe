//! # vectorit
//!
//! A Rust library for converting raster images into scalable vector
//! markup, entirely on the consumer's device.
//!
//! ## Features
//!
//! - **Engine loading**: the tracing engine is an external capability,
//!   acquired from an ordered list of redundant delivery sources with a
//!   bounded wait per source and a bundled fallback
//! - **Adaptive profiles**: a user-facing detail level (smooth / sharp /
//!   exact) resolves to the concrete numeric parameters the engine needs
//! - **Preprocessing**: decode, mode-specific dimension bounding, and a
//!   mild contrast/saturation boost ahead of tracing
//! - **Orchestration**: one state machine sequences the full conversion,
//!   discards superseded attempts and normalizes the output so it scales
//!   to its container
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vectorit::{BundledEngineSource, Converter, EngineLoader, ImageAsset, TraceSettings};
//!
//! let loader = Arc::new(EngineLoader::new(vec![Box::new(BundledEngineSource)]));
//! let converter = Converter::new(loader);
//!
//! let bytes = std::fs::read("input.png").unwrap();
//! let asset = ImageAsset::from_bytes(bytes).unwrap();
//! let result = converter.convert(asset, TraceSettings::default()).await.unwrap();
//! std::fs::write("output.svg", &result.markup).unwrap();
//! ```

pub mod convert;
pub mod engine;
pub mod preprocess;
pub mod profile;

// Re-export commonly used items
pub use convert::{
    ConversionResult, ConversionState, ConvertError, Converter, normalize_dimensions,
};
pub use engine::{
    BundledEngineSource, EngineLoader, EngineSource, EngineStatus, EngineUnavailable,
    HttpEngineSource, SourceError, TraceEngine, TraceError, VtracerEngine,
};
pub use preprocess::{ImageAsset, PixelBuffer, PreprocessError};
pub use profile::{ColorCount, DetailLevel, ParameterProfile, TraceSettings};
