//! Bundled vtracer-backed engine
//!
//! A compiled-in tracing engine so the pipeline works without any network
//! delivery (the CLI's only source, and a last-resort fallback for hosts
//! that list it after their remote mirrors).

use std::sync::Arc;

use async_trait::async_trait;
use vtracer::{ColorImage, Config, convert};

use super::{EngineSource, SourceError, TraceEngine, TraceError};
use crate::preprocess::PixelBuffer;
use crate::profile::ParameterProfile;

/// Tracing engine backed by the vtracer library.
pub struct VtracerEngine;

impl TraceEngine for VtracerEngine {
    fn trace(&self, buffer: &PixelBuffer, profile: &ParameterProfile) -> Result<String, TraceError> {
        let image = ColorImage {
            pixels: buffer.pixels().to_vec(),
            width: buffer.width() as usize,
            height: buffer.height() as usize,
        };

        // vtracer exposes a narrower knob set than a hosted engine; map
        // the nearest equivalents and leave the rest at their defaults.
        let config = Config {
            filter_speckle: profile.path_omit_threshold as usize,
            color_precision: color_bits(profile.color_count),
            corner_threshold: (profile.curve_threshold * 60.0).round() as i32,
            path_precision: Some(3),
            ..Default::default()
        };

        let svg = convert(image, config)
            .map_err(|e| TraceError::new(format!("vtracer conversion failed: {e}")))?;
        Ok(svg.to_string())
    }
}

/// Quantization bit depth for a requested palette size (2..=128 colors).
fn color_bits(colors: u32) -> i32 {
    (32 - colors.clamp(2, 128).leading_zeros() - 1) as i32
}

/// Always-available local delivery source yielding the bundled engine.
pub struct BundledEngineSource;

#[async_trait]
impl EngineSource for BundledEngineSource {
    fn name(&self) -> &str {
        "bundled"
    }

    async fn acquire(&self) -> Result<Arc<dyn TraceEngine>, SourceError> {
        Ok(Arc::new(VtracerEngine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ColorCount, DetailLevel};

    #[test]
    fn test_color_bits() {
        assert_eq!(color_bits(2), 1);
        assert_eq!(color_bits(4), 2);
        assert_eq!(color_bits(16), 4);
        assert_eq!(color_bits(128), 7);
    }

    #[test]
    fn test_traces_small_buffer() {
        // 4x4 surface, top half red, bottom half white
        let mut pixels = Vec::with_capacity(4 * 4 * 4);
        for y in 0..4 {
            for _x in 0..4 {
                if y < 2 {
                    pixels.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    pixels.extend_from_slice(&[255, 255, 255, 255]);
                }
            }
        }
        let buffer = PixelBuffer::new(pixels, 4, 4);
        let profile =
            ParameterProfile::resolve(DetailLevel::Smooth, ColorCount::new(4).unwrap());

        let markup = VtracerEngine.trace(&buffer, &profile).unwrap();
        assert!(markup.contains("svg"));
    }
}
