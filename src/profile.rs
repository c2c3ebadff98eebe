//! Tracing parameter profiles
//!
//! Maps the user-facing detail level and color choice onto the concrete
//! numeric parameter set consumed by the tracing engine. The mapping is a
//! pure function: the same `(DetailLevel, ColorCount)` pair always resolves
//! to the same profile, and the profile is recomputed for every conversion
//! rather than cached anywhere.

use serde::{Deserialize, Serialize};

/// Color sampling strategy passed to the engine (deterministic sampling).
pub const COLOR_SAMPLING: u32 = 2;

/// Number of color quantization refinement cycles.
pub const COLOR_QUANT_CYCLES: u32 = 3;

/// Palette sizes the engine accepts.
pub const COLOR_CHOICES: [u32; 6] = [2, 4, 16, 32, 64, 128];

/// Named tracing regime selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Logo/icon mode: aggressive smoothing, continuous curves.
    #[default]
    Smooth,
    /// Photo mode: finer segmentation, no blur.
    Sharp,
    /// Pixel-accurate mode: near-lossless geometry, maximal cost.
    Exact,
}

/// Validated number of quantization buckets, one of [`COLOR_CHOICES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ColorCount(u32);

impl ColorCount {
    /// Accepts only the supported palette sizes.
    pub fn new(colors: u32) -> Option<Self> {
        COLOR_CHOICES.contains(&colors).then_some(Self(colors))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ColorCount {
    fn default() -> Self {
        Self(16)
    }
}

impl TryFrom<u32> for ColorCount {
    type Error = String;

    fn try_from(colors: u32) -> Result<Self, Self::Error> {
        Self::new(colors).ok_or_else(|| format!("unsupported color count: {colors}"))
    }
}

impl From<ColorCount> for u32 {
    fn from(colors: ColorCount) -> u32 {
        colors.0
    }
}

/// User-selected conversion settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSettings {
    pub detail: DetailLevel,
    pub colors: ColorCount,
}

/// Concrete numeric input to the tracing engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterProfile {
    /// Straight-line error threshold.
    pub line_threshold: f64,
    /// Curve fitting error threshold.
    pub curve_threshold: f64,
    /// Paths shorter than this many points are dropped.
    pub path_omit_threshold: u32,
    /// Pre-trace selective blur radius, in pixels.
    pub blur_radius: u32,
    /// Maximum channel delta the blur is allowed to smear.
    pub blur_delta: u32,
    /// Number of quantization buckets.
    pub color_count: u32,
    pub color_sampling: u32,
    pub color_quant_cycles: u32,
}

impl ParameterProfile {
    /// Resolve a detail level and color choice into engine parameters.
    ///
    /// Total over both enumerations; there is no failure path.
    pub fn resolve(detail: DetailLevel, colors: ColorCount) -> Self {
        let (line_threshold, curve_threshold, path_omit_threshold, blur_radius, blur_delta) =
            match detail {
                DetailLevel::Smooth => (1.0, 1.0, 4, 2, 15),
                DetailLevel::Sharp => (0.5, 0.5, 2, 0, 0),
                DetailLevel::Exact => (0.01, 0.01, 1, 0, 0),
            };

        Self {
            line_threshold,
            curve_threshold,
            path_omit_threshold,
            blur_radius,
            blur_delta,
            color_count: colors.get(),
            color_sampling: COLOR_SAMPLING,
            color_quant_cycles: COLOR_QUANT_CYCLES,
        }
    }
}
