//! Image preprocessing ahead of tracing
//!
//! Turns encoded image bytes into a bounded-size RGBA pixel buffer:
//! 1. Intake guard: reject oversized files before any decode work
//! 2. Decode via the `image` crate (PNG, JPEG, WEBP)
//! 3. Bound the pixel dimensions by the mode-specific cap
//! 4. Apply a mild contrast/saturation boost for the smoothing modes

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::profile::DetailLevel;

/// Largest accepted source file, checked before decode.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

/// Working-surface dimension cap for pixel-accurate tracing.
pub const MAX_DIMENSION_EXACT: u32 = 3000;

/// Working-surface dimension cap for the smoothing modes.
pub const MAX_DIMENSION_DEFAULT: u32 = 2500;

/// Channel multiplier for the pre-trace contrast/saturation boost.
const BOOST: f32 = 1.1;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image is {size} bytes, over the 10 MiB intake limit")]
    AssetTooLarge { size: usize },
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Encoded image bytes accepted for conversion.
///
/// Construction enforces the intake size limit; the pixel dimensions are
/// only known once [`ImageAsset::decode`] runs.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Vec<u8>,
}

impl ImageAsset {
    /// Accept encoded bytes, rejecting files over [`MAX_ASSET_BYTES`]
    /// before any decode is attempted.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PreprocessError> {
        if bytes.len() > MAX_ASSET_BYTES {
            return Err(PreprocessError::AssetTooLarge { size: bytes.len() });
        }
        Ok(Self { bytes })
    }

    /// Size of the encoded bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode into a pixel surface, guessing the format from the bytes.
    pub fn decode(&self) -> Result<DynamicImage, PreprocessError> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

/// Raw RGBA pixel surface (row-major) handed to the tracing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Maximum working dimension for a detail level.
///
/// Pixel-accurate tracing is allowed a larger surface because fidelity is
/// its whole purpose; the ceiling still bounds engine cost.
pub fn dimension_cap(detail: DetailLevel) -> u32 {
    match detail {
        DetailLevel::Exact => MAX_DIMENSION_EXACT,
        DetailLevel::Smooth | DetailLevel::Sharp => MAX_DIMENSION_DEFAULT,
    }
}

/// Downscale dimensions so both fit under `cap`, preserving aspect ratio.
///
/// Dimensions already at or under the cap are returned unchanged.
pub fn bounded_dimensions(width: u32, height: u32, cap: u32) -> (u32, u32) {
    if width <= cap && height <= cap {
        return (width, height);
    }
    let ratio = f64::min(cap as f64 / width as f64, cap as f64 / height as f64);
    (
        (width as f64 * ratio).round() as u32,
        (height as f64 * ratio).round() as u32,
    )
}

/// Produce the pixel buffer the tracing engine will consume.
pub fn prepare(asset: &ImageAsset, detail: DetailLevel) -> Result<PixelBuffer, PreprocessError> {
    let img = asset.decode()?;
    let (width, height) = img.dimensions();

    let cap = dimension_cap(detail);
    let (out_width, out_height) = bounded_dimensions(width, height, cap);

    let mut rgba = if (out_width, out_height) == (width, height) {
        img.to_rgba8()
    } else {
        debug!(width, height, out_width, out_height, "downscaling oversized surface");
        image::imageops::resize(&img.to_rgba8(), out_width, out_height, FilterType::Triangle)
    };

    // Exact mode traces raw pixel data; the smoothing modes get a mild
    // boost to improve edge and color separability.
    if matches!(detail, DetailLevel::Smooth | DetailLevel::Sharp) {
        boost_pixels(&mut rgba);
    }

    Ok(PixelBuffer::new(rgba.into_raw(), out_width, out_height))
}

/// Apply the contrast then saturation boost in a single pixel pass.
fn boost_pixels(img: &mut RgbaImage) {
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let r = boost_contrast(r);
        let g = boost_contrast(g);
        let b = boost_contrast(b);

        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let saturate = |v: f32| (luma + (v - luma) * BOOST).clamp(0.0, 255.0);

        *pixel = Rgba([
            saturate(r).round() as u8,
            saturate(g).round() as u8,
            saturate(b).round() as u8,
            a,
        ]);
    }
}

fn boost_contrast(v: u8) -> f32 {
    ((v as f32 - 128.0) * BOOST + 128.0).clamp(0.0, 255.0)
}
