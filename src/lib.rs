use wasm_bindgen::prelude::*;
use image::{self, DynamicImage, GenericImageView, imageops::FilterType};
use js_sys::Array;

pub mod cluster;
pub mod color;
pub mod error;
pub mod export;
pub mod extractor;
pub mod hex;
pub mod histogram;
pub mod seeds;

pub use color::{Lab, WhitePoint};
pub use error::{PaletteError, Result};
pub use export::{Palette, PaletteEntry};
pub use extractor::{DEFAULT_PALETTE_SIZE, ExtractorConfig, PaletteExtractor, Stage};
pub use hex::{component_to_hex, rgb_from_hex, rgb_to_hex};

/// Extract up to `palette_size` representative colors from interleaved RGBA
/// bytes (alpha is ignored).
///
/// Steps performed:
/// 1. Bin every pixel into a 16×16×16 RGB histogram, summing CIELAB values.
/// 2. Greedily pick heavy, mutually distant cells as seeds.
/// 3. Refine the seeds with weighted k-means over the histogram cells.
/// 4. Convert the centroids back to sRGB as `#rrggbb`, in seed order.
pub fn extract_palette(pixels: &[u8], palette_size: usize) -> Result<Vec<String>> {
    PaletteExtractor::default().extract(pixels, palette_size)
}

/// Decode an encoded image (PNG, JPEG, ...) and extract its palette.
///
/// With `downscale`, the image is first resized (nearest-neighbour) so its
/// longest side equals that many pixels, which keeps large photos fast.
pub fn extract_palette_from_image(
    input: &[u8],
    palette_size: usize,
    downscale: Option<u32>,
    config: ExtractorConfig,
) -> Result<Palette> {
    let img = image::load_from_memory(input)?;

    let working_img: DynamicImage = match downscale {
        Some(0) => {
            return Err(PaletteError::InvalidInput("downscale size must be positive".into()));
        }
        Some(scale) => {
            let (orig_w, orig_h) = img.dimensions();
            let max_side = orig_w.max(orig_h) as f32;
            let ratio = scale as f32 / max_side;
            let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
            let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
            DynamicImage::ImageRgba8(image::imageops::resize(&img, w, h, FilterType::Nearest))
        }
        None => img,
    };

    let raw = working_img.to_rgba8().into_raw();
    tracing::debug!(
        width = working_img.width(),
        height = working_img.height(),
        "decoded image"
    );

    PaletteExtractor::new(config)?.extract_with_weights(&raw, palette_size)
}

// ------------------------------------------------------------
// JavaScript bindings
// ------------------------------------------------------------

/// JS numbers arrive as `f64`; anything negative, fractional or beyond
/// `u32` is rejected rather than wrapped.
fn count_from_js(value: Option<f64>, default: usize, name: &str) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) => {
            Ok(v as usize)
        }
        Some(v) => Err(PaletteError::InvalidInput(format!(
            "{name} must be a non-negative integer, got {v}"
        ))),
    }
}

fn to_js_error(e: PaletteError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js_array(hex: Vec<String>) -> Array {
    let out = Array::new();
    for h in hex {
        out.push(&JsValue::from_str(&h));
    }
    out
}

/// Palette of a canvas `ImageData` buffer (`imageData.data`).
///
/// Returns an array of `#rrggbb` strings, at most `paletteSize` (default 5)
/// long.
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette_js(pixels: &[u8], palette_size: Option<f64>) -> std::result::Result<Array, JsValue> {
    let palette_size = count_from_js(palette_size, DEFAULT_PALETTE_SIZE, "paletteSize").map_err(to_js_error)?;
    let hex = extract_palette(pixels, palette_size).map_err(to_js_error)?;
    Ok(to_js_array(hex))
}

/// Palette of an encoded image file, optionally downscaled first.
#[wasm_bindgen(js_name = extractPaletteFromImage)]
pub fn extract_palette_from_image_js(
    input: Vec<u8>,
    palette_size: Option<f64>,
    downscale: Option<f64>,
) -> std::result::Result<Array, JsValue> {
    let palette_size = count_from_js(palette_size, DEFAULT_PALETTE_SIZE, "paletteSize").map_err(to_js_error)?;
    let downscale = downscale
        .map(|d| count_from_js(Some(d), 0, "downscale").map(|d| d as u32))
        .transpose()
        .map_err(to_js_error)?;
    let palette = extract_palette_from_image(&input, palette_size, downscale, ExtractorConfig::default())
        .map_err(to_js_error)?;
    Ok(to_js_array(palette.hex()))
}
