use std::collections::HashSet;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use image_to_palette_wasm::histogram::cell_index;
use image_to_palette_wasm::{
    ExtractorConfig, PaletteError, PaletteExtractor, extract_palette, extract_palette_from_image,
    rgb_from_hex, rgb_to_hex,
};

fn channel_diff(a: &str, b: &str) -> u8 {
    let a = rgb_from_hex(a).unwrap();
    let b = rgb_from_hex(b).unwrap();
    [
        a.red.abs_diff(b.red),
        a.green.abs_diff(b.green),
        a.blue.abs_diff(b.blue),
    ]
    .into_iter()
    .max()
    .unwrap()
}

/// A deterministic "photo": smooth gradients plus a few flat patches.
fn synthetic_image(w: u32, h: u32) -> Vec<u8> {
    let mut raw = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let px = if x < w / 4 && y < h / 4 {
                [20, 40, 160]
            } else if x > 3 * w / 4 {
                [230, 200, 40]
            } else {
                [(x * 255 / w) as u8, (y * 255 / h) as u8, ((x + y) % 256) as u8]
            };
            raw.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
    }
    raw
}

#[test]
fn test_primary_colors() {
    let pixels = [255, 0, 0, 255, 255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
    let palette = extract_palette(&pixels, 3).unwrap();

    assert_eq!(palette.len(), 3);
    let unique: HashSet<&String> = palette.iter().collect();
    assert_eq!(unique.len(), 3);
    for expected in ["#ff0000", "#00ff00", "#0000ff"] {
        assert!(
            palette.iter().any(|c| channel_diff(c, expected) <= 2),
            "{expected} missing from {palette:?}"
        );
    }
    // Dominant color first.
    assert_eq!(palette[0], "#ff0000");
}

#[test]
fn test_uniform_image_yields_one_color() {
    for rgb in [[143u8, 115u8, 88u8], [0, 0, 0], [255, 255, 255], [3, 250, 77]] {
        let pixels: Vec<u8> = (0..64).flat_map(|_| [rgb[0], rgb[1], rgb[2], 255]).collect();
        let palette = extract_palette(&pixels, 5).unwrap();
        let expected = rgb_to_hex(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64).unwrap();
        assert_eq!(palette, vec![expected]);
    }
}

#[test]
fn test_zero_palette_size_is_empty() {
    let pixels = [10, 20, 30, 255];
    assert!(extract_palette(&pixels, 0).unwrap().is_empty());
    assert!(extract_palette(&[], 5).unwrap().is_empty());
}

#[test]
fn test_rejects_truncated_buffer() {
    let err = extract_palette(&[1, 2, 3, 4, 5], 5).unwrap_err();
    assert!(matches!(err, PaletteError::InvalidInput(_)));
}

#[test]
fn test_alpha_is_ignored() {
    let opaque = [200, 10, 10, 255, 10, 10, 200, 255];
    let clear = [200, 10, 10, 0, 10, 10, 200, 7];
    assert_eq!(extract_palette(&opaque, 2).unwrap(), extract_palette(&clear, 2).unwrap());
}

#[test]
fn test_palette_size_bounds() {
    let pixels = synthetic_image(48, 32);
    let distinct: HashSet<usize> = pixels
        .chunks_exact(4)
        .map(|p| cell_index(p[0], p[1], p[2]))
        .collect();

    for k in [1, 2, 5, 8, 16] {
        let palette = extract_palette(&pixels, k).unwrap();
        assert!(palette.len() <= k);
        assert!(palette.len() >= k.min(distinct.len()));
    }

    // Fewer cells than requested.
    let two = [0, 0, 0, 255, 255, 255, 255, 255];
    assert_eq!(extract_palette(&two, 5).unwrap().len(), 2);
}

#[test]
fn test_extraction_is_deterministic() {
    let pixels = synthetic_image(40, 40);
    assert_eq!(extract_palette(&pixels, 5).unwrap(), extract_palette(&pixels, 5).unwrap());
}

#[test]
fn test_weights_cover_every_pixel() {
    let pixels = synthetic_image(30, 20);
    let palette = PaletteExtractor::default().extract_with_weights(&pixels, 5).unwrap();
    assert_eq!(palette.weights().iter().sum::<u64>(), 600);
    let coverage: f64 = palette.coverage().iter().sum();
    assert!((coverage - 1.0).abs() < 1e-9);
    assert_eq!(palette.entries().len(), palette.len());
}

#[test]
fn test_converged_clustering_is_stable() {
    let pixels = synthetic_image(64, 48);
    let mut extractor = PaletteExtractor::default();
    extractor.extract(&pixels, 6).unwrap();

    let clustering = extractor.clustering().unwrap();
    assert!(clustering.converged);
    let again = image_to_palette_wasm::cluster::assign(extractor.histogram(), &clustering.centroids);
    assert_eq!(again, clustering.assignments);
}

#[test]
fn test_decodes_png() {
    let w = 32;
    let h = 16;
    let img = RgbaImage::from_raw(w, h, synthetic_image(w, h)).unwrap();
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let decoded = extract_palette_from_image(&png, 5, None, ExtractorConfig::default()).unwrap();
    assert_eq!(decoded.hex(), extract_palette(img.as_raw(), 5).unwrap());

    let small = extract_palette_from_image(&png, 5, Some(8), ExtractorConfig::default()).unwrap();
    assert!(!small.is_empty());
    assert_eq!(small.weights().iter().sum::<u64>(), 8 * 4);
}

#[test]
fn test_rejects_garbage_image() {
    let err = extract_palette_from_image(b"not an image", 5, None, ExtractorConfig::default())
        .unwrap_err();
    assert!(matches!(err, PaletteError::Image(_)));
}

#[test]
fn test_palette_string_format() {
    let pixels = [255, 0, 0, 255, 0, 0, 255, 255];
    let palette = PaletteExtractor::default().extract_with_weights(&pixels, 2).unwrap();
    assert_eq!(palette.to_palette_string(), "0000ff-ff0000");
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ExtractorConfig::default().with_attenuation(-100.0);
    let pixels = [255, 0, 0, 255];
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_raw(1, 1, pixels.to_vec()).unwrap())
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let err = extract_palette_from_image(&png, 5, None, config).unwrap_err();
    assert!(matches!(err, PaletteError::InvalidInput(_)));
}
