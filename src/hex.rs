//! Hex encoding and parsing of sRGB colors.

use palette::Srgb;

use crate::error::{PaletteError, Result};

/// Encodes one channel as two lowercase hex digits.
///
/// The component is taken as `f64` so that callers holding unvalidated
/// numbers (JS values, parsed config) get a proper error instead of a silent
/// truncation.
pub fn component_to_hex(component: f64) -> Result<String> {
    if component.fract() != 0.0 || !(0.0..=255.0).contains(&component) {
        return Err(PaletteError::InvalidColorComponent(component));
    }
    Ok(format!("{:02x}", component as u8))
}

/// `#rrggbb` for three unvalidated components.
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> Result<String> {
    Ok(format!(
        "#{}{}{}",
        component_to_hex(r)?,
        component_to_hex(g)?,
        component_to_hex(b)?
    ))
}

/// `#rrggbb` for a color already known to be in range.
pub fn srgb_to_hex(c: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

/// Parses `rrggbb` or `#rrggbb`, either case.
pub fn rgb_from_hex(s: &str) -> Result<Srgb<u8>> {
    let hex = s.trim().trim_start_matches('#');
    // from_str_radix alone would accept a leading '+'.
    if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(PaletteError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| PaletteError::InvalidHex(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
