//! Exported palettes and their string forms.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::Serialize;

use crate::color::{Lab, WhitePoint, lab_to_rgb, rgb_to_lab};
use crate::error::{PaletteError, Result};
use crate::hex::{rgb_from_hex, srgb_to_hex};

/// Converts final centroids to `#rrggbb` strings, keeping their order.
pub fn export_hex(centroids: &[Lab], white: &WhitePoint) -> Result<Vec<String>> {
    if centroids.is_empty() {
        return Err(PaletteError::SequenceNotReady("no centroids to export"));
    }
    Ok(centroids
        .iter()
        .map(|&lab| srgb_to_hex(lab_to_rgb(lab, white)))
        .collect())
}

/// Ordered colors with the number of pixels each one represents.
///
/// Order is selection order, not sorted by weight or hue. Palettes parsed
/// from strings carry zero weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    colors: Vec<Srgb<u8>>,
    weights: Vec<u64>,
}

/// One color with its weight, as written by the CLI's JSON output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub hex: String,
    pub weight: u64,
    pub coverage: f64,
}

impl Palette {
    pub fn new(colors: Vec<Srgb<u8>>, weights: Vec<u64>) -> Self {
        debug_assert_eq!(colors.len(), weights.len());
        Self { colors, weights }
    }

    pub(crate) fn from_centroids(centroids: &[Lab], weights: &[u64], white: &WhitePoint) -> Self {
        Self {
            colors: centroids.iter().map(|&lab| lab_to_rgb(lab, white)).collect(),
            weights: weights.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.colors
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    /// `#rrggbb` per color.
    pub fn hex(&self) -> Vec<String> {
        self.colors.iter().copied().map(srgb_to_hex).collect()
    }

    /// Share of pixels represented by each color; all zeros when there are
    /// no weights.
    pub fn coverage(&self) -> Vec<f64> {
        let total: u64 = self.weights.iter().sum();
        self.weights
            .iter()
            .map(|&w| if total == 0 { 0.0 } else { w as f64 / total as f64 })
            .collect()
    }

    /// CIELAB form of every color, the representation palette embeddings
    /// are computed from.
    pub fn to_lab(&self, white: &WhitePoint) -> Vec<Lab> {
        self.colors.iter().map(|&c| rgb_to_lab(c, white)).collect()
    }

    /// Dash-joined hex without `#`, e.g. `85837c-d2d1d0-9b7360`.
    pub fn to_palette_string(&self) -> String {
        self.to_string()
    }

    pub fn entries(&self) -> Vec<PaletteEntry> {
        self.hex()
            .into_iter()
            .zip(&self.weights)
            .zip(self.coverage())
            .map(|((hex, &weight), coverage)| PaletteEntry {
                hex,
                weight,
                coverage,
            })
            .collect()
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.colors.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}{:02x}{:02x}", c.red, c.green, c.blue)?;
        }
        Ok(())
    }
}

impl FromStr for Palette {
    type Err = PaletteError;

    /// Parses `8f7358-8e463d-d4d1cc`; `#` prefixes are tolerated.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Palette::default());
        }
        let colors = s.split('-').map(rgb_from_hex).collect::<Result<Vec<_>>>()?;
        let weights = vec![0; colors.len()];
        Ok(Palette { colors, weights })
    }
}
