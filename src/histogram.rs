//! Quantized color histogram.
//!
//! Each pixel lands in one of 16×16×16 cells by dropping the low four bits of
//! every channel. A cell keeps the sum of the CIELAB values of its pixels and
//! how many pixels it has seen, so its average color can be recomputed at any
//! time as `sum / count`.

use palette::Srgb;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::color::{Lab, WhitePoint, rgb_to_lab};
use crate::error::{PaletteError, Result};

/// Low bits discarded from each channel.
pub const QUANTIZE_SHIFT: u32 = 4;
pub const BINS_PER_CHANNEL: usize = 256 >> QUANTIZE_SHIFT;
pub const HISTOGRAM_SIZE: usize = BINS_PER_CHANNEL * BINS_PER_CHANNEL * BINS_PER_CHANNEL;

#[cfg(feature = "parallel")]
const PARALLEL_CHUNK_PIXELS: usize = 16 * 1024;

/// Histogram index of a color.
#[inline]
pub fn cell_index(r: u8, g: u8, b: u8) -> usize {
    let r = (r >> QUANTIZE_SHIFT) as usize;
    let g = (g >> QUANTIZE_SHIFT) as usize;
    let b = (b >> QUANTIZE_SHIFT) as usize;
    (r * BINS_PER_CHANNEL + g) * BINS_PER_CHANNEL + b
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    pub sum: Lab,
    pub count: u64,
}

impl Cell {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Average CIELAB color, `None` for a cell no pixel fell into.
    #[inline]
    pub fn average(&self) -> Option<Lab> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum * (1.0 / self.count as f64))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    cells: Vec<Cell>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::default(); HISTOGRAM_SIZE],
        }
    }

    /// Builds a fresh histogram from interleaved RGBA bytes.
    pub fn from_pixels(pixels: &[u8], white: &WhitePoint) -> Result<Self> {
        let mut histogram = Self::new();
        histogram.accumulate(pixels, white)?;
        Ok(histogram)
    }

    /// Resets every cell and bins `pixels` (RGBA, alpha ignored) into them.
    pub fn accumulate(&mut self, pixels: &[u8], white: &WhitePoint) -> Result<()> {
        if pixels.len() % 4 != 0 {
            return Err(PaletteError::InvalidInput(format!(
                "pixel buffer length {} is not a multiple of 4",
                pixels.len()
            )));
        }

        self.clear();
        self.fill(pixels, white);

        tracing::debug!(
            pixels = pixels.len() / 4,
            non_empty = self.non_empty_count(),
            "histogram built"
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    #[cfg(not(feature = "parallel"))]
    fn fill(&mut self, pixels: &[u8], white: &WhitePoint) {
        self.add_pixels(pixels, white);
    }

    // Cell sums are commutative, so chunks can be binned independently and
    // merged afterwards.
    #[cfg(feature = "parallel")]
    fn fill(&mut self, pixels: &[u8], white: &WhitePoint) {
        let merged = pixels
            .par_chunks(PARALLEL_CHUNK_PIXELS * 4)
            .fold(Histogram::new, |mut h, chunk| {
                h.add_pixels(chunk, white);
                h
            })
            .reduce(Histogram::new, |mut a, b| {
                a.merge(&b);
                a
            });
        self.cells.copy_from_slice(&merged.cells);
    }

    fn add_pixels(&mut self, pixels: &[u8], white: &WhitePoint) {
        for px in pixels.chunks_exact(4) {
            let lab = rgb_to_lab(Srgb::new(px[0], px[1], px[2]), white);
            let cell = &mut self.cells[cell_index(px[0], px[1], px[2])];
            cell.sum += lab;
            cell.count += 1;
        }
    }

    /// Adds another histogram's sums and counts cell by cell.
    pub fn merge(&mut self, other: &Histogram) {
        for (a, b) in self.cells.iter_mut().zip(&other.cells) {
            a.sum += b.sum;
            a.count += b.count;
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn non_empty_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn total_pixels(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Pixel counts as an owned weight buffer, one entry per cell.
    pub fn weights(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.count as f64).collect()
    }
}
