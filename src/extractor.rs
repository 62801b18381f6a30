//! The four-stage extraction pipeline behind a reusable extractor.

use serde::{Deserialize, Serialize};

use crate::cluster::{self, Clustering, DEFAULT_MAX_ITERATIONS};
use crate::color::{Lab, WhitePoint};
use crate::error::{PaletteError, Result};
use crate::export::{Palette, export_hex};
use crate::histogram::Histogram;
use crate::seeds::{self, DEFAULT_ATTENUATION, Seed};

/// Palette size used when the caller does not ask for one.
pub const DEFAULT_PALETTE_SIZE: usize = 5;

/// Tunable constants of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub white_point: WhitePoint,
    /// Separation constant of the seed repulsion kernel.
    pub attenuation: f64,
    /// Cap on refinement passes.
    pub max_iterations: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            white_point: WhitePoint::D65,
            attenuation: DEFAULT_ATTENUATION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ExtractorConfig {
    pub fn with_white_point(mut self, white_point: WhitePoint) -> Self {
        self.white_point = white_point;
        self
    }

    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Rejects constants the pipeline cannot work with: a non-positive or
    /// non-finite attenuation stops seeding early, and zero iterations skip
    /// refinement entirely.
    pub fn validate(&self) -> Result<()> {
        if !self.attenuation.is_finite() || self.attenuation <= 0.0 {
            return Err(PaletteError::InvalidInput(format!(
                "attenuation must be finite and positive, got {}",
                self.attenuation
            )));
        }
        if self.max_iterations == 0 {
            return Err(PaletteError::InvalidInput("max_iterations must be at least 1".into()));
        }
        let w = &self.white_point;
        if ![w.x, w.y, w.z].iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(PaletteError::InvalidInput(format!("invalid white point {w:?}")));
        }
        Ok(())
    }
}

/// Where the extractor is in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    HistogramBuilt,
    Seeded,
    Converged,
}

/// Runs histogram → seeds → k-means → export, keeping the histogram buffer
/// between calls.
///
/// Every [`extract`](Self::extract) starts by resetting all state, so one
/// instance can serve any number of sequential calls. Stages can also be
/// driven one at a time; calling a stage before its prerequisite fails with
/// [`PaletteError::SequenceNotReady`].
#[derive(Clone, Debug)]
pub struct PaletteExtractor {
    config: ExtractorConfig,
    histogram: Histogram,
    seeds: Vec<Seed>,
    clustering: Option<Clustering>,
    stage: Stage,
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self::with_valid_config(ExtractorConfig::default())
    }
}

impl PaletteExtractor {
    /// Fails with [`PaletteError::InvalidInput`] if `config` does not pass
    /// [`ExtractorConfig::validate`].
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ExtractorConfig) -> Self {
        Self {
            config,
            histogram: Histogram::new(),
            seeds: Vec::new(),
            clustering: None,
            stage: Stage::Uninitialized,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn clustering(&self) -> Option<&Clustering> {
        self.clustering.as_ref()
    }

    /// Stage 1. Discards everything from a previous run.
    pub fn build_histogram(&mut self, pixels: &[u8]) -> Result<()> {
        self.seeds.clear();
        self.clustering = None;
        self.stage = Stage::Uninitialized;

        self.histogram.accumulate(pixels, &self.config.white_point)?;
        self.stage = Stage::HistogramBuilt;
        Ok(())
    }

    /// Stage 2. Returns how many seeds were found, at most `k`.
    pub fn select_seeds(&mut self, k: usize) -> Result<usize> {
        if self.stage == Stage::Uninitialized {
            return Err(PaletteError::SequenceNotReady("histogram has not been built"));
        }
        self.seeds = seeds::select_seeds(&self.histogram, k, self.config.attenuation);
        self.clustering = None;
        self.stage = Stage::Seeded;
        Ok(self.seeds.len())
    }

    /// Stage 3.
    pub fn refine(&mut self) -> Result<&Clustering> {
        if self.stage != Stage::Seeded && self.stage != Stage::Converged {
            return Err(PaletteError::SequenceNotReady("seeds have not been selected"));
        }
        let seeds: Vec<Lab> = self.seeds.iter().map(|s| s.color).collect();
        let clustering = cluster::refine(&self.histogram, &seeds, self.config.max_iterations)?;
        self.stage = Stage::Converged;
        Ok(self.clustering.insert(clustering))
    }

    /// Current centroids: refined ones once stage 3 ran, the raw seeds
    /// before that.
    fn centroids(&self) -> Vec<Lab> {
        match &self.clustering {
            Some(c) => c.centroids.clone(),
            None => self.seeds.iter().map(|s| s.color).collect(),
        }
    }

    /// Stage 4.
    pub fn export(&self) -> Result<Vec<String>> {
        if self.stage != Stage::Seeded && self.stage != Stage::Converged {
            return Err(PaletteError::SequenceNotReady("seeds have not been selected"));
        }
        export_hex(&self.centroids(), &self.config.white_point)
    }

    /// Runs every stage and returns the palette with per-color weights.
    ///
    /// An image with no pixels, or a `palette_size` of 0, yields an empty
    /// palette.
    pub fn extract_with_weights(&mut self, pixels: &[u8], palette_size: usize) -> Result<Palette> {
        self.build_histogram(pixels)?;
        if self.select_seeds(palette_size)? == 0 {
            return Ok(Palette::default());
        }
        let white = self.config.white_point;
        let clustering = self.refine()?;
        Ok(Palette::from_centroids(
            &clustering.centroids,
            &clustering.weights,
            &white,
        ))
    }

    /// Runs every stage and returns `#rrggbb` strings in seed order.
    pub fn extract(&mut self, pixels: &[u8], palette_size: usize) -> Result<Vec<String>> {
        self.build_histogram(pixels)?;
        if self.select_seeds(palette_size)? == 0 {
            return Ok(Vec::new());
        }
        self.refine()?;
        self.export()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RGBY: [u8; 16] = [255, 0, 0, 255, 255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];

    #[test]
    fn test_export_before_seeding_fails() {
        let extractor = PaletteExtractor::default();
        assert!(matches!(extractor.export(), Err(PaletteError::SequenceNotReady(_))));

        let mut extractor = PaletteExtractor::default();
        extractor.build_histogram(&RGBY).unwrap();
        assert!(matches!(extractor.export(), Err(PaletteError::SequenceNotReady(_))));
        assert!(matches!(extractor.refine(), Err(PaletteError::SequenceNotReady(_))));
    }

    #[test]
    fn test_seeding_before_histogram_fails() {
        let mut extractor = PaletteExtractor::default();
        assert!(matches!(
            extractor.select_seeds(3),
            Err(PaletteError::SequenceNotReady(_))
        ));
    }

    #[test]
    fn test_stages_in_order() {
        let mut extractor = PaletteExtractor::default();
        assert_eq!(extractor.stage(), Stage::Uninitialized);
        extractor.build_histogram(&RGBY).unwrap();
        assert_eq!(extractor.stage(), Stage::HistogramBuilt);
        assert_eq!(extractor.select_seeds(3).unwrap(), 3);
        assert_eq!(extractor.stage(), Stage::Seeded);
        // Unrefined seeds can already be exported.
        assert_eq!(extractor.export().unwrap().len(), 3);
        let clustering = extractor.refine().unwrap();
        assert!(clustering.converged);
        assert_eq!(clustering.weights, vec![2, 1, 1]);
        assert_eq!(extractor.stage(), Stage::Converged);
    }

    #[test]
    fn test_failed_call_resets_state() {
        let mut extractor = PaletteExtractor::default();
        extractor.extract(&RGBY, 3).unwrap();
        assert!(extractor.extract(&[1, 2, 3], 3).is_err());
        assert_eq!(extractor.stage(), Stage::Uninitialized);
        assert!(extractor.export().is_err());
    }

    #[test]
    fn test_reuse_gives_same_result() {
        let mut extractor = PaletteExtractor::default();
        let first = extractor.extract(&RGBY, 3).unwrap();
        extractor.extract(&[9, 9, 9, 255], 3).unwrap();
        assert_eq!(extractor.extract(&RGBY, 3).unwrap(), first);
    }

    #[test]
    fn test_weights_follow_seed_order() {
        let mut extractor = PaletteExtractor::default();
        let palette = extractor.extract_with_weights(&RGBY, 3).unwrap();
        assert_eq!(palette.hex()[0], "#ff0000");
        assert_eq!(palette.weights(), &[2, 1, 1]);
    }

    #[test]
    fn test_config_builders() {
        let config = ExtractorConfig::default()
            .with_attenuation(900.0)
            .with_max_iterations(4);
        assert_eq!(config.attenuation, 900.0);
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.white_point, WhitePoint::D65);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ExtractorConfig = serde_json::from_str(r#"{"attenuation": 900.0}"#).unwrap();
        assert_eq!(config.attenuation, 900.0);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.white_point, WhitePoint::D65);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(PaletteExtractor::new(ExtractorConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_attenuation() {
        for bad in [-100.0, 0.0, f64::NAN, f64::INFINITY] {
            let config = ExtractorConfig::default().with_attenuation(bad);
            assert!(matches!(
                PaletteExtractor::new(config),
                Err(PaletteError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = ExtractorConfig::default().with_max_iterations(0);
        assert!(matches!(config.validate(), Err(PaletteError::InvalidInput(_))));
        assert!(PaletteExtractor::new(config).is_err());
    }

    #[test]
    fn test_rejects_bad_white_point() {
        let white = WhitePoint { x: 95.047, y: 0.0, z: 108.883 };
        let config = ExtractorConfig::default().with_white_point(white);
        assert!(PaletteExtractor::new(config).is_err());
    }

    #[test]
    fn test_rejects_invalid_json_config() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{"attenuation": -100.0, "max_iterations": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_one_seed_per_distinct_cell() {
        let pixels = [
            255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255,
        ];
        let mut extractor = PaletteExtractor::new(ExtractorConfig::default().with_attenuation(900.0)).unwrap();
        let palette = extractor.extract_with_weights(&pixels, 4).unwrap();
        assert_eq!(palette.len(), 4);
        assert_eq!(palette.weights(), &[1, 1, 1, 1]);
    }
}
