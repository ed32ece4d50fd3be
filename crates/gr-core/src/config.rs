use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_COMPACT, IntensityRamp};

/// Configuration complète du rendu, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use gr_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.resolution, 150);
/// assert_eq!(config.clamp_resolution(10), 50);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    // === Géométrie ===
    /// Output width in cells.
    pub resolution: u32,
    /// Lower bound for `resolution`.
    pub resolution_min: u32,
    /// Upper bound for `resolution`.
    pub resolution_max: u32,
    /// Glyph cell width / height (0.5 for a 1:2 terminal font).
    pub cell_aspect: f32,
    /// Resampling filter used by the frame sampler.
    pub sample_filter: SampleFilter,

    // === Conversion ===
    /// Charset du plus clair au plus dense.
    pub charset: String,
    /// Perceptual weights for the grayscale reduction.
    pub weights: LumaWeights,

    // === Performance ===
    /// Refresh rate of the render loop while playing.
    pub target_fps: u32,
}

/// Resampling filter for the downscale step.
///
/// # Example
/// ```
/// use gr_core::config::SampleFilter;
/// assert_eq!(SampleFilter::default(), SampleFilter::Box);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SampleFilter {
    /// Point sampling.
    Nearest,
    /// Area average.
    #[default]
    Box,
}

/// Channel weights for `luminance = r·R + g·G + b·B`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LumaWeights {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for LumaWeights {
    fn default() -> Self {
        Self {
            r: 0.21,
            g: 0.72,
            b: 0.07,
        }
    }
}

impl LumaWeights {
    /// `false` for negative, non-finite or all-zero weights.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let all = [self.r, self.g, self.b];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && all.iter().any(|w| *w > 0.0)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: 150,
            resolution_min: 50,
            resolution_max: 300,
            cell_aspect: 0.5,
            sample_filter: SampleFilter::Box,
            charset: CHARSET_COMPACT.to_string(),
            weights: LumaWeights::default(),
            target_fps: 60,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.resolution_min = self.resolution_min.max(1);
        self.resolution_max = self.resolution_max.max(1);
        if self.resolution_min > self.resolution_max {
            std::mem::swap(&mut self.resolution_min, &mut self.resolution_max);
        }
        self.resolution = self.clamp_resolution(self.resolution);
        if !self.cell_aspect.is_finite() {
            self.cell_aspect = 0.5;
        }
        self.cell_aspect = self.cell_aspect.clamp(0.1, 4.0);
        if !self.weights.is_valid() {
            log::warn!(
                "Poids de luminance invalides {:?}, retour aux défauts.",
                self.weights
            );
            self.weights = LumaWeights::default();
        }
        self.target_fps = self.target_fps.clamp(1, 120);
    }

    /// Clamp a requested width into `[resolution_min, resolution_max]`.
    #[must_use]
    pub fn clamp_resolution(&self, requested: u32) -> u32 {
        let lo = self.resolution_min.max(1);
        let hi = self.resolution_max.max(lo);
        requested.clamp(lo, hi)
    }

    /// Build the intensity ramp described by `charset`.
    ///
    /// # Errors
    /// Returns an error if the charset is not a valid ramp.
    pub fn ramp(&self) -> Result<IntensityRamp> {
        IntensityRamp::new(&self.charset).context("charset invalide")
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    resolution: Option<u32>,
    resolution_min: Option<u32>,
    resolution_max: Option<u32>,
    cell_aspect: Option<f32>,
    sample_filter: Option<SampleFilter>,
    charset: Option<String>,
    weights: Option<WeightsSection>,
    target_fps: Option<u32>,
}

#[derive(Deserialize)]
struct WeightsSection {
    r: Option<f32>,
    g: Option<f32>,
    b: Option<f32>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML or the charset is not a valid ramp.
///
/// # Example
/// ```
/// use gr_core::config::parse_config;
/// let config = parse_config("[render]\nresolution = 999\n").unwrap();
/// assert_eq!(config.resolution, 300);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.resolution {
            config.resolution = v;
        }
        if let Some(v) = r.resolution_min {
            config.resolution_min = v;
        }
        if let Some(v) = r.resolution_max {
            config.resolution_max = v;
        }
        if let Some(v) = r.cell_aspect {
            config.cell_aspect = v;
        }
        if let Some(v) = r.sample_filter {
            config.sample_filter = v;
        }
        if let Some(v) = r.charset {
            config.charset = v;
        }
        if let Some(w) = r.weights {
            if let Some(v) = w.r {
                config.weights.r = v;
            }
            if let Some(v) = w.g {
                config.weights.g = v;
            }
            if let Some(v) = w.b {
                config.weights.b = v;
            }
        }
        if let Some(v) = r.target_fps {
            config.target_fps = v;
        }
    }

    config.ramp()?;
    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use gr_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_clamped_to_bounds() {
        let config = RenderConfig::default();
        assert_eq!(config.clamp_resolution(0), 50);
        assert_eq!(config.clamp_resolution(49), 50);
        assert_eq!(config.clamp_resolution(120), 120);
        assert_eq!(config.clamp_resolution(301), 300);
        assert_eq!(config.clamp_resolution(u32::MAX), 300);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = parse_config(
            r#"
            [render]
            charset = " ░▒▓█"
            [render.weights]
            g = 0.7152
            "#,
        )
        .unwrap();
        assert_eq!(config.charset, " ░▒▓█");
        assert_eq!(config.resolution, 150);
        assert!((config.weights.g - 0.7152).abs() < f32::EPSILON);
        assert!((config.weights.r - 0.21).abs() < f32::EPSILON);
        assert_eq!(config.sample_filter, SampleFilter::Box);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            r#"
            [render]
            resolution = 10
            resolution_min = 400
            resolution_max = 80
            target_fps = 0
            sample_filter = "Nearest"
            [render.weights]
            r = -1.0
            "#,
        )
        .unwrap();
        assert_eq!((config.resolution_min, config.resolution_max), (80, 400));
        assert_eq!(config.resolution, 80);
        assert_eq!(config.target_fps, 1);
        assert_eq!(config.weights, LumaWeights::default());
        assert_eq!(config.sample_filter, SampleFilter::Nearest);
    }

    #[test]
    fn invalid_charset_is_an_error() {
        assert!(parse_config("[render]\ncharset = \"#\"\n").is_err());
        assert!(parse_config("[render]\ncharset = \"aba\"\n").is_err());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyphreel.toml");
        std::fs::write(&path, "[render]\nresolution = 200\n").unwrap();
        assert_eq!(load_config(&path).unwrap().resolution, 200);
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn shipped_default_matches_builtin() {
        let shipped = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(shipped, RenderConfig::default());
    }
}
