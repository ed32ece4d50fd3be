use gr_core::config::LumaWeights;
use gr_core::frame::PixelSamples;

/// Fixed-point scale of the normalised channel weights (per-mille).
const WEIGHT_SCALE: f64 = 1000.0;

/// Maps an RGB triple to an index into an intensity ramp of `levels` glyphs.
///
/// `luminance = (wr·R + wg·G + wb·B) / (wr + wg + wb)` and
/// `index = floor(luminance / 255 × (levels − 1))`.
///
/// Weights are normalised to sum to 1 and then held as per-mille integers, so
/// the whole computation is exact and bounded whatever their magnitude: black
/// is always 0 and white always `levels − 1`.
///
/// # Example
/// ```
/// use gr_ascii::luminance::Quantizer;
/// use gr_core::config::LumaWeights;
/// let q = Quantizer::new(LumaWeights::default(), 10);
/// assert_eq!(q.index(0, 0, 0), 0);
/// assert_eq!(q.index(255, 255, 255), 9);
/// assert_eq!(q.index(128, 128, 128), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantizer {
    wr: u64,
    wg: u64,
    wb: u64,
    /// `255 × (wr + wg + wb)`.
    denom: u64,
    max_index: u64,
}

impl Quantizer {
    /// Build a quantizer for a ramp of `levels` glyphs.
    ///
    /// Invalid weights fall back to [`LumaWeights::default`]; `levels` below 2
    /// is treated as 2.
    #[must_use]
    pub fn new(weights: LumaWeights, levels: usize) -> Self {
        let weights = if weights.is_valid() {
            weights
        } else {
            log::warn!("Poids de luminance invalides {weights:?}, utilisation des défauts.");
            LumaWeights::default()
        };
        let sum = f64::from(weights.r) + f64::from(weights.g) + f64::from(weights.b);
        let wr = to_fixed(weights.r, sum);
        let wg = to_fixed(weights.g, sum);
        let wb = to_fixed(weights.b, sum);
        Self {
            wr,
            wg,
            wb,
            denom: 255 * (wr + wg + wb),
            max_index: levels.max(2) as u64 - 1,
        }
    }

    /// Ramp index for one pixel, in `[0, max_index]`.
    #[inline(always)]
    #[must_use]
    pub fn index(&self, r: u8, g: u8, b: u8) -> usize {
        let weighted = u64::from(r) * self.wr + u64::from(g) * self.wg + u64::from(b) * self.wb;
        let idx = weighted * self.max_index / self.denom;
        idx.min(self.max_index) as usize
    }

    /// Quantize a whole sample buffer, row-major.
    #[must_use]
    pub fn quantize(&self, samples: &PixelSamples) -> Vec<usize> {
        samples
            .rgb
            .iter()
            .map(|&(r, g, b)| self.index(r, g, b))
            .collect()
    }
}

/// `weight / sum` in per-mille. The largest of three weights is at least a
/// third of `sum`, so the three results never all round to zero.
fn to_fixed(weight: f32, sum: f64) -> u64 {
    (f64::from(weight) / sum * WEIGHT_SCALE).round().max(0.0) as u64
}
