use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Plafond de lignes : une source très haute et étroite ne peut pas
/// demander une grille de plusieurs milliards de cellules.
pub const MAX_ROWS: u32 = 1024;

/// Grid size in cells for the current resolution and source aspect ratio.
///
/// # Example
/// ```
/// use gr_core::geometry::OutputGeometry;
/// let g = OutputGeometry::compute((1920, 1080), 150, 0.5).unwrap();
/// assert_eq!((g.width, g.height), (150, 42));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGeometry {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl OutputGeometry {
    /// `height = floor(src_h / src_w × width × cell_aspect)`, clamped into
    /// `1..=MAX_ROWS`.
    ///
    /// `cell_aspect` compensates for glyph cells being taller than wide
    /// (0.5 for a 1:2 terminal font).
    ///
    /// # Errors
    /// Returns [`CoreError::SourceUnavailable`] when the source has zero area
    /// (metadata not loaded yet), and [`CoreError::InvalidDimensions`] for a
    /// zero `width`.
    pub fn compute(native: (u32, u32), width: u32, cell_aspect: f32) -> Result<Self, CoreError> {
        let (src_w, src_h) = native;
        if src_w == 0 || src_h == 0 {
            return Err(CoreError::unavailable(format!(
                "dimensions natives {src_w}×{src_h}"
            )));
        }
        if width == 0 {
            return Err(CoreError::InvalidDimensions { width, height: 0 });
        }
        let aspect = f64::from(src_h) / f64::from(src_w);
        let rows = (aspect * f64::from(width) * f64::from(cell_aspect)).floor();
        let height = if rows.is_finite() && rows >= 1.0 {
            rows.min(f64::from(MAX_ROWS)) as u32
        } else {
            1
        };
        Ok(Self { width, height })
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for OutputGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hd_at_150_columns() {
        let g = OutputGeometry::compute((1920, 1080), 150, 0.5).unwrap();
        assert_eq!(g.height, 42);
        assert_eq!(g.cells(), 150 * 42);
    }

    #[test]
    fn portrait_source_is_taller() {
        let g = OutputGeometry::compute((1080, 1920), 100, 0.5).unwrap();
        assert_eq!(g.height, 88);
    }

    #[test]
    fn very_wide_source_keeps_one_row() {
        let g = OutputGeometry::compute((10_000, 10), 50, 0.5).unwrap();
        assert_eq!(g.height, 1);
    }

    #[test]
    fn very_tall_source_is_capped() {
        let g = OutputGeometry::compute((1, 100_000), 300, 0.5).unwrap();
        assert_eq!((g.width, g.height), (300, MAX_ROWS));
        assert_eq!(g.cells(), 300 * 1024);

        let g = OutputGeometry::compute((1, u32::MAX), 300, 2.0).unwrap();
        assert_eq!(g.height, MAX_ROWS);
    }

    #[test]
    fn zero_area_source_is_unavailable() {
        let err = OutputGeometry::compute((0, 1080), 150, 0.5).unwrap_err();
        assert!(err.is_source_unavailable());
        let err = OutputGeometry::compute((1920, 0), 150, 0.5).unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            OutputGeometry::compute((1920, 1080), 0, 0.5),
            Err(CoreError::InvalidDimensions { .. })
        ));
    }
}
