use gr_core::charset::IntensityRamp;
use gr_core::frame::FrameText;
use gr_core::geometry::OutputGeometry;

/// Arrange row-major ramp indices into frame text.
///
/// Each of the `geometry.height` rows holds `geometry.width` glyphs and ends
/// with `'\n'`. Indices past the end of the ramp map to its last glyph;
/// missing trailing indices map to the first.
///
/// # Example
/// ```
/// use gr_ascii::grid::assemble;
/// use gr_core::charset::IntensityRamp;
/// use gr_core::geometry::OutputGeometry;
///
/// let ramp = IntensityRamp::new(" .:#@").unwrap();
/// let geometry = OutputGeometry { width: 2, height: 2 };
/// let text = assemble(&[0, 4, 2, 3], geometry, &ramp);
/// assert_eq!(text.as_str(), " @\n:#\n");
/// ```
#[must_use]
pub fn assemble(indices: &[usize], geometry: OutputGeometry, ramp: &IntensityRamp) -> FrameText {
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    debug_assert_eq!(indices.len(), geometry.cells(), "indices/geometry mismatch");

    // Glyphes jusqu'à 3 octets (blocs Unicode) + terminateurs.
    let mut text = String::with_capacity(geometry.cells() * 3 + height);
    for row in 0..height {
        for col in 0..width {
            let idx = indices.get(row * width + col).copied().unwrap_or(0);
            text.push(ramp.glyph(idx));
        }
        text.push('\n');
    }
    FrameText::assembled(text, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> IntensityRamp {
        IntensityRamp::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ").unwrap()
    }

    #[test]
    fn three_by_two_grid() {
        let ramp = alphabet();
        let n = ramp.len();
        assert_eq!(n, 26);
        let geometry = OutputGeometry {
            width: 3,
            height: 2,
        };
        let text = assemble(&[0, n - 1, 2, 1, 0, n - 1], geometry, &ramp);

        let rows: Vec<&str> = text.rows().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.chars().count() == 3));
        assert_eq!(rows[0], "AZC");
        assert_eq!(rows[1], "BAZ");
        assert_eq!(text.as_str(), "AZC\nBAZ\n");
        assert_eq!((text.width(), text.height()), (3, 2));
    }

    #[test]
    fn out_of_range_index_uses_densest_glyph() {
        let ramp = IntensityRamp::new(" #").unwrap();
        let geometry = OutputGeometry {
            width: 2,
            height: 1,
        };
        assert_eq!(assemble(&[0, 99], geometry, &ramp).as_str(), " #\n");
    }

    #[test]
    fn multibyte_glyphs_keep_column_count() {
        let ramp = IntensityRamp::new(" ░▒▓█").unwrap();
        let geometry = OutputGeometry {
            width: 5,
            height: 3,
        };
        let indices: Vec<usize> = (0..15).map(|i| i % 5).collect();
        let text = assemble(&indices, geometry, &ramp);
        assert_eq!(text.height(), 3);
        for row in text.rows() {
            assert_eq!(row, " ░▒▓█");
        }
    }
}
