use crate::error::CoreError;

/// 10 caractères — compact, bon contraste. Rampe par défaut.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 69 caractères — Paul Bourke, du plus clair au plus dense.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode — pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Minimal — haut contraste.
pub const CHARSET_MINIMAL: &str = " .:░▒▓█";

/// Built-in presets, in the order the UI cycles through them.
pub const PRESETS: [&str; 4] = [
    CHARSET_COMPACT,
    CHARSET_STANDARD,
    CHARSET_BLOCKS,
    CHARSET_MINIMAL,
];

/// Ordered glyph sequence, index 0 = lowest visual weight.
///
/// Immutable once built. Always holds at least two distinct glyphs.
///
/// # Example
/// ```
/// use gr_core::charset::IntensityRamp;
/// let ramp = IntensityRamp::new(" .:#@").unwrap();
/// assert_eq!(ramp.len(), 5);
/// assert_eq!(ramp.glyph(0), ' ');
/// assert_eq!(ramp.glyph(4), '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntensityRamp {
    glyphs: Vec<char>,
}

impl IntensityRamp {
    /// Build a ramp from a charset ordered lightest→densest.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRamp`] if the charset has fewer than 2
    /// glyphs or repeats one.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = charset.chars().collect();
        if glyphs.len() < 2 {
            return Err(CoreError::InvalidRamp {
                reason: format!("{} glyphe(s), minimum 2", glyphs.len()),
            });
        }
        for (i, ch) in glyphs.iter().enumerate() {
            if glyphs[..i].contains(ch) {
                return Err(CoreError::InvalidRamp {
                    reason: format!("glyphe dupliqué {ch:?}"),
                });
            }
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs (N).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Highest valid index (N − 1).
    #[inline]
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.glyphs.len() - 1
    }

    /// Glyph at `index`, clamped to the last glyph.
    ///
    /// # Example
    /// ```
    /// use gr_core::charset::IntensityRamp;
    /// let ramp = IntensityRamp::new("ab").unwrap();
    /// assert_eq!(ramp.glyph(7), 'b');
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index.min(self.max_index())]
    }
}

impl Default for IntensityRamp {
    fn default() -> Self {
        Self {
            glyphs: CHARSET_COMPACT.chars().collect(),
        }
    }
}

impl std::fmt::Display for IntensityRamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in &self.glyphs {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}
