use crate::error::CoreError;
use crate::geometry::OutputGeometry;

/// Decoded source frame.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use gr_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir (alpha 0) aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Crée un buffer rempli d'une couleur opaque.
    ///
    /// # Example
    /// ```
    /// use gr_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(4, 2, (128, 128, 128));
    /// assert_eq!(&fb.data[28..32], &[128, 128, 128, 255]);
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data` is not exactly
    /// `width × height × 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// `true` if the buffer covers no pixels or its byte length disagrees with its size.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() != self.width as usize * self.height as usize * 4
    }
}

/// One RGB triple per output cell, row-major.
///
/// Lives for a single conversion cycle.
#[derive(Clone, Debug)]
pub struct PixelSamples {
    /// Geometry the samples were taken at.
    pub geometry: OutputGeometry,
    /// `geometry.cells()` triples.
    pub rgb: Vec<(u8, u8, u8)>,
}

impl PixelSamples {
    /// Extract RGB triples from a frame already resized to `geometry`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the frame size does not match.
    pub fn from_frame(frame: &FrameBuffer, geometry: OutputGeometry) -> Result<Self, CoreError> {
        if frame.width != geometry.width
            || frame.height != geometry.height
            || frame.is_degenerate()
        {
            return Err(CoreError::InvalidDimensions {
                width: frame.width,
                height: frame.height,
            });
        }
        let rgb = frame
            .data
            .chunks_exact(4)
            .map(|px| (px[0], px[1], px[2]))
            .collect();
        Ok(Self { geometry, rgb })
    }
}

/// Fully assembled character grid for one frame.
///
/// `height` rows of `width` glyphs, each row terminated by `'\n'`.
///
/// # Example
/// ```
/// use gr_core::frame::FrameText;
/// use gr_core::geometry::OutputGeometry;
/// let geometry = OutputGeometry { width: 2, height: 2 };
/// let text = FrameText::assembled("ab\ncd\n".to_string(), geometry);
/// assert_eq!(text.rows().collect::<Vec<_>>(), ["ab", "cd"]);
/// assert_eq!((text.width(), text.height()), (2, 2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameText {
    text: String,
    width: u32,
    height: u32,
}

impl FrameText {
    /// Wrap text assembled for `geometry`.
    ///
    /// The grid assembler guarantees the shape: `geometry.height` rows of
    /// `geometry.width` glyphs, each ending with `'\n'`.
    #[must_use]
    pub fn assembled(text: String, geometry: OutputGeometry) -> Self {
        Self {
            text,
            width: geometry.width,
            height: geometry.height,
        }
    }

    /// Whole block, rows newline-terminated.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Glyphs per row.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rows without their terminators.
    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

impl std::fmt::Display for FrameText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
