use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gr_core::frame::FrameBuffer;
use gr_core::traits::{MediaSource, Source};

/// Source d'image statique. Retourne toujours la même frame.
///
/// Transport controls are accepted and ignored; a still never ends.
///
/// # Example
/// ```
/// use gr_core::frame::FrameBuffer;
/// use gr_core::traits::Source;
/// use gr_source::image::ImageSource;
///
/// let mut source = ImageSource::from_frame(FrameBuffer::filled(8, 8, (0, 0, 0)));
/// assert_eq!(source.native_size(), (8, 8));
/// assert!(source.current_frame().is_some());
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self::from_frame(load_image(path)?))
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl Source for ImageSource {
    fn current_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }
}

impl MediaSource for ImageSource {
    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn seek(&mut self, _pos_secs: f64) {}

    fn position(&self) -> f64 {
        0.0
    }

    fn take_ended(&mut self) -> bool {
        false
    }
}

/// Decode an image file into an RGBA frame.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::info!("Image chargée : {width}x{height} — {}", path.display());
    Ok(FrameBuffer::from_rgba(width, height, rgba.into_raw())?)
}
