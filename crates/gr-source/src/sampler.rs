use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use gr_core::config::SampleFilter;
use gr_core::error::CoreError;
use gr_core::frame::{FrameBuffer, PixelSamples};
use gr_core::geometry::OutputGeometry;

/// Downsamples a source frame to one RGB triple per output cell.
///
/// Wraps `fast_image_resize`. The resizer and one source scratch buffer are
/// reused across calls; the destination buffer is created per call and
/// dropped once the samples are extracted.
///
/// # Example
/// ```
/// use gr_core::config::SampleFilter;
/// use gr_core::frame::FrameBuffer;
/// use gr_core::geometry::OutputGeometry;
/// use gr_source::sampler::Sampler;
///
/// let mut sampler = Sampler::new(SampleFilter::Box);
/// let src = FrameBuffer::filled(64, 36, (200, 0, 0));
/// let geometry = OutputGeometry::compute((64, 36), 16, 0.5).unwrap();
/// let samples = sampler.sample(&src, geometry).unwrap();
/// assert_eq!(samples.rgb.len(), 16 * 4);
/// ```
pub struct Sampler {
    inner: FirResizer,
    options: ResizeOptions,
    filter: SampleFilter,
    /// Scratch image for source (owned buffer to avoid the mut borrow issue).
    src_buf: Vec<u8>,
}

impl Sampler {
    /// Create a sampler using `filter`.
    #[must_use]
    pub fn new(filter: SampleFilter) -> Self {
        Self {
            inner: FirResizer::new(),
            options: options_for(filter),
            filter,
            src_buf: Vec::new(),
        }
    }

    /// Filter currently in use.
    #[must_use]
    pub fn filter(&self) -> SampleFilter {
        self.filter
    }

    /// Switch the resampling filter.
    pub fn set_filter(&mut self, filter: SampleFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.options = options_for(filter);
        }
    }

    /// Resample `src` onto the `geometry` grid.
    ///
    /// # Errors
    /// Returns [`CoreError::SourceUnavailable`] if the frame is empty or
    /// malformed, or if the resize surface cannot be built.
    pub fn sample(
        &mut self,
        src: &FrameBuffer,
        geometry: OutputGeometry,
    ) -> Result<PixelSamples, CoreError> {
        if src.is_degenerate() {
            return Err(CoreError::unavailable(format!(
                "frame vide ou corrompue ({}×{}, {} octets)",
                src.width,
                src.height,
                src.data.len()
            )));
        }
        if geometry.width == 0 || geometry.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: geometry.width,
                height: geometry.height,
            });
        }

        if src.width == geometry.width && src.height == geometry.height {
            return PixelSamples::from_frame(src, geometry);
        }

        let mut dst = FrameBuffer::new(geometry.width, geometry.height);

        // Copie forcée : l'API fast_image_resize exige &mut sur la source.
        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .map_err(|e| CoreError::unavailable(format!("surface source: {e}")))?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .map_err(|e| CoreError::unavailable(format!("surface cible: {e}")))?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| CoreError::unavailable(format!("resize: {e}")))?;

        PixelSamples::from_frame(&dst, geometry)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(SampleFilter::default())
    }
}

fn options_for(filter: SampleFilter) -> ResizeOptions {
    let alg = match filter {
        SampleFilter::Nearest => ResizeAlg::Nearest,
        SampleFilter::Box => ResizeAlg::Convolution(FilterType::Box),
    };
    ResizeOptions::new().resize_alg(alg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_frame_stays_solid() {
        for filter in [SampleFilter::Nearest, SampleFilter::Box] {
            let mut sampler = Sampler::new(filter);
            let src = FrameBuffer::filled(320, 180, (128, 128, 128));
            let geometry = OutputGeometry::compute((320, 180), 60, 0.5).unwrap();
            let samples = sampler.sample(&src, geometry).unwrap();
            assert_eq!(samples.rgb.len(), geometry.cells());
            for &(r, g, b) in &samples.rgb {
                assert!(r.abs_diff(128) <= 1 && g.abs_diff(128) <= 1 && b.abs_diff(128) <= 1);
            }
        }
    }

    #[test]
    fn nearest_is_exact_on_solid_input() {
        let mut sampler = Sampler::new(SampleFilter::Nearest);
        let src = FrameBuffer::filled(100, 100, (255, 255, 255));
        let geometry = OutputGeometry {
            width: 7,
            height: 3,
        };
        let samples = sampler.sample(&src, geometry).unwrap();
        assert!(samples.rgb.iter().all(|&px| px == (255, 255, 255)));
    }

    #[test]
    fn same_size_is_a_copy() {
        let mut sampler = Sampler::default();
        let mut src = FrameBuffer::new(2, 1);
        src.data.copy_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255]);
        let geometry = OutputGeometry {
            width: 2,
            height: 1,
        };
        let samples = sampler.sample(&src, geometry).unwrap();
        assert_eq!(samples.rgb, vec![(1, 2, 3), (4, 5, 6)]);
    }

    #[test]
    fn upscale_is_supported() {
        let mut sampler = Sampler::new(SampleFilter::Nearest);
        let src = FrameBuffer::filled(4, 4, (0, 0, 0));
        let geometry = OutputGeometry {
            width: 50,
            height: 25,
        };
        assert_eq!(sampler.sample(&src, geometry).unwrap().rgb.len(), 1250);
    }

    #[test]
    fn empty_frame_is_unavailable() {
        let mut sampler = Sampler::default();
        let geometry = OutputGeometry {
            width: 10,
            height: 5,
        };
        let err = sampler.sample(&FrameBuffer::new(0, 0), geometry).unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn filter_can_be_switched() {
        let mut sampler = Sampler::new(SampleFilter::Box);
        sampler.set_filter(SampleFilter::Nearest);
        assert_eq!(sampler.filter(), SampleFilter::Nearest);
    }
}
