use anyhow::Result;
use gr_ascii::grid::assemble;
use gr_ascii::luminance::Quantizer;
use gr_core::charset::IntensityRamp;
use gr_core::config::{LumaWeights, RenderConfig, SampleFilter};
use gr_core::error::CoreError;
use gr_core::frame::{FrameBuffer, FrameText};
use gr_core::geometry::OutputGeometry;
use gr_core::traits::Source;
use gr_source::sampler::Sampler;

/// Inputs the cached geometry was derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
struct GeometryKey {
    native: (u32, u32),
    width: u32,
    cell_aspect: f32,
}

/// One conversion cycle: sample → quantize → assemble.
///
/// Holds only the ramp, the quantizer, the resizer and the current output
/// geometry between calls. Sample and index buffers are dropped at the end
/// of every call.
///
/// # Example
/// ```
/// use gr_app::pipeline::Converter;
/// use gr_core::config::RenderConfig;
/// use gr_core::frame::FrameBuffer;
///
/// let mut converter = Converter::new(&RenderConfig::default()).unwrap();
/// let frame = FrameBuffer::filled(1920, 1080, (0, 0, 0));
/// let text = converter.convert_frame(&frame, (1920, 1080), 150).unwrap();
/// assert_eq!((text.width(), text.height()), (150, 42));
/// ```
pub struct Converter {
    ramp: IntensityRamp,
    quantizer: Quantizer,
    sampler: Sampler,
    weights: LumaWeights,
    cell_aspect: f32,
    geometry: Option<(GeometryKey, OutputGeometry)>,
}

impl Converter {
    /// Build from a configuration snapshot.
    ///
    /// # Errors
    /// Returns an error if the configured charset is not a valid ramp.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        Ok(Self::from_parts(
            config.ramp()?,
            config.weights,
            config.sample_filter,
            config.cell_aspect,
        ))
    }

    /// Build from explicit values.
    #[must_use]
    pub fn from_parts(
        ramp: IntensityRamp,
        weights: LumaWeights,
        filter: SampleFilter,
        cell_aspect: f32,
    ) -> Self {
        let quantizer = Quantizer::new(weights, ramp.len());
        Self {
            ramp,
            quantizer,
            sampler: Sampler::new(filter),
            weights,
            cell_aspect,
            geometry: None,
        }
    }

    /// Install ramp, weights, filter and cell aspect from `config`.
    ///
    /// Returns `true` if anything changed.
    ///
    /// # Errors
    /// Returns an error if the charset is invalid; the converter is left untouched.
    pub fn reconfigure(&mut self, config: &RenderConfig) -> Result<bool> {
        let ramp = config.ramp()?;
        let changed = ramp != self.ramp
            || config.weights != self.weights
            || config.sample_filter != self.sampler.filter()
            || (config.cell_aspect - self.cell_aspect).abs() > f32::EPSILON;
        if changed {
            self.quantizer = Quantizer::new(config.weights, ramp.len());
            self.ramp = ramp;
            self.weights = config.weights;
            self.sampler.set_filter(config.sample_filter);
            self.cell_aspect = config.cell_aspect;
            log::debug!("Convertisseur reconfiguré : rampe {:?}", self.ramp.to_string());
        }
        Ok(changed)
    }

    /// Ramp in use.
    #[must_use]
    pub fn ramp(&self) -> &IntensityRamp {
        &self.ramp
    }

    /// Geometry of the last successful sizing, if any.
    #[must_use]
    pub fn geometry(&self) -> Option<OutputGeometry> {
        self.geometry.map(|(_, g)| g)
    }

    /// Geometry for `native` at `width`, recomputed whenever an input changed.
    fn geometry_for(&mut self, native: (u32, u32), width: u32) -> Result<OutputGeometry, CoreError> {
        let key = GeometryKey {
            native,
            width,
            cell_aspect: self.cell_aspect,
        };
        if let Some((cached, geometry)) = self.geometry
            && cached == key
        {
            return Ok(geometry);
        }
        let geometry = OutputGeometry::compute(native, width, self.cell_aspect)?;
        log::debug!(
            "Géométrie {geometry} pour source {}x{}",
            native.0,
            native.1
        );
        self.geometry = Some((key, geometry));
        Ok(geometry)
    }

    /// Convert the source's current frame at `width` columns.
    ///
    /// # Errors
    /// Returns [`CoreError::SourceUnavailable`] if the source has no
    /// dimensions or no decoded frame yet.
    pub fn convert<S: Source + ?Sized>(
        &mut self,
        source: &mut S,
        width: u32,
    ) -> Result<FrameText, CoreError> {
        let native = source.native_size();
        // Géométrie avant la frame : une source sans métadonnées échoue sans décoder.
        self.geometry_for(native, width.max(1))?;
        let frame = source
            .current_frame()
            .ok_or_else(|| CoreError::unavailable("aucune frame décodée"))?;
        self.convert_frame(&frame, native, width)
    }

    /// Convert one decoded frame whose source has `native` dimensions.
    ///
    /// `native` drives the aspect ratio; the frame itself may be a scaled
    /// decode of the source.
    ///
    /// # Errors
    /// Returns [`CoreError::SourceUnavailable`] for zero-area sources or
    /// unusable frames.
    pub fn convert_frame(
        &mut self,
        frame: &FrameBuffer,
        native: (u32, u32),
        width: u32,
    ) -> Result<FrameText, CoreError> {
        let geometry = self.geometry_for(native, width.max(1))?;
        let samples = self.sampler.sample(frame, geometry)?;
        let indices = self.quantizer.quantize(&samples);
        Ok(assemble(&indices, geometry, &self.ramp))
    }
}
