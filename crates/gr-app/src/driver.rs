use anyhow::Result;
use gr_core::config::RenderConfig;
use gr_core::error::CoreError;
use gr_core::frame::FrameText;
use gr_core::geometry::OutputGeometry;
use gr_core::charset::IntensityRamp;
use gr_core::traits::MediaSource;

use crate::pipeline::Converter;

/// Playback state as seen by the driver.
///
/// # Example
/// ```
/// use gr_app::driver::PlaybackState;
/// assert_eq!(PlaybackState::default(), PlaybackState::Idle);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Aucune source chargée : aucune conversion.
    #[default]
    Idle,
    /// Source chargée, à l'arrêt : une conversion par chargement/seek.
    Paused,
    /// Lecture : une conversion par tick.
    Playing,
}

/// Owns the media source and decides when a conversion cycle runs.
///
/// - `load` and `seek` while paused convert exactly once;
/// - `tick` converts once while playing and does nothing otherwise;
/// - end-of-source seeks back to 0, pauses, and converts once there.
///
/// A failed cycle keeps the previous frame text.
pub struct PlaybackDriver {
    state: PlaybackState,
    source: Option<Box<dyn MediaSource>>,
    converter: Converter,
    config: RenderConfig,
    frame_text: Option<FrameText>,
    conversions: u64,
    failure_streak: u32,
    last_error: Option<CoreError>,
}

impl PlaybackDriver {
    /// Create an idle driver.
    ///
    /// # Errors
    /// Returns an error if the configured charset is invalid.
    ///
    /// # Example
    /// ```
    /// use gr_app::driver::{PlaybackDriver, PlaybackState};
    /// use gr_core::config::RenderConfig;
    ///
    /// let driver = PlaybackDriver::new(&RenderConfig::default()).unwrap();
    /// assert_eq!(driver.state(), PlaybackState::Idle);
    /// assert!(driver.frame_text().is_none());
    /// ```
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut config = config.clone();
        config.clamp_all();
        Ok(Self {
            state: PlaybackState::Idle,
            source: None,
            converter: Converter::new(&config)?,
            config,
            frame_text: None,
            conversions: 0,
            failure_streak: 0,
            last_error: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Last successfully converted frame.
    #[must_use]
    pub fn frame_text(&self) -> Option<&FrameText> {
        self.frame_text.as_ref()
    }

    /// Current output width in cells, always within the configured bounds.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.config.resolution
    }

    /// Geometry of the most recent sizing.
    #[must_use]
    pub fn geometry(&self) -> Option<OutputGeometry> {
        self.converter.geometry()
    }

    /// Glyph ramp the converter currently maps onto.
    #[must_use]
    pub fn ramp(&self) -> &IntensityRamp {
        self.converter.ramp()
    }

    /// Number of conversion cycles attempted since creation.
    #[must_use]
    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Error of the last cycle, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    /// Playback position of the loaded source, in seconds.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.source.as_ref().map_or(0.0, |s| s.position())
    }

    /// Install a source: Idle/any → Paused, one conversion.
    pub fn load(&mut self, mut source: Box<dyn MediaSource>) {
        source.pause();
        let (w, h) = source.native_size();
        log::info!("Source chargée : {w}x{h}");
        self.source = Some(source);
        self.frame_text = None;
        self.state = PlaybackState::Paused;
        self.refresh();
    }

    /// Drop the source and return to Idle.
    pub fn unload(&mut self) {
        self.source = None;
        self.frame_text = None;
        self.state = PlaybackState::Idle;
    }

    /// Paused → Playing. No effect in other states.
    pub fn play(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if let Some(source) = self.source.as_mut() {
            source.play();
            self.state = PlaybackState::Playing;
            log::debug!("Lecture");
        }
    }

    /// Playing → Paused. No conversion.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Some(source) = self.source.as_mut() {
            source.pause();
        }
        self.state = PlaybackState::Paused;
        log::debug!("Pause");
    }

    /// Play/pause toggle.
    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.play(),
            PlaybackState::Idle => {}
        }
    }

    /// Seek to `pos_secs`. While paused this converts once; while playing
    /// the next tick picks up the new position.
    pub fn seek(&mut self, pos_secs: f64) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        source.seek(pos_secs.max(0.0));
        if self.state == PlaybackState::Paused {
            self.refresh();
        }
    }

    /// Seek by `delta` seconds from the current position.
    pub fn seek_by(&mut self, delta: f64) {
        let target = self.position() + delta;
        self.seek(target);
    }

    /// Set the output width, clamped into the configured bounds.
    ///
    /// While paused with a source loaded, converts once so the frame text
    /// reflects the new geometry. Returns the applied width.
    pub fn set_resolution(&mut self, requested: u32) -> u32 {
        let clamped = self.config.clamp_resolution(requested);
        if clamped != self.config.resolution {
            self.config.resolution = clamped;
            log::debug!("Résolution -> {clamped}");
            if self.state == PlaybackState::Paused {
                self.refresh();
            }
        }
        clamped
    }

    /// Apply a configuration snapshot between ticks.
    ///
    /// A change of ramp, weights, filter, aspect or resolution while paused
    /// converts once. An invalid charset keeps the previous one.
    ///
    /// # Errors
    /// Returns an error if the charset is invalid.
    pub fn apply_config(&mut self, config: &RenderConfig) -> Result<()> {
        if *config == self.config {
            return Ok(());
        }
        let mut next = config.clone();
        next.clamp_all();
        let converter_changed = self.converter.reconfigure(&next)?;
        let resolution_changed = next.resolution != self.config.resolution;
        self.config = next;
        if (converter_changed || resolution_changed) && self.state == PlaybackState::Paused {
            self.refresh();
        }
        Ok(())
    }

    /// One render-loop tick. Converts only while playing.
    ///
    /// Returns `true` if a conversion cycle ran.
    pub fn tick(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        if source.take_ended() {
            log::info!("Fin de source, retour au début.");
            source.seek(0.0);
            source.pause();
            self.state = PlaybackState::Paused;
        }
        self.refresh();
        true
    }

    /// Convert once more if the source delivered, late, the frame a paused
    /// load or seek was waiting for. Returns `true` if a cycle ran.
    pub fn poll_late_frame(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        if !source.take_late_frame() {
            return false;
        }
        log::debug!("Frame tardive reçue, nouvelle conversion.");
        self.refresh();
        true
    }

    /// Run one conversion cycle against the loaded source.
    fn refresh(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        self.conversions += 1;
        match self.converter.convert(source.as_mut(), self.config.resolution) {
            Ok(text) => {
                if self.failure_streak > 0 {
                    log::info!(
                        "Source de nouveau disponible après {} échec(s).",
                        self.failure_streak
                    );
                }
                self.failure_streak = 0;
                self.last_error = None;
                self.frame_text = Some(text);
            }
            Err(e) => {
                // Une source indisponible en boucle ne spamme qu'une fois.
                if self.failure_streak == 0 || !e.is_source_unavailable() {
                    log::warn!("Conversion ignorée : {e}");
                } else {
                    log::debug!("Conversion ignorée : {e}");
                }
                self.failure_streak = self.failure_streak.saturating_add(1);
                self.last_error = Some(e);
            }
        }
    }
}
