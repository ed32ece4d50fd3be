use std::sync::Arc;

use crate::frame::FrameBuffer;

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `ImageSource`, `VideoSource`.
///
/// # Example
/// ```
/// use gr_core::traits::Source;
/// use gr_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn current_frame(&mut self) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
/// }
/// ```
pub trait Source: Send + 'static {
    /// Frame at the current playback position.
    ///
    /// Retourne `None` tant qu'aucune frame n'a été décodée.
    /// Ne bloque jamais plus d'un court délai après un seek.
    fn current_frame(&mut self) -> Option<Arc<FrameBuffer>>;

    /// Dimensions natives de la source (avant resize). `(0, 0)` si inconnues.
    fn native_size(&self) -> (u32, u32);
}

/// Transport controls of a playable media source.
///
/// The playback driver owns one of these and decides when frames are read.
///
/// # Example
/// ```
/// use gr_core::traits::{MediaSource, Source};
/// use gr_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct Still(Arc<FrameBuffer>);
/// impl Source for Still {
///     fn current_frame(&mut self) -> Option<Arc<FrameBuffer>> { Some(Arc::clone(&self.0)) }
///     fn native_size(&self) -> (u32, u32) { (self.0.width, self.0.height) }
/// }
/// impl MediaSource for Still {
///     fn play(&mut self) {}
///     fn pause(&mut self) {}
///     fn seek(&mut self, _pos_secs: f64) {}
///     fn position(&self) -> f64 { 0.0 }
///     fn take_ended(&mut self) -> bool { false }
/// }
/// ```
pub trait MediaSource: Source {
    /// Reprendre la lecture.
    fn play(&mut self);

    /// Mettre en pause.
    fn pause(&mut self);

    /// Aller à la position absolue `pos_secs` (clampée à 0).
    fn seek(&mut self, pos_secs: f64);

    /// Position de lecture en secondes.
    fn position(&self) -> f64;

    /// `true` once per end-of-stream; the flag is cleared by the call.
    fn take_ended(&mut self) -> bool;

    /// `true` once when a frame requested by a load or seek arrived after
    /// `current_frame` stopped waiting for it. Sources that never make the
    /// caller wait keep the default.
    fn take_late_frame(&mut self) -> bool {
        false
    }
}
