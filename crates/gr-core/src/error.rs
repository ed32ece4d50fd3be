use thiserror::Error;

/// Errors originating from the core module.
///
/// None of these are fatal for the render loop: a failed conversion cycle
/// leaves the previous frame text on screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No frame data yet, zero-area source, or the resize surface could not be acquired.
    #[error("Source indisponible : {reason}")]
    SourceUnavailable {
        /// Human readable cause, for logs.
        reason: String,
    },

    /// The glyph ramp is too short or contains duplicates.
    #[error("Rampe de glyphes invalide : {reason}")]
    InvalidRamp {
        /// What is wrong with the ramp.
        reason: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}

impl CoreError {
    /// Shorthand for [`CoreError::SourceUnavailable`].
    ///
    /// # Example
    /// ```
    /// use gr_core::CoreError;
    /// let err = CoreError::unavailable("pas de frame");
    /// assert!(err.is_source_unavailable());
    /// ```
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    /// `true` for the recoverable "skip this cycle" class.
    #[must_use]
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}
