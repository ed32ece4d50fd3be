/// Glyph conversion engine for glyphreel.
///
/// Reduces sampled pixels to ramp indices and assembles them into frame text.
pub mod grid;
pub mod luminance;

pub use grid::assemble;
pub use luminance::Quantizer;
