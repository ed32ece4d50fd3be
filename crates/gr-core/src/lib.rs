/// Configuration, types, and shared structures for glyphreel.
///
/// This crate contains the intensity ramp, output geometry, frame types,
/// source traits and configuration logic used across the workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod traits;

pub use charset::IntensityRamp;
pub use config::RenderConfig;
pub use error::CoreError;
pub use frame::{FrameBuffer, FrameText, PixelSamples};
pub use geometry::OutputGeometry;
