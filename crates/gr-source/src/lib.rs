/// Visual sources (image, video) and the frame sampler for glyphreel.

pub mod image;
pub mod sampler;
pub mod video;

pub use sampler::Sampler;
