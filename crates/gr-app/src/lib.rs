/// Playback driver, render loop and terminal front-end for glyphreel.
pub mod app;
pub mod cli;
pub mod driver;
pub mod hotreload;
pub mod pipeline;
pub mod ticker;
