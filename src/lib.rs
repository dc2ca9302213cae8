pub mod colormap;
pub mod config;
pub mod control;
pub mod earthquakes;
pub mod error;
pub mod feed;
pub mod geometry;
pub mod legend;
pub mod overlay;
pub mod plates;
pub mod tiles;
pub mod view;
pub mod window;

pub use error::{Error, Result};
