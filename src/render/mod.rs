//! Board rendering: an SVG generator for positions with annotations, and a
//! rasterizer that turns the SVG into the PNG the compositor overlays.

mod raster;
mod svg;

pub use raster::{RenderError, RsvgConvert, SvgRasterizer};
pub use svg::board_svg;
