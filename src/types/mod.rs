//! Data types shared by the grid builder and the producers.

mod color;
mod geometry;
mod section;
mod style;
mod tree;

pub use color::*;
pub use geometry::*;
pub use section::*;
pub use style::*;
pub use tree::*;
