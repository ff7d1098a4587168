//! Tree walkers that turn a paginated layout tree into a filled grid.
//!
//! - [`TableLayoutProducer`] collects grid boundaries while a page is laid out
//! - [`TableContentProducer`] places band and content markers into cells
//! - [`CellBackgroundProducer`] resolves a cell's color, borders and anchors

mod background;
mod cell_marker;
mod content_producer;
mod frame;
mod layout_producer;

pub use background::{CellBackground, CellBackgroundProducer, Coverage};
pub use cell_marker::CellMarker;
pub use content_producer::TableContentProducer;
pub use frame::{page_frames, SectionFrame};
pub use layout_producer::TableLayoutProducer;
