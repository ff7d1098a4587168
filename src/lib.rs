//! tablegrid - compress a positioned layout tree into a table grid
//!
//! Turns pages of absolutely positioned boxes into the row/column grid
//! that spreadsheet and HTML-table writers render from:
//! - Sorted cut lists with real and provisional boundaries per axis
//! - Two streaming passes per page (boundaries, then cell content)
//! - Exact-coverage background and border resolution per cell
//! - Finished rows retired while streaming, so memory stays bounded
//!
//! # Usage
//!
//! ```no_run
//! use tablegrid::{GridSnapshot, PageDocument, TableContentProducer, TableLayoutProducer};
//!
//! # fn main() -> tablegrid::Result<()> {
//! let json = std::fs::read_to_string("page.json")?;
//! let doc = PageDocument::from_json(&json)?;
//!
//! let mut layout = TableLayoutProducer::new(doc.config);
//! layout.update(&doc.tree, &doc.page, false)?;
//!
//! let mut content = TableContentProducer::new(layout.into_layout(), doc.config);
//! content.compute(&doc.tree, &doc.page, false)?;
//! let snapshot = GridSnapshot::capture(&mut content, &doc.tree)?;
//! println!("{}", snapshot.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod producer;
pub mod snapshot;
pub mod types;

pub use config::TableConfig;
pub use error::{Result, TableGridError};
pub use layout::{CutList, GridRectCache, Rounding, SheetLayout};
pub use producer::{
    CellBackground, CellBackgroundProducer, CellMarker, Coverage, SectionFrame,
    TableContentProducer, TableLayoutProducer,
};
pub use snapshot::{GridSnapshot, SnapshotCell};
pub use types::*;
