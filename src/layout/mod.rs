//! Grid geometry: coordinate compression and box-to-cell mapping.
//!
//! This module handles:
//! - Sorted, searchable cut lists per axis
//! - Turning box edges into real or auxiliary grid boundaries
//! - Pruning provisional boundaries when a page completes
//! - Mapping layout coordinates to cell ranges

mod cut_list;
mod sheet_layout;

pub use cut_list::{Cut, CutList, InsertOutcome, Rounding};
pub use sheet_layout::{GridRectCache, SheetLayout};
