//! Serializable dump of a filled grid.
//!
//! Format writers normally query the producers directly; the snapshot is
//! what the CLI prints and what the integration tests compare against.

use serde::Serialize;

use crate::error::Result;
use crate::producer::{CellBackground, TableContentProducer};
use crate::types::{BoxId, Coord, LayoutTree, SectionType};

/// One non-empty cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCell {
    pub row: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BoxId>,
    /// True on the top-left cell of a content box's span.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub origin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<BoxId>,
    pub section: SectionType,
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<CellBackground>,
}

fn is_zero(value: &Coord) -> bool {
    *value == 0
}

/// Geometry and live cells of one page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    pub column_widths: Vec<Coord>,
    pub row_heights: Vec<Coord>,
    pub max_width: Coord,
    pub max_height: Coord,
    /// Rows already retired; their cells are not listed.
    pub finished_rows: usize,
    pub cells: Vec<SnapshotCell>,
}

impl GridSnapshot {
    /// Capture every live cell, resolving backgrounds on the way.
    ///
    /// # Errors
    /// Propagates background resolution errors.
    pub fn capture(producer: &mut TableContentProducer, tree: &LayoutTree) -> Result<Self> {
        let layout = producer.layout();
        let rows = layout.row_count();
        let columns = layout.column_count();
        let column_widths = (0..columns).map(|c| layout.column_width(c)).collect();
        let row_heights = (0..rows).map(|r| layout.row_height(r)).collect();
        let (max_width, max_height) = (layout.max_width(), layout.max_height());

        let mut cells = Vec::new();
        for row in producer.finished_rows()..rows {
            for column in 0..columns {
                let content = producer.content_at(row, column);
                let band = producer.background_box_at(row, column);
                let background = producer.cell_background(tree, row, column)?;
                if content.is_none() && band.is_none() && background.is_none() {
                    continue;
                }
                let origin = content.is_some_and(|id| {
                    let above = row.checked_sub(1).and_then(|r| producer.content_at(r, column));
                    let left = column.checked_sub(1).and_then(|c| producer.content_at(row, c));
                    above != Some(id) && left != Some(id)
                });
                let label = content
                    .and_then(|id| tree.get(id))
                    .and_then(|b| b.label.clone());
                cells.push(SnapshotCell {
                    row,
                    column,
                    content,
                    origin,
                    label,
                    band,
                    section: producer.section_type_at(row, column),
                    offset: producer.content_offset_at(row, column),
                    background,
                });
            }
        }

        Ok(Self {
            column_widths,
            row_heights,
            max_width,
            max_height,
            finished_rows: producer.finished_rows(),
            cells,
        })
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&SnapshotCell> {
        self.cells
            .iter()
            .find(|c| c.row == row && c.column == column)
    }

    /// # Errors
    /// Fails only if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::producer::TableLayoutProducer;
    use crate::types::{Bounds, BoxKind, LayoutBox, LogicalPage, Rgba};

    #[test]
    fn test_capture_spanning_content() {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 20)));
        let mut title = LayoutBox::new(BoxKind::Content, Bounds::new(0, 0, 100, 10));
        title.label = Some("Title".to_string());
        let title = tree.add_child(body, title).unwrap();
        let mut left = LayoutBox::new(BoxKind::Content, Bounds::new(0, 10, 50, 10));
        left.style.background = Some(Rgba::GREEN);
        tree.add_child(body, left).unwrap();
        tree.add_child(body, LayoutBox::new(BoxKind::Content, Bounds::new(50, 10, 50, 10)))
            .unwrap();
        tree.finish_subtree(body).unwrap();
        let page = LogicalPage::new(body, 0, 20);

        let config = TableConfig::default();
        let mut layout = TableLayoutProducer::new(config);
        layout.update(&tree, &page, false).unwrap();
        let mut content = TableContentProducer::new(layout.into_layout(), config);
        content.compute(&tree, &page, false).unwrap();

        let snapshot = GridSnapshot::capture(&mut content, &tree).unwrap();
        assert_eq!(snapshot.column_widths, vec![50, 50]);
        assert_eq!(snapshot.row_heights, vec![10, 10]);
        assert_eq!(snapshot.cells.len(), 4);

        let first = snapshot.cell(0, 0).unwrap();
        assert_eq!(first.content, Some(title));
        assert!(first.origin);
        assert_eq!(first.label.as_deref(), Some("Title"));
        let second = snapshot.cell(0, 1).unwrap();
        assert_eq!(second.content, Some(title));
        assert!(!second.origin);

        let green = snapshot.cell(1, 0).unwrap();
        assert_eq!(
            green.background.as_ref().and_then(|b| b.color),
            Some(Rgba::GREEN)
        );

        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains("\"columnWidths\""));
        assert!(json.contains("\"normalFlow\""));
    }
}
