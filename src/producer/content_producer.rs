//! Fills the grid's cells from the layout tree.
//!
//! Each row moves through `empty -> partially filled -> filled (every cell
//! committed) -> finished (every cell finished, at least one content cell)
//! -> retired`. Rows never move backwards. Retired rows release their
//! storage, which keeps memory bounded on very long documents.

use std::collections::HashMap;

use super::background::{CellBackground, CellBackgroundProducer};
use super::cell_marker::CellMarker;
use super::frame::{page_frames, SectionFrame};
use crate::config::TableConfig;
use crate::error::{Result, TableGridError};
use crate::layout::{GridRectCache, SheetLayout};
use crate::types::{BoxId, Coord, GridRectangle, LayoutBox, LayoutTree, LogicalPage, SectionType};

type GridRow = Vec<Option<CellMarker>>;

/// Cell content for one page, laid over a completed [`SheetLayout`].
#[derive(Debug)]
pub struct TableContentProducer {
    layout: SheetLayout,
    config: TableConfig,
    rows: Vec<GridRow>,
    /// Rows below this index are retired.
    finished_rows: usize,
    /// Rows below this index hold only committed markers.
    filled_rows: usize,
    /// Rows below this index have released their storage.
    cleared_rows: usize,
    /// Content boxes already written (or given up on after a conflict),
    /// with the row their rectangle ends at.
    placed: HashMap<BoxId, usize>,
    conflicts: usize,
    frames: Vec<SectionFrame>,
    rect_cache: GridRectCache,
    backgrounds: CellBackgroundProducer,
}

impl TableContentProducer {
    pub fn new(layout: SheetLayout, config: TableConfig) -> Self {
        Self {
            layout,
            config,
            rows: Vec::new(),
            finished_rows: 0,
            filled_rows: 0,
            cleared_rows: 0,
            placed: HashMap::new(),
            conflicts: 0,
            frames: Vec::new(),
            rect_cache: GridRectCache::new(),
            backgrounds: CellBackgroundProducer::new(config),
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn finished_rows(&self) -> usize {
        self.finished_rows
    }

    pub fn filled_rows(&self) -> usize {
        self.filled_rows
    }

    pub fn cleared_rows(&self) -> usize {
        self.cleared_rows
    }

    /// Conflicts seen so far on this page.
    pub fn conflict_count(&self) -> usize {
        self.conflicts
    }

    /// Content boxes still remembered as handled. Boxes that end in
    /// retired rows are forgotten.
    pub fn tracked_boxes(&self) -> usize {
        self.placed.len()
    }

    pub fn rect_cache(&self) -> &GridRectCache {
        &self.rect_cache
    }

    pub fn backgrounds(&self) -> &CellBackgroundProducer {
        &self.backgrounds
    }

    /// Area frames from the most recent [`Self::compute`].
    pub fn frames(&self) -> &[SectionFrame] {
        &self.frames
    }

    /// Walk the page and place band and content markers.
    ///
    /// In an iterative pass only committed boxes are written; the final
    /// pass writes everything.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] for an inconsistent page, and
    /// [`TableGridError::CellConflict`] when conflicts are configured to fail.
    pub fn compute(
        &mut self,
        tree: &LayoutTree,
        page: &LogicalPage,
        is_iterative_pass: bool,
    ) -> Result<()> {
        page.validate(tree)?;
        self.frames = page_frames(tree, page, &self.config)?;
        self.ensure_rows(self.layout.row_count());

        let frames = std::mem::take(&mut self.frames);
        let outcome = frames
            .iter()
            .try_for_each(|frame| self.process_section(tree, frame, is_iterative_pass));
        self.frames = frames;
        outcome?;

        self.update_filled_rows(tree);
        Ok(())
    }

    fn process_section(
        &mut self,
        tree: &LayoutTree,
        frame: &SectionFrame,
        is_iterative_pass: bool,
    ) -> Result<()> {
        let mut stack = vec![(frame.root, 0_usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = tree.node(id)?;
            if !node.visible || !frame.is_in_window(&node.bounds) {
                continue;
            }
            if node.kind.is_content(&self.config) {
                self.place_content(id, node, frame, is_iterative_pass)?;
                continue;
            }
            // An open structural box may still grow; wait until it is committed
            let writes_band = node.committed || !is_iterative_pass;
            if writes_band || node.finished {
                let rect = self.map_box(id, node, frame);
                if node.finished && self.is_retired(&rect) {
                    log::trace!("{id} lies in retired rows, skipping its subtree");
                    self.rect_cache.remove(id);
                    continue;
                }
                if writes_band {
                    self.place_band(id, &rect, frame, depth);
                }
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }

    fn map_box(&mut self, id: BoxId, node: &LayoutBox, frame: &SectionFrame) -> GridRectangle {
        let bounds = frame.frame_bounds(&node.bounds);
        self.layout
            .map_bounds_cached(id, node.generation(), &bounds, &mut self.rect_cache)
    }

    /// Whether a mapped box lies wholly in rows that are already retired.
    fn is_retired(&self, rect: &GridRectangle) -> bool {
        !rect.is_empty() && rect.y2 <= self.finished_rows
    }

    /// Write a band marker into every cell the box covers, unless a more
    /// specific band or content already holds the cell.
    fn place_band(&mut self, id: BoxId, rect: &GridRectangle, frame: &SectionFrame, depth: usize) {
        if rect.is_empty() {
            return;
        }
        let section = frame.section_type();
        for (row, column) in rect.cells() {
            if row < self.finished_rows {
                continue;
            }
            let Some(slot) = self.slot_mut(row, column) else {
                continue;
            };
            let replace = match slot {
                None => true,
                Some(CellMarker::Band {
                    section: existing,
                    depth: existing_depth,
                    ..
                }) => {
                    (*existing == SectionType::Invalid && section != SectionType::Invalid)
                        || (*existing == section && depth > *existing_depth)
                }
                Some(CellMarker::Content { .. } | CellMarker::Retired { .. }) => false,
            };
            if replace {
                *slot = Some(CellMarker::Band {
                    source: id,
                    section,
                    depth,
                });
            }
        }
    }

    fn place_content(
        &mut self,
        id: BoxId,
        node: &LayoutBox,
        frame: &SectionFrame,
        is_iterative_pass: bool,
    ) -> Result<()> {
        if self.placed.contains_key(&id) || (is_iterative_pass && !node.committed) {
            return Ok(());
        }
        let rect = self.map_box(id, node, frame);
        if rect.is_empty() {
            log::trace!("{id} maps to no cell");
            if rect.y2 > self.finished_rows {
                self.placed.insert(id, rect.y2);
            }
            return Ok(());
        }
        // Written before its rows retired; the rows can no longer change
        if node.finished && self.is_retired(&rect) {
            self.rect_cache.remove(id);
            return Ok(());
        }

        if let Some((row, column, existing)) = self.find_conflict(&rect, id) {
            self.conflicts += 1;
            self.placed.insert(id, rect.y2);
            if self.config.fail_on_cell_conflicts {
                return Err(TableGridError::CellConflict {
                    row,
                    column,
                    existing,
                    incoming: id,
                });
            }
            if self.config.report_cell_conflicts {
                log::warn!(
                    "cell conflict at row {row}, column {column}: {id} dropped, keeping {existing}"
                );
            }
            return Ok(());
        }

        let section = frame.section_type();
        let offset = frame.shift();
        for (row, column) in rect.cells() {
            if let Some(slot) = self.slot_mut(row, column) {
                *slot = Some(CellMarker::Content {
                    source: id,
                    offset,
                    section,
                });
            }
        }
        self.placed.insert(id, rect.y2);
        Ok(())
    }

    /// First cell of `rect` that `incoming` may not take.
    fn find_conflict(
        &self,
        rect: &GridRectangle,
        incoming: BoxId,
    ) -> Option<(usize, usize, String)> {
        rect.cells().find_map(|(row, column)| {
            if row < self.finished_rows {
                return Some((row, column, format!("finished row {row}")));
            }
            match self.slot(row, column) {
                Some(CellMarker::Content { source, .. }) if *source != incoming => {
                    Some((row, column, source.to_string()))
                }
                _ => None,
            }
        })
    }

    fn ensure_rows(&mut self, count: usize) {
        let columns = self.layout.column_count();
        while self.rows.len() < count {
            let row = if self.rows.len() < self.cleared_rows {
                Vec::new()
            } else {
                vec![None; columns]
            };
            self.rows.push(row);
        }
    }

    fn slot(&self, row: usize, column: usize) -> Option<&CellMarker> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    fn slot_mut(&mut self, row: usize, column: usize) -> Option<&mut Option<CellMarker>> {
        self.rows.get_mut(row)?.get_mut(column)
    }

    /// Advance `filled_rows` over rows whose every cell holds a committed marker.
    fn update_filled_rows(&mut self, tree: &LayoutTree) {
        let columns = self.layout.column_count();
        let mut row = self.filled_rows.max(self.finished_rows);
        while let Some(cells) = self.rows.get(row) {
            let complete = cells.len() >= columns
                && cells
                    .iter()
                    .take(columns)
                    .all(|c| c.as_ref().is_some_and(|m| m.is_committed(tree)));
            if !complete {
                break;
            }
            row += 1;
        }
        self.filled_rows = row;
    }

    /// Retire finished rows, starting at `finished_rows`.
    ///
    /// A row is retired only when every cell is finished and at least one
    /// holds content; rows made only of bands stay, since later content may
    /// still need their backgrounds. Side-table entries that only concern
    /// retired rows are dropped with them. Returns the number of rows retired.
    pub fn clear_finished_boxes(&mut self, tree: &LayoutTree) -> usize {
        let columns = self.layout.column_count();
        let start = self.finished_rows;
        let mut row = start;
        while row < self.filled_rows {
            let Some(cells) = self.rows.get(row) else {
                break;
            };
            let all_finished = cells
                .iter()
                .take(columns)
                .all(|c| c.as_ref().is_some_and(|m| m.is_finished(tree)));
            let has_content = cells
                .iter()
                .any(|c| matches!(c, Some(CellMarker::Content { .. })));
            if !(all_finished && has_content) {
                break;
            }
            self.retire_row(row, tree);
            row += 1;
        }
        self.finished_rows = row;

        if self.config.verbose_cell_markers {
            let keep_from = row.saturating_sub(self.config.verbose_row_threshold);
            self.drop_rows_below(keep_from);
        } else {
            self.drop_rows_below(row);
        }

        let retired = row - start;
        if retired > 0 {
            self.placed.retain(|_, end| *end > row);
            self.rect_cache.evict_rows_before(row);
            self.backgrounds.evict_rows_before(row);
            log::debug!(
                "retired rows {start}..{row}, storage released below {}",
                self.cleared_rows
            );
        }
        retired
    }

    fn retire_row(&mut self, row: usize, tree: &LayoutTree) {
        if !self.config.verbose_cell_markers {
            return;
        }
        if let Some(cells) = self.rows.get_mut(row) {
            for cell in cells.iter_mut() {
                let label = cell
                    .as_ref()
                    .map_or_else(|| "empty".to_string(), |m| m.describe(tree));
                *cell = Some(CellMarker::Retired { label });
            }
        }
    }

    fn drop_rows_below(&mut self, row: usize) {
        while self.cleared_rows < row {
            if let Some(cells) = self.rows.get_mut(self.cleared_rows) {
                *cells = Vec::new();
            }
            self.cleared_rows += 1;
        }
    }

    /// Live marker at a cell, or `None` once the row is retired.
    fn live_marker(&self, row: usize, column: usize) -> Option<&CellMarker> {
        if row < self.finished_rows {
            return None;
        }
        self.slot(row, column)
    }

    /// Raw marker for diagnostics. In verbose mode, retired rows that are
    /// still within the threshold answer with their placeholder.
    pub fn marker_at(&self, row: usize, column: usize) -> Option<&CellMarker> {
        self.slot(row, column)
    }

    /// Content box occupying the cell.
    pub fn content_at(&self, row: usize, column: usize) -> Option<BoxId> {
        self.live_marker(row, column).and_then(CellMarker::content)
    }

    /// Band box drawing the cell's background; `None` for content cells.
    pub fn background_box_at(&self, row: usize, column: usize) -> Option<BoxId> {
        match self.live_marker(row, column)? {
            CellMarker::Band { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn section_type_at(&self, row: usize, column: usize) -> SectionType {
        self.live_marker(row, column)
            .map_or(SectionType::Invalid, CellMarker::section_type)
    }

    /// Shift that moves the content box's `y` into the shared frame; 0 for
    /// anything but content.
    pub fn content_offset_at(&self, row: usize, column: usize) -> Coord {
        match self.live_marker(row, column) {
            Some(CellMarker::Content { offset, .. }) => *offset,
            _ => 0,
        }
    }

    /// Resolve the cell's background, using the content box's ancestors
    /// when the cell holds content.
    ///
    /// # Errors
    /// Propagates lookup errors from [`CellBackgroundProducer`].
    pub fn cell_background(
        &mut self,
        tree: &LayoutTree,
        row: usize,
        column: usize,
    ) -> Result<Option<CellBackground>> {
        if row < self.finished_rows
            || row >= self.layout.row_count()
            || column >= self.layout.column_count()
        {
            return Ok(None);
        }
        let source = match self.slot(row, column) {
            Some(CellMarker::Band { source, .. } | CellMarker::Content { source, .. }) => {
                Some(*source)
            }
            Some(CellMarker::Retired { .. }) => return Ok(None),
            None => None,
        };
        self.backgrounds
            .resolve(tree, &self.frames, &self.layout, row, column, source)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::producer::TableLayoutProducer;
    use crate::types::{Bounds, BoxKind, LayoutBox, Rgba};

    /// Body with one band covering two rows and a content leaf in row 0.
    fn two_row_page() -> (LayoutTree, LogicalPage, BoxId, BoxId) {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 40)));
        let mut band = LayoutBox::new(BoxKind::Block, Bounds::new(0, 0, 100, 40));
        band.style.background = Some(Rgba::BLUE);
        let band = tree.add_child(body, band).unwrap();
        let text = tree
            .add_child(band, LayoutBox::new(BoxKind::Content, Bounds::new(0, 0, 100, 20)))
            .unwrap();
        tree.finish_subtree(body).unwrap();
        (tree, LogicalPage::new(body, 0, 40), band, text)
    }

    fn produce(tree: &LayoutTree, page: &LogicalPage, config: TableConfig) -> TableContentProducer {
        let mut layout = TableLayoutProducer::new(config);
        layout.update(tree, page, false).unwrap();
        let mut content = TableContentProducer::new(layout.into_layout(), config);
        content.compute(tree, page, false).unwrap();
        content
    }

    #[test]
    fn test_band_and_content_placement() {
        let (tree, page, band, text) = two_row_page();
        let content = produce(&tree, &page, TableConfig::default());
        assert_eq!(content.layout().row_count(), 2);
        assert_eq!(content.layout().column_count(), 1);
        assert_eq!(content.content_at(0, 0), Some(text));
        assert_eq!(content.content_at(1, 0), None);
        assert_eq!(content.background_box_at(1, 0), Some(band));
        assert_eq!(content.background_box_at(0, 0), None);
        assert_eq!(content.section_type_at(0, 0), SectionType::NormalFlow);
        assert_eq!(content.filled_rows(), 2);
    }

    #[test]
    fn test_band_only_row_not_retired() {
        let (tree, page, _, _) = two_row_page();
        let mut content = produce(&tree, &page, TableConfig::default());
        assert_eq!(content.clear_finished_boxes(&tree), 1);
        assert_eq!(content.finished_rows(), 1);
        // Row 1 holds only the band and stays available
        assert_eq!(content.clear_finished_boxes(&tree), 0);
        assert_eq!(content.finished_rows(), 1);
        assert!(content.background_box_at(1, 0).is_some());
        // Row 0 is gone
        assert_eq!(content.content_at(0, 0), None);
        assert!(content.marker_at(0, 0).is_none());
        assert_eq!(content.cleared_rows(), 1);
    }

    #[test]
    fn test_verbose_keeps_placeholders() {
        let (tree, page, _, _) = two_row_page();
        let config = TableConfig::default().with_verbose_cell_markers(true, 5);
        let mut content = produce(&tree, &page, config);
        content.clear_finished_boxes(&tree);
        assert_eq!(content.content_at(0, 0), None);
        match content.marker_at(0, 0) {
            Some(CellMarker::Retired { label }) => assert!(label.starts_with("content box#")),
            other => panic!("expected a placeholder, got {other:?}"),
        }
        assert_eq!(content.cleared_rows(), 0);
    }

    #[test]
    fn test_verbose_threshold_zero_drops() {
        let (tree, page, _, _) = two_row_page();
        let config = TableConfig::default().with_verbose_cell_markers(true, 0);
        let mut content = produce(&tree, &page, config);
        content.clear_finished_boxes(&tree);
        assert!(content.marker_at(0, 0).is_none());
        assert_eq!(content.cleared_rows(), 1);
    }

    #[test]
    fn test_uncommitted_content_waits() {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 50, 10)));
        let text = tree
            .add_child(body, LayoutBox::new(BoxKind::Content, Bounds::new(0, 0, 50, 10)))
            .unwrap();
        tree.commit(body).unwrap();
        let page = LogicalPage::new(body, 0, 10);

        let mut layout = TableLayoutProducer::new(TableConfig::default());
        layout.update(&tree, &page, false).unwrap();
        let mut content = TableContentProducer::new(layout.into_layout(), TableConfig::default());

        content.compute(&tree, &page, true).unwrap();
        assert_eq!(content.content_at(0, 0), None);
        assert_eq!(content.background_box_at(0, 0), Some(body));

        tree.commit(text).unwrap();
        content.compute(&tree, &page, true).unwrap();
        assert_eq!(content.content_at(0, 0), Some(text));
        // Re-running does not conflict with itself
        content.compute(&tree, &page, false).unwrap();
        assert_eq!(content.conflict_count(), 0);
    }

    #[test]
    fn test_cell_background_for_band_and_content() {
        let (tree, page, _, _) = two_row_page();
        let mut content = produce(&tree, &page, TableConfig::default());
        let row0 = content.cell_background(&tree, 0, 0).unwrap().unwrap();
        let row1 = content.cell_background(&tree, 1, 0).unwrap().unwrap();
        assert_eq!(row0.color, Some(Rgba::BLUE));
        assert_eq!(row1.color, Some(Rgba::BLUE));
        assert!(content.cell_background(&tree, 5, 0).unwrap().is_none());
    }
}
