//! Grid boundaries for one page.
//!
//! Boxes are fed in one at a time; each contributes cuts on the X and Y
//! axes. When the page completes, cuts that no box turned into a real
//! boundary are pruned, and what remains defines the table's columns and
//! rows. Afterwards any box can be mapped to the cells it covers in
//! O(log n).

use std::collections::HashMap;

use super::cut_list::{CutList, InsertOutcome, Rounding};
use crate::config::TableConfig;
use crate::types::{shift_into_frame, Bounds, BoxId, Coord, GridRectangle, LayoutBox};

/// Column and row boundaries of a page.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    x_cuts: CutList,
    y_cuts: CutList,
    /// Rightmost edge seen so far
    max_width: Coord,
    /// Bottom edge seen so far, in the shared page frame
    max_height: Coord,
    config: TableConfig,
    /// Bumped whenever the cuts change; invalidates mapped rectangles.
    revision: u64,
}

/// Shape class of a box as far as grid lines are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoxShape {
    Point,
    HorizontalLine,
    VerticalLine,
    Area,
}

impl SheetLayout {
    /// Create an empty layout. Both axes start with a real cut at 0.
    pub fn new(config: TableConfig) -> Self {
        let mut x_cuts = CutList::new();
        let mut y_cuts = CutList::with_capacity(64);
        x_cuts.insert(0, false);
        y_cuts.insert(0, false);
        Self {
            x_cuts,
            y_cuts,
            max_width: 0,
            max_height: 0,
            config,
            revision: 0,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Every box edge counts as a real boundary.
    pub fn is_strict(&self) -> bool {
        self.config.strict_layout
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn x_cuts(&self) -> &CutList {
        &self.x_cuts
    }

    pub fn y_cuts(&self) -> &CutList {
        &self.y_cuts
    }

    /// Contribute a box's edges.
    ///
    /// The box's vertical coordinates are moved into the shared page frame
    /// with [`shift_into_frame`]. Leading edges are always real; trailing
    /// edges are auxiliary unless the box is content, carries a visual
    /// marker, or the layout is strict.
    ///
    /// Returns true if nothing changed.
    pub fn add_box(
        &mut self,
        layout_box: &LayoutBox,
        vertical_offset: Coord,
        header_size: Coord,
        max_height: Coord,
    ) -> bool {
        if !layout_box.visible {
            return true;
        }

        let bounds = layout_box.bounds;
        let top = shift_into_frame(bounds.y, vertical_offset, header_size, max_height);
        let bottom = shift_into_frame(bounds.bottom(), vertical_offset, header_size, max_height);
        let (left, right) = (bounds.x, bounds.right());
        let style = &layout_box.style;

        let shape = match (right > left, bottom > top) {
            (true, true) => BoxShape::Area,
            (true, false) => BoxShape::HorizontalLine,
            (false, true) => BoxShape::VerticalLine,
            (false, false) => BoxShape::Point,
        };

        let mut outcomes = [InsertOutcome::Unchanged; 4];
        match shape {
            BoxShape::Area => {
                let is_content = layout_box.kind.is_content(&self.config);
                let trailing_auxiliary =
                    !(self.config.strict_layout || is_content || style.has_visual_marker());
                outcomes = [
                    self.x_cuts.insert_cut(left, false),
                    self.x_cuts.insert_cut(right, trailing_auxiliary),
                    self.y_cuts.insert_cut(top, false),
                    self.y_cuts.insert_cut(bottom, trailing_auxiliary),
                ];
            }
            _ if !(style.has_border() || style.has_anchor()) => {
                log::trace!("ignoring zero-area box at ({left}, {top}) without marker");
                return true;
            }
            BoxShape::HorizontalLine => {
                outcomes[0] = self.y_cuts.insert_cut(top, false);
            }
            BoxShape::VerticalLine => {
                outcomes[0] = self.x_cuts.insert_cut(left, false);
            }
            BoxShape::Point => {
                outcomes[0] = self.x_cuts.insert_cut(left, false);
                outcomes[1] = self.y_cuts.insert_cut(top, false);
            }
        }

        let mut changed = outcomes.iter().any(|o| *o != InsertOutcome::Unchanged);
        if right > self.max_width {
            self.max_width = right;
            changed = true;
        }
        if bottom > self.max_height {
            self.max_height = bottom;
            changed = true;
        }
        if changed {
            self.revision += 1;
        }
        !changed
    }

    /// Finalize the page's boundaries: the running maxima become real
    /// cuts, then every cut still auxiliary is dropped.
    pub fn page_completed(&mut self) {
        let before = (self.x_cuts.size(), self.y_cuts.size());
        let mut changed = self.x_cuts.insert_cut(self.max_width, false) != InsertOutcome::Unchanged;
        changed |= self.y_cuts.insert_cut(self.max_height, false) != InsertOutcome::Unchanged;

        let x_aux = self.x_cuts.auxiliary_keys();
        let y_aux = self.y_cuts.auxiliary_keys();
        changed |= !x_aux.is_empty() || !y_aux.is_empty();
        self.x_cuts.remove_sorted_subset(&x_aux);
        self.y_cuts.remove_sorted_subset(&y_aux);

        if changed {
            self.revision += 1;
        }
        log::debug!(
            "page completed: {}x{} cuts pruned to {}x{}",
            before.0,
            before.1,
            self.x_cuts.size(),
            self.y_cuts.size()
        );
    }

    /// Map shared-frame coordinates to the grid. Start edges round down,
    /// end edges round up.
    pub fn map_bounds(&self, x: Coord, y: Coord, width: Coord, height: Coord) -> GridRectangle {
        let x1 = self.x_cuts.find_position(x, Rounding::Lower);
        let x2 = self
            .x_cuts
            .find_position(x + width, Rounding::Upper)
            .max(x1);
        let y1 = self.y_cuts.find_position(y, Rounding::Lower);
        let y2 = self
            .y_cuts
            .find_position(y + height, Rounding::Upper)
            .max(y1);
        GridRectangle::new(x1, y1, x2, y2)
    }

    /// [`Self::map_bounds`] with a per-box side table.
    ///
    /// A cached rectangle is reused while both the box generation and this
    /// layout's revision are unchanged. The cache belongs to one page; the
    /// same box must always be mapped with the same frame.
    pub fn map_bounds_cached(
        &self,
        id: BoxId,
        generation: u64,
        bounds: &Bounds,
        cache: &mut GridRectCache,
    ) -> GridRectangle {
        if let Some(hit) = cache.entries.get(&id) {
            if hit.generation == generation && hit.revision == self.revision {
                cache.hits += 1;
                return hit.rect;
            }
        }
        let rect = self.map_bounds(bounds.x, bounds.y, bounds.width, bounds.height);
        cache.entries.insert(
            id,
            CachedRect {
                generation,
                revision: self.revision,
                rect,
            },
        );
        rect
    }

    /// Number of rows; zero until a second horizontal cut exists.
    pub fn row_count(&self) -> usize {
        self.y_cuts.size().saturating_sub(1)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.x_cuts.size().saturating_sub(1)
    }

    /// Height of one row, 0 if it does not exist.
    pub fn row_height(&self, row: usize) -> Coord {
        self.row_span_height(row, row + 1)
    }

    /// Combined height of rows `start..end`, 0 if out of range.
    pub fn row_span_height(&self, start: usize, end: usize) -> Coord {
        span(&self.y_cuts, start, end)
    }

    /// Width of one column, 0 if it does not exist.
    pub fn column_width(&self, column: usize) -> Coord {
        self.column_span_width(column, column + 1)
    }

    /// Combined width of columns `start..end`, 0 if out of range.
    pub fn column_span_width(&self, start: usize, end: usize) -> Coord {
        span(&self.x_cuts, start, end)
    }

    /// Shared-frame bounds of a cell.
    pub fn cell_bounds(&self, row: usize, column: usize) -> Option<Bounds> {
        self.rect_bounds(&GridRectangle::cell(row, column))
    }

    /// Shared-frame bounds of a grid rectangle.
    pub fn rect_bounds(&self, rect: &GridRectangle) -> Option<Bounds> {
        let left = self.x_cuts.cut_at(rect.x1)?.coord;
        let right = self.x_cuts.cut_at(rect.x2)?.coord;
        let top = self.y_cuts.cut_at(rect.y1)?.coord;
        let bottom = self.y_cuts.cut_at(rect.y2)?.coord;
        Some(Bounds::new(left, top, right - left, bottom - top))
    }

    pub fn max_width(&self) -> Coord {
        self.max_width
    }

    pub fn max_height(&self) -> Coord {
        self.max_height
    }

    /// Layout for the next page: columns are kept, rows start over.
    pub fn derive(&self) -> Self {
        let mut y_cuts = CutList::with_capacity(64);
        y_cuts.insert(0, false);
        Self {
            x_cuts: self.x_cuts.clone(),
            y_cuts,
            max_width: self.max_width,
            max_height: 0,
            config: self.config,
            revision: self.revision + 1,
        }
    }
}

fn span(cuts: &CutList, start: usize, end: usize) -> Coord {
    if end <= start {
        return 0;
    }
    match (cuts.cut_at(start), cuts.cut_at(end)) {
        (Some(a), Some(b)) => b.coord - a.coord,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedRect {
    generation: u64,
    revision: u64,
    rect: GridRectangle,
}

/// Mapped rectangles remembered per box, kept apart from the tree itself.
#[derive(Debug, Default)]
pub struct GridRectCache {
    entries: HashMap<BoxId, CachedRect>,
    hits: u64,
}

impl GridRectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered without searching.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }

    pub fn remove(&mut self, id: BoxId) {
        self.entries.remove(&id);
    }

    /// Forget boxes whose rectangle ends at or before `row`.
    pub fn evict_rows_before(&mut self, row: usize) {
        self.entries.retain(|_, cached| cached.rect.y2 > row);
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
    use crate::types::{BorderEdge, BoxKind, BoxStyle, Rgba};

    const OPEN: Coord = Coord::MAX / 4;

    fn block(x: Coord, y: Coord, w: Coord, h: Coord) -> LayoutBox {
        LayoutBox::new(BoxKind::Block, Bounds::new(x, y, w, h))
    }

    fn add(layout: &mut SheetLayout, b: &LayoutBox) -> bool {
        layout.add_box(b, 0, 0, OPEN)
    }

    fn keys(cuts: &CutList) -> Vec<Coord> {
        cuts.keys().collect()
    }

    #[test]
    fn test_plain_box_trailing_edges_pruned() {
        let mut layout = SheetLayout::new(TableConfig::default());
        add(&mut layout, &block(0, 0, 100, 50));
        add(&mut layout, &block(0, 0, 40, 20));
        layout.page_completed();

        // The inner box's right/bottom edges never became real
        assert_eq!(keys(layout.x_cuts()), vec![0, 100]);
        assert_eq!(keys(layout.y_cuts()), vec![0, 50]);
        assert_eq!(layout.column_count(), 1);
        assert_eq!(layout.row_count(), 1);
    }

    #[test]
    fn test_marker_keeps_trailing_edges() {
        let mut layout = SheetLayout::new(TableConfig::default());
        add(&mut layout, &block(0, 0, 100, 50));
        let mut inner = block(0, 0, 40, 20);
        inner.style = BoxStyle::default().with_background(Rgba::RED);
        add(&mut layout, &inner);
        layout.page_completed();

        assert_eq!(keys(layout.x_cuts()), vec![0, 40, 100]);
        assert_eq!(keys(layout.y_cuts()), vec![0, 20, 50]);
    }

    #[test]
    fn test_content_keeps_trailing_edges() {
        let mut layout = SheetLayout::new(TableConfig::default());
        add(&mut layout, &block(0, 0, 100, 50));
        add(
            &mut layout,
            &LayoutBox::new(BoxKind::Content, Bounds::new(10, 10, 30, 10)),
        );
        layout.page_completed();
        assert_eq!(keys(layout.x_cuts()), vec![0, 10, 40, 100]);
        assert_eq!(keys(layout.y_cuts()), vec![0, 10, 20, 50]);
    }

    #[test]
    fn test_strict_mode_keeps_everything() {
        let mut layout = SheetLayout::new(TableConfig::default().with_strict_layout(true));
        add(&mut layout, &block(0, 0, 100, 50));
        add(&mut layout, &block(0, 0, 40, 20));
        layout.page_completed();
        assert_eq!(keys(layout.x_cuts()), vec![0, 40, 100]);
        assert_eq!(keys(layout.y_cuts()), vec![0, 20, 50]);
    }

    #[test]
    fn test_invisible_and_bare_lines_ignored() {
        let mut layout = SheetLayout::new(TableConfig::default());
        let mut hidden = block(0, 0, 30, 30);
        hidden.visible = false;
        assert!(add(&mut layout, &hidden));
        assert!(add(&mut layout, &block(5, 5, 0, 0)));
        assert!(add(&mut layout, &block(5, 5, 20, 0)));
        assert_eq!(layout.x_cuts().size(), 1);
        assert_eq!(layout.max_width(), 0);
    }

    #[test]
    fn test_bordered_line_contributes_own_axis_only() {
        let mut layout = SheetLayout::new(TableConfig::default());
        let mut line = block(10, 25, 80, 0);
        line.style = BoxStyle::default().with_border_all(BorderEdge::solid(500, Rgba::BLACK));
        assert!(!add(&mut layout, &line));
        assert_eq!(keys(layout.y_cuts()), vec![0, 25]);
        assert_eq!(keys(layout.x_cuts()), vec![0]);
        // The other axis still widens the page
        assert_eq!(layout.max_width(), 90);
    }

    #[test]
    fn test_anchor_point() {
        let mut layout = SheetLayout::new(TableConfig::default());
        let mut point = block(7, 9, 0, 0);
        point.style = BoxStyle::default().with_anchor("here");
        add(&mut layout, &point);
        assert!(layout.x_cuts().contains(7));
        assert!(layout.y_cuts().contains(9));
    }

    #[test]
    fn test_unchanged_report() {
        let mut layout = SheetLayout::new(TableConfig::default());
        let b = block(0, 0, 100, 50);
        assert!(!add(&mut layout, &b));
        assert!(add(&mut layout, &b));
        let rev = layout.revision();
        assert!(add(&mut layout, &b));
        assert_eq!(layout.revision(), rev);
    }

    #[test]
    fn test_vertical_frame_shift() {
        let mut layout = SheetLayout::new(TableConfig::default());
        // Normal flow at 1000..1200, page starts at 1000, header is 50 tall
        let b = block(0, 1000, 100, 200);
        layout.add_box(&b, 1000, 50, 500);
        assert_eq!(keys(layout.y_cuts()), vec![0, 50, 250]);

        // Overflowing the page is clipped to the section height
        let tall = block(0, 1100, 100, 10_000);
        layout.add_box(&tall, 1000, 50, 500);
        assert_eq!(layout.max_height(), 550);
    }

    #[test]
    fn test_page_completed_idempotent() {
        let mut layout = SheetLayout::new(TableConfig::default());
        add(&mut layout, &block(0, 0, 100, 50));
        add(&mut layout, &block(20, 10, 30, 10));
        layout.page_completed();
        let first = (keys(layout.x_cuts()), keys(layout.y_cuts()));
        let rev = layout.revision();
        layout.page_completed();
        assert_eq!(first, (keys(layout.x_cuts()), keys(layout.y_cuts())));
        assert_eq!(layout.revision(), rev);
    }

    #[test]
    fn test_map_bounds() {
        let mut layout = SheetLayout::new(TableConfig::default().with_strict_layout(true));
        for x in [0, 10, 20, 30] {
            add(&mut layout, &block(x, 0, 10, 10));
        }
        add(&mut layout, &block(0, 10, 40, 10));
        layout.page_completed();

        assert_eq!(layout.map_bounds(0, 0, 40, 20), GridRectangle::new(0, 0, 4, 2));
        assert_eq!(layout.map_bounds(10, 10, 20, 10), GridRectangle::new(1, 1, 3, 2));
        // Between cuts: floor at the start, ceiling at the end
        assert_eq!(layout.map_bounds(15, 2, 10, 3), GridRectangle::new(1, 0, 3, 1));
        // Horizontal line on a boundary
        assert_eq!(layout.map_bounds(0, 10, 40, 0), GridRectangle::new(0, 1, 4, 1));
    }

    #[test]
    fn test_dimensions() {
        let mut layout = SheetLayout::new(TableConfig::default().with_strict_layout(true));
        add(&mut layout, &block(0, 0, 10, 5));
        add(&mut layout, &block(10, 5, 30, 15));
        layout.page_completed();

        assert_eq!(layout.column_count(), 2);
        assert_eq!(layout.row_count(), 2);
        assert_eq!(layout.column_width(1), 30);
        assert_eq!(layout.column_span_width(0, 2), 40);
        assert_eq!(layout.row_height(0), 5);
        assert_eq!(layout.row_span_height(0, 2), 20);
        assert_eq!(layout.row_height(9), 0);
        assert_eq!(layout.cell_bounds(1, 1), Some(Bounds::new(10, 5, 30, 15)));
        assert_eq!(layout.cell_bounds(2, 0), None);
    }

    #[test]
    fn test_derive_keeps_columns() {
        let mut layout = SheetLayout::new(TableConfig::default());
        add(&mut layout, &LayoutBox::new(BoxKind::Content, Bounds::new(0, 0, 50, 20)));
        add(&mut layout, &LayoutBox::new(BoxKind::Content, Bounds::new(50, 0, 50, 20)));
        layout.page_completed();

        let next = layout.derive();
        assert_eq!(keys(next.x_cuts()), vec![0, 50, 100]);
        assert_eq!(keys(next.y_cuts()), vec![0]);
        assert_eq!(next.row_count(), 0);
        assert_eq!(next.max_height(), 0);
        assert_eq!(next.max_width(), 100);
    }

    #[test]
    fn test_cached_mapping() {
        let mut layout = SheetLayout::new(TableConfig::default().with_strict_layout(true));
        add(&mut layout, &block(0, 0, 10, 10));
        layout.page_completed();

        let mut cache = GridRectCache::new();
        let bounds = Bounds::new(0, 0, 10, 10);
        let first = layout.map_bounds_cached(BoxId(3), 1, &bounds, &mut cache);
        let second = layout.map_bounds_cached(BoxId(3), 1, &bounds, &mut cache);
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);

        // A new generation forces a fresh lookup
        let moved = Bounds::new(0, 0, 10, 0);
        let third = layout.map_bounds_cached(BoxId(3), 2, &moved, &mut cache);
        assert_eq!(third, GridRectangle::new(0, 0, 1, 0));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }
}
