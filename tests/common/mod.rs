//! Common test utilities: an in-memory page builder and pass drivers.
//!
//! Coordinates are given in points and converted to internal units, so a
//! box at `(0.0, 12.0)` is 12pt down the page.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use tablegrid::{
    from_points, Bounds, BoxId, BoxKind, BoxStyle, LayoutBox, LayoutTree, LogicalPage,
    TableConfig, TableContentProducer, TableLayoutProducer,
};

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn pt(x: f64, y: f64, w: f64, h: f64) -> Bounds {
    Bounds::new(from_points(x), from_points(y), from_points(w), from_points(h))
}

// ============================================================================
// Page Builder
// ============================================================================

/// Builder for a tree with one body section and optional page bands.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    tree: LayoutTree,
    page: LogicalPage,
}

impl PageBuilder {
    /// Body section of the given size in points; one page shows all of it.
    pub fn new(width: f64, height: f64) -> Self {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(
            BoxKind::Section,
            pt(0.0, 0.0, width, height),
        ));
        let page = LogicalPage::new(body, 0, from_points(height));
        Self { tree, page }
    }

    pub fn body(&self) -> BoxId {
        self.page.body
    }

    /// Show only `start..end` (points) of the body on this page.
    pub fn window(mut self, start: f64, end: f64) -> Self {
        self.page.page_offset = from_points(start);
        self.page.page_end = from_points(end);
        self
    }

    pub fn header(&mut self, width: f64, height: f64) -> BoxId {
        let id = self.section(width, height);
        self.page.header = Some(id);
        id
    }

    pub fn footer(&mut self, width: f64, height: f64) -> BoxId {
        let id = self.section(width, height);
        self.page.footer = Some(id);
        id
    }

    pub fn repeat_footer(&mut self, width: f64, height: f64) -> BoxId {
        let id = self.section(width, height);
        self.page.repeat_footer = Some(id);
        id
    }

    pub fn watermark(&mut self, width: f64, height: f64) -> BoxId {
        let id = self.section(width, height);
        self.page.watermark = Some(id);
        id
    }

    fn section(&mut self, width: f64, height: f64) -> BoxId {
        self.tree.add_root(LayoutBox::new(
            BoxKind::Section,
            pt(0.0, 0.0, width, height),
        ))
    }

    pub fn add(&mut self, parent: BoxId, kind: BoxKind, bounds: Bounds, style: BoxStyle) -> BoxId {
        let mut layout_box = LayoutBox::new(kind, bounds);
        layout_box.style = style;
        self.tree.add_child(parent, layout_box).expect("parent exists")
    }

    pub fn block(&mut self, parent: BoxId, x: f64, y: f64, w: f64, h: f64) -> BoxId {
        self.add(parent, BoxKind::Block, pt(x, y, w, h), BoxStyle::default())
    }

    pub fn styled_block(
        &mut self,
        parent: BoxId,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        style: BoxStyle,
    ) -> BoxId {
        self.add(parent, BoxKind::Block, pt(x, y, w, h), style)
    }

    pub fn text(&mut self, parent: BoxId, x: f64, y: f64, w: f64, h: f64, label: &str) -> BoxId {
        let mut layout_box = LayoutBox::new(BoxKind::Content, pt(x, y, w, h));
        layout_box.label = Some(label.to_string());
        self.tree.add_child(parent, layout_box).expect("parent exists")
    }

    /// Finish every box in every area.
    pub fn finish_all(&mut self) {
        let roots = [
            self.page.watermark,
            self.page.header,
            Some(self.page.body),
            self.page.repeat_footer,
            self.page.footer,
        ];
        for root in roots.into_iter().flatten() {
            self.tree.finish_subtree(root).expect("root exists");
        }
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn page(&self) -> &LogicalPage {
        &self.page
    }

    pub fn build(self) -> (LayoutTree, LogicalPage) {
        (self.tree, self.page)
    }
}

// ============================================================================
// Pass Drivers
// ============================================================================

/// Run the final layout pass and the final content pass.
pub fn run_passes(
    tree: &LayoutTree,
    page: &LogicalPage,
    config: TableConfig,
) -> TableContentProducer {
    let mut layout = TableLayoutProducer::new(config);
    layout.update(tree, page, false).expect("layout pass");
    let mut content = TableContentProducer::new(layout.into_layout(), config);
    content.compute(tree, page, false).expect("content pass");
    content
}
