//! First pass: collect grid boundaries from a page's boxes.

use std::collections::HashMap;

use super::frame::{page_frames, SectionFrame};
use crate::config::TableConfig;
use crate::error::Result;
use crate::layout::SheetLayout;
use crate::types::{BoxId, LayoutTree, LogicalPage};

/// Feeds every visible box of a page into a [`SheetLayout`].
///
/// Can be called repeatedly for the same page while it is still being laid
/// out (iterative passes); committed boxes that have not changed since
/// they were last contributed are skipped.
#[derive(Debug)]
pub struct TableLayoutProducer {
    layout: SheetLayout,
    config: TableConfig,
    /// Committed boxes already contributed, with the generation and frame
    /// they were contributed with.
    seen: HashMap<BoxId, (u64, SectionFrame)>,
    page_index: usize,
}

impl TableLayoutProducer {
    pub fn new(config: TableConfig) -> Self {
        Self {
            layout: SheetLayout::new(config),
            config,
            seen: HashMap::new(),
            page_index: 0,
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn into_layout(self) -> SheetLayout {
        self.layout
    }

    /// Zero-based index of the page being built.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Contribute the page's boxes, area by area. The final pass
    /// (`is_iterative_pass == false`) also completes the page.
    ///
    /// Returns true if the grid changed.
    ///
    /// # Errors
    /// [`crate::TableGridError::InvalidArgument`] if the page names a box
    /// the tree does not have.
    pub fn update(
        &mut self,
        tree: &LayoutTree,
        page: &LogicalPage,
        is_iterative_pass: bool,
    ) -> Result<bool> {
        page.validate(tree)?;
        let frames = page_frames(tree, page, &self.config)?;
        let revision = self.layout.revision();

        for frame in &frames {
            self.process_section(tree, frame)?;
        }
        if !is_iterative_pass {
            self.layout.page_completed();
        }

        let changed = self.layout.revision() != revision;
        log::trace!(
            "page {} pass (iterative: {is_iterative_pass}) changed: {changed}",
            self.page_index
        );
        Ok(changed)
    }

    fn process_section(&mut self, tree: &LayoutTree, frame: &SectionFrame) -> Result<()> {
        let mut stack = vec![frame.root];
        while let Some(id) = stack.pop() {
            let node = tree.node(id)?;
            if !node.visible || !frame.is_in_window(&node.bounds) {
                continue;
            }

            let current = (node.generation(), *frame);
            let already_seen = self.seen.get(&id) == Some(&current);
            if !already_seen {
                self.layout
                    .add_box(node, frame.offset, frame.header_size, frame.max_height);
                if node.committed {
                    self.seen.insert(id, current);
                }
            }

            // A finished box contributed at this generation already had its
            // whole subtree contributed
            if already_seen && node.finished {
                continue;
            }
            if !node.kind.is_content(&self.config) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(())
    }

    /// Move on to the next page: columns are kept, rows start over.
    pub fn next_page(&mut self) {
        self.layout = self.layout.derive();
        self.seen.clear();
        self.page_index += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Bounds, BoxKind, Coord, LayoutBox};

    fn keys(layout: &SheetLayout) -> (Vec<Coord>, Vec<Coord>) {
        (layout.x_cuts().keys().collect(), layout.y_cuts().keys().collect())
    }

    fn content(x: Coord, y: Coord, w: Coord, h: Coord) -> LayoutBox {
        LayoutBox::new(BoxKind::Content, Bounds::new(x, y, w, h))
    }

    #[test]
    fn test_sections_share_one_frame() {
        let mut tree = LayoutTree::new();
        let header = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 10)));
        tree.add_child(header, content(0, 0, 100, 10)).unwrap();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 1000)));
        tree.add_child(body, content(0, 200, 50, 20)).unwrap();
        // On the next page
        tree.add_child(body, content(0, 300, 50, 20)).unwrap();
        let mut page = LogicalPage::new(body, 200, 300);
        page.header = Some(header);

        let mut producer = TableLayoutProducer::new(TableConfig::default());
        assert!(producer.update(&tree, &page, false).unwrap());
        let (x, y) = keys(producer.layout());
        assert_eq!(x, vec![0, 50, 100]);
        // Header 0..10, body content 10..30, page end at 110
        assert_eq!(y, vec![0, 10, 30, 110]);
    }

    #[test]
    fn test_content_children_not_visited() {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 100)));
        let text = tree.add_child(body, content(0, 0, 100, 50)).unwrap();
        let mut inner = content(10, 10, 20, 20);
        inner.style.background = Some(crate::types::Rgba::RED);
        tree.add_child(text, inner).unwrap();

        let mut producer = TableLayoutProducer::new(TableConfig::default());
        producer
            .update(&tree, &LogicalPage::new(body, 0, 100), false)
            .unwrap();
        assert!(!producer.layout().x_cuts().contains(10));
        assert_eq!(producer.layout().row_count(), 2);
    }

    #[test]
    fn test_iterative_passes_skip_unchanged() {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 100)));
        let text = tree.add_child(body, content(0, 0, 40, 20)).unwrap();
        tree.commit(body).unwrap();
        tree.commit(text).unwrap();
        let page = LogicalPage::new(body, 0, 100);

        let mut producer = TableLayoutProducer::new(TableConfig::default());
        assert!(producer.update(&tree, &page, true).unwrap());
        assert!(!producer.update(&tree, &page, true).unwrap());

        // A changed box is contributed again
        tree.set_bounds(text, Bounds::new(0, 0, 60, 20)).unwrap();
        assert!(producer.update(&tree, &page, true).unwrap());
        assert!(producer.layout().x_cuts().contains(60));

        producer.update(&tree, &page, false).unwrap();
        assert_eq!(producer.layout().column_count(), 3);
    }

    #[test]
    fn test_next_page_keeps_columns() {
        let mut tree = LayoutTree::new();
        let body = tree.add_root(LayoutBox::new(BoxKind::Section, Bounds::new(0, 0, 100, 200)));
        tree.add_child(body, content(0, 0, 30, 50)).unwrap();
        tree.add_child(body, content(30, 100, 70, 50)).unwrap();

        let mut producer = TableLayoutProducer::new(TableConfig::default());
        producer
            .update(&tree, &LogicalPage::new(body, 0, 100), false)
            .unwrap();
        assert_eq!(keys(producer.layout()).1, vec![0, 50, 100]);

        producer.next_page();
        assert_eq!(producer.page_index(), 1);
        assert_eq!(producer.layout().row_count(), 0);
        producer
            .update(&tree, &LogicalPage::new(body, 100, 200), false)
            .unwrap();
        let (x, y) = keys(producer.layout());
        assert_eq!(x, vec![0, 30, 100]);
        assert_eq!(y, vec![0, 50, 100]);
    }
}
