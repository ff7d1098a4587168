//! Minimal model of the positioned layout tree the grid is built from.
//!
//! Boxes live in an arena and are addressed by [`BoxId`]. Every mutation
//! bumps the box's change generation, which is what the grid-side caches
//! key on.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Bounds, BoxStyle, Coord, PageArea};
use crate::config::TableConfig;
use crate::error::{missing_box, Result, TableGridError};

/// Stable identity of a box in a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(pub usize);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box#{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    /// Root of a page area (band).
    Section,
    Block,
    Inline,
    /// Leaf or replaced content: text, images, fields.
    Content,
    /// Drawable shape.
    Shape(ShapeKind),
}

impl BoxKind {
    /// Whether boxes of this kind occupy a cell as content.
    ///
    /// Rectangle and line shapes are drawn as cell background and borders;
    /// ellipses only when the legacy translation is enabled.
    pub fn is_content(self, config: &TableConfig) -> bool {
        match self {
            Self::Content => true,
            Self::Shape(ShapeKind::Ellipse) => !config.treat_ellipse_as_rectangle,
            Self::Shape(ShapeKind::Rectangle | ShapeKind::Line) => false,
            Self::Section | Self::Block | Self::Inline => false,
        }
    }
}

fn visible_default() -> bool {
    true
}

/// One positioned box.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBox {
    pub kind: BoxKind,
    pub bounds: Bounds,
    #[serde(default)]
    pub style: BoxStyle,
    #[serde(default = "visible_default")]
    pub visible: bool,
    /// Geometry is final and will not change.
    #[serde(default)]
    pub committed: bool,
    /// Box and all of its descendants are final.
    #[serde(default)]
    pub finished: bool,
    /// Human readable content or debug name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub children: Vec<BoxId>,
    #[serde(skip)]
    parent: Option<BoxId>,
    #[serde(skip)]
    generation: u64,
}

impl LayoutBox {
    pub fn new(kind: BoxKind, bounds: Bounds) -> Self {
        Self {
            kind,
            bounds,
            style: BoxStyle::default(),
            visible: true,
            committed: false,
            finished: false,
            label: None,
            children: Vec::new(),
            parent: None,
            generation: 0,
        }
    }

    pub fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    /// Monotonic change counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_section(&self) -> bool {
        self.kind == BoxKind::Section
    }
}

/// Arena of layout boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutTree {
    boxes: Vec<LayoutBox>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a tree whose boxes name their children; parent links are rebuilt.
    ///
    /// # Errors
    /// Fails on malformed JSON, on child ids that do not exist, on boxes
    /// with more than one parent and on parent cycles.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut tree: Self = serde_json::from_str(json)?;
        tree.link_parents()?;
        Ok(tree)
    }

    pub(crate) fn link_parents(&mut self) -> Result<()> {
        let len = self.boxes.len();
        let mut links = Vec::new();
        for (index, layout_box) in self.boxes.iter().enumerate() {
            for &child in &layout_box.children {
                if child.0 >= len || child.0 == index {
                    return Err(TableGridError::InvalidArgument(format!(
                        "{} lists invalid child {child}",
                        BoxId(index)
                    )));
                }
                links.push((child, BoxId(index)));
            }
        }
        for (child, parent) in links {
            let node = self.node_mut(child)?;
            if let Some(existing) = node.parent {
                return Err(TableGridError::InternalInconsistency(format!(
                    "{child} has two parents: {existing} and {parent}"
                )));
            }
            node.parent = Some(parent);
        }
        self.check_acyclic()
    }

    /// Every box has at most one parent here, so a cycle shows up as a
    /// parent chain that returns to a box on the current walk.
    fn check_acyclic(&self) -> Result<()> {
        const UNSEEN: u8 = 0;
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNSEEN; self.boxes.len()];
        for start in 0..self.boxes.len() {
            let mut path = Vec::new();
            let mut current = Some(BoxId(start));
            while let Some(id) = current {
                match state.get(id.0).copied() {
                    Some(UNSEEN) => {
                        if let Some(slot) = state.get_mut(id.0) {
                            *slot = ON_PATH;
                        }
                        path.push(id);
                        current = self.parent(id);
                    }
                    Some(ON_PATH) => {
                        return Err(TableGridError::InternalInconsistency(format!(
                            "{id} is its own ancestor"
                        )));
                    }
                    _ => break,
                }
            }
            for id in path {
                if let Some(slot) = state.get_mut(id.0) {
                    *slot = DONE;
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Add a parentless box.
    pub fn add_root(&mut self, layout_box: LayoutBox) -> BoxId {
        let id = BoxId(self.boxes.len());
        let mut layout_box = layout_box;
        layout_box.parent = None;
        layout_box.children.clear();
        self.boxes.push(layout_box);
        id
    }

    /// Append a box as the last child of `parent`.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `parent` does not exist.
    pub fn add_child(&mut self, parent: BoxId, layout_box: LayoutBox) -> Result<BoxId> {
        let id = BoxId(self.boxes.len());
        let parent_box = self.node_mut(parent)?;
        parent_box.children.push(id);
        parent_box.generation += 1;
        let mut layout_box = layout_box;
        layout_box.parent = Some(parent);
        layout_box.children.clear();
        self.boxes.push(layout_box);
        Ok(id)
    }

    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    /// Like [`Self::get`] but reports a missing box as an error.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn node(&self, id: BoxId) -> Result<&LayoutBox> {
        self.get(id).ok_or_else(|| missing_box(id))
    }

    fn node_mut(&mut self, id: BoxId) -> Result<&mut LayoutBox> {
        self.boxes.get_mut(id.0).ok_or_else(|| missing_box(id))
    }

    /// Apply a change to a box and bump its generation.
    fn modify(&mut self, id: BoxId, change: impl FnOnce(&mut LayoutBox)) -> Result<()> {
        let node = self.node_mut(id)?;
        change(node);
        node.generation += 1;
        Ok(())
    }

    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map_or(&[], |b| b.children.as_slice())
    }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(LayoutBox::parent)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Distance from the tree root.
    pub fn depth(&self, id: BoxId) -> usize {
        self.ancestors(id).count()
    }

    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn set_bounds(&mut self, id: BoxId, bounds: Bounds) -> Result<()> {
        self.modify(id, |b| b.bounds = bounds)
    }

    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn set_style(&mut self, id: BoxId, style: BoxStyle) -> Result<()> {
        self.modify(id, |b| b.style = style)
    }

    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn set_visible(&mut self, id: BoxId, visible: bool) -> Result<()> {
        self.modify(id, |b| b.visible = visible)
    }

    /// Mark a box's geometry as final.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn commit(&mut self, id: BoxId) -> Result<()> {
        self.modify(id, |b| b.committed = true)
    }

    /// Mark a box as committed and finished.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn finish(&mut self, id: BoxId) -> Result<()> {
        self.modify(id, |b| {
            b.committed = true;
            b.finished = true;
        })
    }

    /// Finish `id` and every box below it.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if `id` does not exist.
    pub fn finish_subtree(&mut self, id: BoxId) -> Result<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.finish(current)?;
            stack.extend(self.children(current).iter().rev().copied());
        }
        Ok(())
    }
}

/// One page's view of the tree: the root box of each page area plus the
/// slice of the normal flow that lands on this page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalPage {
    #[serde(default)]
    pub watermark: Option<BoxId>,
    #[serde(default)]
    pub header: Option<BoxId>,
    pub body: BoxId,
    #[serde(default)]
    pub repeat_footer: Option<BoxId>,
    #[serde(default)]
    pub footer: Option<BoxId>,
    /// First normal-flow coordinate shown on this page.
    pub page_offset: Coord,
    /// Normal-flow coordinate where this page ends.
    pub page_end: Coord,
}

impl LogicalPage {
    pub fn new(body: BoxId, page_offset: Coord, page_end: Coord) -> Self {
        Self {
            watermark: None,
            header: None,
            body,
            repeat_footer: None,
            footer: None,
            page_offset,
            page_end,
        }
    }

    pub fn area_root(&self, area: PageArea) -> Option<BoxId> {
        match area {
            PageArea::Watermark => self.watermark,
            PageArea::Header => self.header,
            PageArea::Body => Some(self.body),
            PageArea::RepeatFooter => self.repeat_footer,
            PageArea::Footer => self.footer,
        }
    }

    /// Normal-flow height available on this page.
    pub fn body_height(&self) -> Coord {
        (self.page_end - self.page_offset).max(0)
    }

    /// Check that every named area root exists and is a tree root.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] for a missing or nested root.
    pub fn validate(&self, tree: &LayoutTree) -> Result<()> {
        for area in PageArea::ALL {
            if let Some(root) = self.area_root(area) {
                if let Some(parent) = tree.node(root)?.parent() {
                    return Err(TableGridError::InvalidArgument(format!(
                        "{area:?} root {root} is nested under {parent}"
                    )));
                }
            }
        }
        if self.page_end < self.page_offset {
            return Err(TableGridError::InvalidArgument(format!(
                "page ends at {} before it starts at {}",
                self.page_end, self.page_offset
            )));
        }
        Ok(())
    }
}

/// A tree, one of its pages and the options to export it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub config: TableConfig,
    pub tree: LayoutTree,
    pub page: LogicalPage,
}

impl PageDocument {
    /// # Errors
    /// Fails on malformed JSON or an inconsistent tree/page.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut document: Self = serde_json::from_str(json)?;
        document.tree.link_parents()?;
        document.page.validate(&document.tree)?;
        Ok(document)
    }
}
