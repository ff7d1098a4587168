//! Cell backgrounds derived from the boxes that cover a cell.
//!
//! A box contributes to a cell only through the sides it covers exactly:
//! its top border only if its top edge is the cell's top edge, its color
//! only if it contains the whole cell, and so on. Contributions are merged
//! root to leaf, so deeper boxes paint over shallower ones.

use bitflags::bitflags;
use serde::Serialize;
use std::collections::HashMap;

use super::frame::SectionFrame;
use crate::config::TableConfig;
use crate::error::{Result, TableGridError};
use crate::layout::SheetLayout;
use crate::types::{
    AttributeMap, BorderEdge, BoxId, BoxStyle, CornerRadius, GridRectangle, LayoutTree, Rgba,
};

bitflags! {
    /// How a box's grid rectangle relates to a target cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Coverage: u8 {
        /// Contains the whole cell.
        const AREA   = 0b00_0001;
        /// Top edge is the cell's top edge and the box spans its columns.
        const TOP    = 0b00_0010;
        /// Left edge is the cell's left edge and the box spans its rows.
        const LEFT   = 0b00_0100;
        /// Bottom edge is the cell's bottom edge and the box spans its columns.
        const BOTTOM = 0b00_1000;
        /// Right edge is the cell's right edge and the box spans its rows.
        const RIGHT  = 0b01_0000;
        /// Top-left corner is the cell's top-left corner.
        const ORIGIN = 0b10_0000;
    }
}

impl Coverage {
    pub fn compute(boxed: &GridRectangle, cell: &GridRectangle) -> Self {
        let mut coverage = Self::empty();
        let spans_columns = boxed.spans_columns_of(cell);
        let spans_rows = boxed.spans_rows_of(cell);

        if spans_columns && spans_rows && !boxed.is_empty() {
            coverage |= Self::AREA;
        }
        if spans_columns {
            coverage.set(Self::TOP, boxed.y1 == cell.y1);
            coverage.set(Self::BOTTOM, boxed.y2 == cell.y2);
        }
        if spans_rows {
            coverage.set(Self::LEFT, boxed.x1 == cell.x1);
            coverage.set(Self::RIGHT, boxed.x2 == cell.x2);
        }
        coverage.set(Self::ORIGIN, boxed.x1 == cell.x1 && boxed.y1 == cell.y1);
        coverage
    }
}

/// Accumulated appearance of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBackground {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_top_left: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_top_right: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_bottom_left: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_bottom_right: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
}

impl CellBackground {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_border(&self) -> bool {
        self.top.is_some() || self.left.is_some() || self.bottom.is_some() || self.right.is_some()
    }

    /// Paint a color over the accumulated one. Opaque colors replace
    /// everything beneath; translucent ones are composited on top.
    pub fn add_background(&mut self, color: Rgba) {
        if color.is_transparent() {
            return;
        }
        self.color = Some(match self.color {
            Some(base) if !color.is_opaque() => base.over(color),
            _ => color,
        });
    }

    pub fn add_anchor(&mut self, name: &str) {
        if !name.is_empty() && !self.anchors.iter().any(|a| a == name) {
            self.anchors.push(name.to_string());
        }
    }

    /// Merge the parts of `style` that `coverage` allows.
    ///
    /// Lines (rectangles with no rows or no columns) draw the same stroke on
    /// both of their long sides, whichever border edge carries it.
    pub fn merge(&mut self, style: &BoxStyle, coverage: Coverage, rect: &GridRectangle) {
        if coverage.contains(Coverage::AREA) {
            if let Some(color) = style.background {
                self.add_background(color);
            }
            if let Some(element_type) = &style.element_type {
                self.element_type = Some(element_type.clone());
            }
            for (namespace, values) in &style.attributes {
                let target = self.attributes.entry(namespace.clone()).or_default();
                for (name, value) in values {
                    target.insert(name.clone(), value.clone());
                }
            }
        }

        let horizontal_line = rect.y1 == rect.y2;
        let vertical_line = rect.x1 == rect.x2;
        let (top, bottom) = if horizontal_line {
            let stroke = style.border_top.or(style.border_bottom);
            (stroke, stroke)
        } else {
            (style.border_top, style.border_bottom)
        };
        let (left, right) = if vertical_line {
            let stroke = style.border_left.or(style.border_right);
            (stroke, stroke)
        } else {
            (style.border_left, style.border_right)
        };

        overwrite(&mut self.top, top, coverage.contains(Coverage::TOP));
        overwrite(&mut self.bottom, bottom, coverage.contains(Coverage::BOTTOM));
        overwrite(&mut self.left, left, coverage.contains(Coverage::LEFT));
        overwrite(&mut self.right, right, coverage.contains(Coverage::RIGHT));

        let corner = |a: Coverage, b: Coverage| coverage.contains(a | b);
        overwrite(
            &mut self.radius_top_left,
            style.radius_top_left,
            corner(Coverage::TOP, Coverage::LEFT),
        );
        overwrite(
            &mut self.radius_top_right,
            style.radius_top_right,
            corner(Coverage::TOP, Coverage::RIGHT),
        );
        overwrite(
            &mut self.radius_bottom_left,
            style.radius_bottom_left,
            corner(Coverage::BOTTOM, Coverage::LEFT),
        );
        overwrite(
            &mut self.radius_bottom_right,
            style.radius_bottom_right,
            corner(Coverage::BOTTOM, Coverage::RIGHT),
        );

        if coverage.intersects(Coverage::AREA | Coverage::ORIGIN) {
            if let Some(anchor) = &style.anchor {
                self.add_anchor(anchor);
            }
        }
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>, allowed: bool) {
    if allowed {
        if let Some(value) = value {
            *slot = Some(value);
        }
    }
}

#[derive(Debug, Clone)]
struct CachedBackground {
    source: Option<BoxId>,
    generation: u64,
    revision: u64,
    background: Option<CellBackground>,
}

/// Resolves and caches cell backgrounds.
#[derive(Debug)]
pub struct CellBackgroundProducer {
    config: TableConfig,
    cache: HashMap<(usize, usize), CachedBackground>,
    hits: u64,
}

impl CellBackgroundProducer {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            hits: 0,
        }
    }

    /// Lookups answered from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
    }

    /// Cells currently cached.
    pub fn cached_cells(&self) -> usize {
        self.cache.len()
    }

    /// Drop cached cells of rows below `row`.
    pub fn evict_rows_before(&mut self, row: usize) {
        self.cache.retain(|&(cached_row, _), _| cached_row >= row);
    }

    /// Walk every page area from its root and merge all covering boxes.
    /// This is the reference result.
    ///
    /// # Errors
    /// [`TableGridError::InvalidArgument`] if a frame names a missing box.
    pub fn resolve_full(
        &self,
        tree: &LayoutTree,
        frames: &[SectionFrame],
        layout: &SheetLayout,
        cell: &GridRectangle,
    ) -> Result<Option<CellBackground>> {
        let mut background = CellBackground::default();
        for frame in frames {
            let mut stack = vec![frame.root];
            while let Some(id) = stack.pop() {
                let node = tree.node(id)?;
                if !node.visible || !frame.is_in_window(&node.bounds) {
                    continue;
                }
                let bounds = frame.frame_bounds(&node.bounds);
                let rect = layout.map_bounds(bounds.x, bounds.y, bounds.width, bounds.height);
                let coverage = Coverage::compute(&rect, cell);
                if !coverage.is_empty() {
                    background.merge(&node.style, coverage, &rect);
                }
                if !node.kind.is_content(&self.config) {
                    stack.extend(node.children.iter().rev().copied());
                }
            }
        }
        Ok((!background.is_empty()).then_some(background))
    }

    /// Merge only the ancestor chain of `content`, up to its nearest
    /// section box. Falls back to [`Self::resolve_full`] when the chain
    /// contributes nothing.
    ///
    /// # Errors
    /// [`TableGridError::InternalInconsistency`] if `content` does not sit
    /// below any of the page's area roots.
    pub fn resolve_fast(
        &self,
        tree: &LayoutTree,
        frames: &[SectionFrame],
        layout: &SheetLayout,
        cell: &GridRectangle,
        content: BoxId,
    ) -> Result<Option<CellBackground>> {
        let lineage: Vec<BoxId> = std::iter::once(content)
            .chain(tree.ancestors(content))
            .collect();
        let frame = frames
            .iter()
            .find(|f| lineage.contains(&f.root))
            .ok_or_else(|| {
                TableGridError::InternalInconsistency(format!(
                    "{content} is not inside any area of the page"
                ))
            })?;

        let mut chain = Vec::new();
        for &id in &lineage {
            let node = tree.node(id)?;
            chain.push(id);
            if node.is_section() || id == frame.root {
                break;
            }
        }

        let mut background = CellBackground::default();
        for &id in chain.iter().rev() {
            let node = tree.node(id)?;
            if !node.visible {
                continue;
            }
            let bounds = frame.frame_bounds(&node.bounds);
            let rect = layout.map_bounds(bounds.x, bounds.y, bounds.width, bounds.height);
            let coverage = Coverage::compute(&rect, cell);
            if !coverage.is_empty() {
                background.merge(&node.style, coverage, &rect);
            }
        }

        if background.is_empty() {
            return self.resolve_full(tree, frames, layout, cell);
        }
        Ok(Some(background))
    }

    /// Cached lookup for one cell. `source` is the cell's occupant; when it
    /// is a content box the ancestor walk is tried first.
    ///
    /// Entries are keyed by cell and stay valid while the occupant, its
    /// generation and the layout revision are unchanged.
    ///
    /// # Errors
    /// See [`Self::resolve_full`] and [`Self::resolve_fast`].
    pub fn resolve(
        &mut self,
        tree: &LayoutTree,
        frames: &[SectionFrame],
        layout: &SheetLayout,
        row: usize,
        column: usize,
        source: Option<BoxId>,
    ) -> Result<Option<CellBackground>> {
        let generation = match source {
            Some(id) => tree.node(id)?.generation(),
            None => 0,
        };
        if let Some(hit) = self.cache.get(&(row, column)) {
            if hit.source == source
                && hit.generation == generation
                && hit.revision == layout.revision()
            {
                self.hits += 1;
                return Ok(hit.background.clone());
            }
        }

        let cell = GridRectangle::cell(row, column);
        let content = source.filter(|&id| {
            tree.get(id)
                .is_some_and(|b| b.kind.is_content(&self.config))
        });
        let background = match content {
            Some(id) => self.resolve_fast(tree, frames, layout, &cell, id)?,
            None => self.resolve_full(tree, frames, layout, &cell)?,
        };

        self.cache.insert(
            (row, column),
            CachedBackground {
                source,
                generation,
                revision: layout.revision(),
                background: background.clone(),
            },
        );
        Ok(background)
    }
}
