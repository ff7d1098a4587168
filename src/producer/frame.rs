//! Vertical placement of each page area in the page's shared frame.

use crate::config::TableConfig;
use crate::error::Result;
use crate::types::{
    shift_into_frame, Bounds, BoxId, Coord, LayoutTree, LogicalPage, PageArea, SectionType,
};

/// Where one page area lands in the shared frame, and which part of it is
/// visible on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionFrame {
    pub area: PageArea,
    pub root: BoxId,
    /// Area-local coordinate that lands at `header_size`.
    pub offset: Coord,
    /// Shared-frame coordinate where this area starts.
    pub header_size: Coord,
    /// Height of the visible part of the area.
    pub max_height: Coord,
}

impl SectionFrame {
    pub fn section_type(&self) -> SectionType {
        self.area.section_type()
    }

    /// Amount added to an area-local `y` to reach the shared frame.
    pub fn shift(&self) -> Coord {
        self.header_size - self.offset
    }

    pub fn map_y(&self, y: Coord) -> Coord {
        shift_into_frame(y, self.offset, self.header_size, self.max_height)
    }

    /// Bounds in the shared frame, clipped to the visible part of the area.
    pub fn frame_bounds(&self, bounds: &Bounds) -> Bounds {
        let top = self.map_y(bounds.y);
        let bottom = self.map_y(bounds.bottom());
        Bounds::new(bounds.x, top, bounds.width, bottom - top)
    }

    /// Whether a box intersects the open interval `(0, max_height)` of
    /// this area. Boxes outside are skipped together with their subtrees.
    pub fn is_in_window(&self, bounds: &Bounds) -> bool {
        let top = bounds.y - self.offset;
        if bounds.height > 0 {
            top + bounds.height > 0 && top < self.max_height
        } else {
            top >= 0 && top < self.max_height
        }
    }
}

/// Compute the frames of every present page area, in processing order
/// (watermark, header, body, repeat-footer, footer).
///
/// With aligned bands the body keeps its full page height so footers sit
/// at the same place on every page. With unaligned bands the body only
/// takes the height its content actually uses on this page, and each area
/// starts right where the previous one ended.
///
/// # Errors
/// [`crate::TableGridError::InvalidArgument`] if an area root is missing.
pub fn page_frames(
    tree: &LayoutTree,
    page: &LogicalPage,
    config: &TableConfig,
) -> Result<Vec<SectionFrame>> {
    let mut frames = Vec::with_capacity(PageArea::ALL.len());
    let mut cursor: Coord = 0;

    for area in PageArea::ALL {
        let Some(root) = page.area_root(area) else {
            continue;
        };
        let root_box = tree.node(root)?;

        let (offset, height) = match area {
            PageArea::Body => {
                let height = if config.unaligned_page_bands {
                    used_body_height(tree, page, root)?
                } else {
                    page.body_height()
                };
                (page.page_offset, height)
            }
            _ => (root_box.bounds.y, root_box.bounds.height.max(0)),
        };

        // The watermark overlays the page instead of taking space in it
        let header_size = if area == PageArea::Watermark { 0 } else { cursor };
        frames.push(SectionFrame {
            area,
            root,
            offset,
            header_size,
            max_height: height,
        });
        if area != PageArea::Watermark {
            cursor += height;
        }
    }
    Ok(frames)
}

/// Height of the normal-flow content that falls on this page.
fn used_body_height(tree: &LayoutTree, page: &LogicalPage, body: BoxId) -> Result<Coord> {
    let mut used = 0;
    for &child in tree.children(body) {
        let bounds = tree.node(child)?.bounds;
        if bounds.bottom() <= page.page_offset || bounds.y >= page.page_end {
            continue;
        }
        used = used.max(bounds.bottom().min(page.page_end) - page.page_offset);
    }
    Ok(used)
}
