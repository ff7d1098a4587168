use crate::types::{BoxId, Coord, LayoutTree, SectionType};

/// The single occupant of a grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellMarker {
    /// A background-only box. Always finished and committed.
    Band {
        source: BoxId,
        section: SectionType,
        /// Nesting depth below the area root; deeper bands are more specific.
        depth: usize,
    },
    /// A content-bearing box. Finalization mirrors the box's own flags.
    Content {
        source: BoxId,
        /// Shift that moves the box's area-local `y` into the shared frame.
        offset: Coord,
        section: SectionType,
    },
    /// What remains after a finished row has been evicted.
    Retired { label: String },
}

impl CellMarker {
    pub fn is_finished(&self, tree: &LayoutTree) -> bool {
        match self {
            Self::Band { .. } | Self::Retired { .. } => true,
            Self::Content { source, .. } => tree.get(*source).is_some_and(|b| b.finished),
        }
    }

    pub fn is_committed(&self, tree: &LayoutTree) -> bool {
        match self {
            Self::Band { .. } | Self::Retired { .. } => true,
            Self::Content { source, .. } => tree.get(*source).is_some_and(|b| b.committed),
        }
    }

    /// The content box, if this is a content marker.
    pub fn content(&self) -> Option<BoxId> {
        match self {
            Self::Content { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn section_type(&self) -> SectionType {
        match self {
            Self::Band { section, .. } | Self::Content { section, .. } => *section,
            Self::Retired { .. } => SectionType::Invalid,
        }
    }

    /// Short text for diagnostics and for the placeholder left behind when
    /// the row is retired.
    pub fn describe(&self, tree: &LayoutTree) -> String {
        match self {
            Self::Band {
                source,
                section,
                depth,
            } => format!("band {source} ({section}, depth {depth})"),
            Self::Content {
                source, section, ..
            } => match tree.get(*source).and_then(|b| b.label.as_deref()) {
                Some(label) => format!("content {source} ({section}) {label:?}"),
                None => format!("content {source} ({section})"),
            },
            Self::Retired { label } => label.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{Bounds, BoxKind, LayoutBox};

    #[test]
    fn test_content_mirrors_box_flags() {
        let mut tree = LayoutTree::new();
        let mut text = LayoutBox::new(BoxKind::Content, Bounds::new(0, 0, 10, 10));
        text.label = Some("Total".to_string());
        let id = tree.add_root(text);
        let marker = CellMarker::Content {
            source: id,
            offset: 0,
            section: SectionType::NormalFlow,
        };
        assert!(!marker.is_committed(&tree));
        assert!(!marker.is_finished(&tree));

        tree.commit(id).unwrap();
        assert!(marker.is_committed(&tree));
        assert!(!marker.is_finished(&tree));

        tree.finish(id).unwrap();
        assert!(marker.is_finished(&tree));
        assert_eq!(marker.content(), Some(id));
        assert_eq!(
            marker.describe(&tree),
            "content box#0 (normal-flow) \"Total\""
        );
    }

    #[test]
    fn test_band_and_retired_always_final() {
        let tree = LayoutTree::new();
        let band = CellMarker::Band {
            source: BoxId(4),
            section: SectionType::Header,
            depth: 2,
        };
        assert!(band.is_finished(&tree));
        assert!(band.is_committed(&tree));
        assert_eq!(band.content(), None);
        assert_eq!(band.section_type(), SectionType::Header);
        assert_eq!(band.describe(&tree), "band box#4 (header, depth 2)");

        let retired = CellMarker::Retired {
            label: "gone".to_string(),
        };
        assert!(retired.is_finished(&tree));
        assert_eq!(retired.section_type(), SectionType::Invalid);
    }
}
