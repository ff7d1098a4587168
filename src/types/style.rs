use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Coord, Rgba};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// One border edge of a box.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub width: Coord,
    #[serde(default)]
    pub style: BorderStyle,
    pub color: Rgba,
}

impl BorderEdge {
    pub const fn solid(width: Coord, color: Rgba) -> Self {
        Self {
            width,
            style: BorderStyle::Solid,
            color,
        }
    }

    /// Draws something.
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.style != BorderStyle::None && !self.color.is_transparent()
    }
}

/// Elliptical corner radius.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CornerRadius {
    pub width: Coord,
    pub height: Coord,
}

impl CornerRadius {
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Namespaced attribute map: namespace -> name -> value.
pub type AttributeMap = BTreeMap<String, BTreeMap<String, String>>;

/// Resolved visual style of a layout box.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgba>,

    // Borders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_left: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<BorderEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_right: Option<BorderEdge>,

    // Corners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_top_left: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_top_right: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_bottom_left: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_bottom_right: Option<CornerRadius>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: AttributeMap,
}

impl BoxStyle {
    pub fn has_background(&self) -> bool {
        self.background.is_some_and(|c| !c.is_transparent())
    }

    pub fn has_border(&self) -> bool {
        [
            &self.border_top,
            &self.border_left,
            &self.border_bottom,
            &self.border_right,
        ]
        .into_iter()
        .flatten()
        .any(BorderEdge::is_visible)
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Something that must survive as a real grid line: a background, a
    /// visible border or an anchor.
    pub fn has_visual_marker(&self) -> bool {
        self.has_background() || self.has_border() || self.has_anchor()
    }

    /// Set the same border on all four sides.
    #[must_use]
    pub fn with_border_all(mut self, edge: BorderEdge) -> Self {
        self.border_top = Some(edge);
        self.border_left = Some(edge);
        self.border_bottom = Some(edge);
        self.border_right = Some(edge);
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background = Some(color);
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, name: impl Into<String>) -> Self {
        self.anchor = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .entry(namespace.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }
}
