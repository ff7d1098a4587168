use serde::{Deserialize, Serialize};
use std::fmt;

/// The part of a page a cell's occupant came from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    /// Placeholder; any real band replaces it.
    #[default]
    Invalid,
    Header,
    NormalFlow,
    RepeatFooter,
    Footer,
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "invalid",
            Self::Header => "header",
            Self::NormalFlow => "normal-flow",
            Self::RepeatFooter => "repeat-footer",
            Self::Footer => "footer",
        };
        f.write_str(name)
    }
}

/// The five page areas, in processing order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PageArea {
    Watermark,
    Header,
    Body,
    RepeatFooter,
    Footer,
}

impl PageArea {
    pub const ALL: [Self; 5] = [
        Self::Watermark,
        Self::Header,
        Self::Body,
        Self::RepeatFooter,
        Self::Footer,
    ];

    /// Section type recorded for markers from this area. Watermark bands
    /// are recorded as `Invalid` so any real band drawn over them wins.
    pub fn section_type(self) -> SectionType {
        match self {
            Self::Watermark => SectionType::Invalid,
            Self::Header => SectionType::Header,
            Self::Body => SectionType::NormalFlow,
            Self::RepeatFooter => SectionType::RepeatFooter,
            Self::Footer => SectionType::Footer,
        }
    }
}
