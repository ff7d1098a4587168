//! Options that change how boxes become grid lines and how conflicts are handled.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of retired rows kept as queryable placeholders in verbose mode.
pub const DEFAULT_VERBOSE_ROW_THRESHOLD: usize = 500;

/// Table export configuration.
///
/// Constructed once and handed by value to each producer; nothing reads
/// configuration from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    /// Treat every box edge as a real cut. Produces a denser, exact grid.
    pub strict_layout: bool,
    /// Translate ellipse shapes into background/border like rectangles.
    pub treat_ellipse_as_rectangle: bool,
    /// Stack page bands in independent frames instead of a shared one.
    pub unaligned_page_bands: bool,
    /// Keep `Retired` placeholders instead of dropping retired rows.
    pub verbose_cell_markers: bool,
    /// Upper bound on rows kept as placeholders when verbose.
    pub verbose_row_threshold: usize,
    /// Log every cell conflict.
    pub report_cell_conflicts: bool,
    /// Escalate cell conflicts to a hard error.
    pub fail_on_cell_conflicts: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            strict_layout: false,
            treat_ellipse_as_rectangle: false,
            unaligned_page_bands: false,
            verbose_cell_markers: false,
            verbose_row_threshold: DEFAULT_VERBOSE_ROW_THRESHOLD,
            report_cell_conflicts: true,
            fail_on_cell_conflicts: false,
        }
    }
}

impl TableConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns [`crate::TableGridError::Json`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_strict_layout(mut self, value: bool) -> Self {
        self.strict_layout = value;
        self
    }

    #[must_use]
    pub fn with_treat_ellipse_as_rectangle(mut self, value: bool) -> Self {
        self.treat_ellipse_as_rectangle = value;
        self
    }

    #[must_use]
    pub fn with_unaligned_page_bands(mut self, value: bool) -> Self {
        self.unaligned_page_bands = value;
        self
    }

    /// Enable verbose placeholders, keeping at most `threshold` retired rows.
    #[must_use]
    pub fn with_verbose_cell_markers(mut self, value: bool, threshold: usize) -> Self {
        self.verbose_cell_markers = value;
        self.verbose_row_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_report_cell_conflicts(mut self, value: bool) -> Self {
        self.report_cell_conflicts = value;
        self
    }

    #[must_use]
    pub fn with_fail_on_cell_conflicts(mut self, value: bool) -> Self {
        self.fail_on_cell_conflicts = value;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert!(!config.strict_layout);
        assert!(config.report_cell_conflicts);
        assert!(!config.fail_on_cell_conflicts);
        assert_eq!(config.verbose_row_threshold, DEFAULT_VERBOSE_ROW_THRESHOLD);
    }

    #[test]
    fn test_from_json_partial() {
        let config = TableConfig::from_json(r#"{"strictLayout": true, "verboseRowThreshold": 10}"#)
            .unwrap();
        assert!(config.strict_layout);
        assert_eq!(config.verbose_row_threshold, 10);
        // Untouched keys keep their defaults
        assert!(config.report_cell_conflicts);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = TableConfig::from_json("{strict").unwrap_err();
        assert!(matches!(err, crate::TableGridError::Json(_)));
    }

    #[test]
    fn test_builder() {
        let config = TableConfig::default()
            .with_fail_on_cell_conflicts(true)
            .with_verbose_cell_markers(true, 3);
        assert!(config.fail_on_cell_conflicts);
        assert!(config.verbose_cell_markers);
        assert_eq!(config.verbose_row_threshold, 3);
    }
}
