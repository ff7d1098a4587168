//! JSON page document tests for tablegrid
//!
//! Tests for loading a page document, rejecting malformed trees, and the
//! snapshot the CLI prints.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::run_passes;
use tablegrid::{BoxId, GridSnapshot, PageDocument, Rgba, SectionType, TableGridError};

const INVOICE: &str = r##"{
  "config": { "strictLayout": false, "reportCellConflicts": true },
  "tree": {
    "boxes": [
      { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 200000, "height": 60000 },
        "committed": true, "finished": true, "children": [1] },
      { "kind": "block", "bounds": { "x": 0, "y": 0, "width": 200000, "height": 40000 },
        "style": { "background": "#EEEEEE", "anchor": "items" },
        "committed": true, "finished": true, "children": [2, 3, 4, 5] },
      { "kind": "content", "bounds": { "x": 0, "y": 0, "width": 120000, "height": 20000 },
        "label": "Widget", "committed": true, "finished": true },
      { "kind": "content", "bounds": { "x": 120000, "y": 0, "width": 80000, "height": 20000 },
        "label": "4.00", "committed": true, "finished": true },
      { "kind": "content", "bounds": { "x": 0, "y": 20000, "width": 120000, "height": 20000 },
        "label": "Gadget", "committed": true, "finished": true },
      { "kind": "content", "bounds": { "x": 120000, "y": 20000, "width": 80000, "height": 20000 },
        "label": "6.50", "committed": true, "finished": true }
    ]
  },
  "page": { "body": 0, "pageOffset": 0, "pageEnd": 60000 }
}"##;

#[test]
fn test_load_and_snapshot() {
    common::init_logging();
    let doc = PageDocument::from_json(INVOICE).unwrap();
    assert_eq!(doc.tree.len(), 6);
    assert_eq!(doc.tree.parent(BoxId(3)), Some(BoxId(1)));
    assert!(doc.config.report_cell_conflicts);

    let mut content = run_passes(&doc.tree, &doc.page, doc.config);
    let snapshot = GridSnapshot::capture(&mut content, &doc.tree).unwrap();

    assert_eq!(snapshot.column_widths, vec![120_000, 80_000]);
    assert_eq!(snapshot.row_heights, vec![20_000, 20_000, 20_000]);
    assert_eq!(snapshot.max_height, 60_000);

    let price = snapshot.cell(1, 1).unwrap();
    assert_eq!(price.label.as_deref(), Some("6.50"));
    assert!(price.origin);
    assert_eq!(price.section, SectionType::NormalFlow);
    let background = price.background.as_ref().unwrap();
    assert_eq!(background.color, Rgba::from_hex("EEEEEE"));
    assert_eq!(background.anchors, vec!["items".to_string()]);

    // Unused body below the items is a band cell with no appearance
    let empty = snapshot.cell(2, 0).unwrap();
    assert_eq!(empty.content, None);
    assert_eq!(empty.band, Some(BoxId(0)));
    assert!(empty.background.is_none());

    let json = snapshot.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["cells"][0]["label"], "Widget");
    assert_eq!(value["cells"][0]["background"]["color"], "#EEEEEE");
}

#[test]
fn test_retired_rows_leave_snapshot() {
    let doc = PageDocument::from_json(INVOICE).unwrap();
    let mut content = run_passes(&doc.tree, &doc.page, doc.config);
    assert_eq!(content.clear_finished_boxes(&doc.tree), 2);

    let snapshot = GridSnapshot::capture(&mut content, &doc.tree).unwrap();
    assert_eq!(snapshot.finished_rows, 2);
    assert!(snapshot.cells.iter().all(|c| c.row == 2));
}

#[test]
fn test_unknown_child_rejected() {
    let json = r#"{
      "tree": { "boxes": [
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 10 },
          "children": [7] }
      ] },
      "page": { "body": 0, "pageOffset": 0, "pageEnd": 10 }
    }"#;
    match PageDocument::from_json(json) {
        Err(TableGridError::InvalidArgument(message)) => assert!(message.contains("box#7")),
        other => panic!("expected an invalid argument, got {other:?}"),
    }
}

#[test]
fn test_shared_child_rejected() {
    let json = r#"{
      "tree": { "boxes": [
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 10 },
          "children": [1, 2] },
        { "kind": "block", "bounds": { "x": 0, "y": 0, "width": 10, "height": 5 },
          "children": [2] },
        { "kind": "content", "bounds": { "x": 0, "y": 0, "width": 10, "height": 5 } }
      ] },
      "page": { "body": 0, "pageOffset": 0, "pageEnd": 10 }
    }"#;
    let err = PageDocument::from_json(json).unwrap_err();
    assert!(matches!(err, TableGridError::InternalInconsistency(_)));
}

#[test]
fn test_parent_cycle_rejected() {
    let json = r#"{
      "tree": { "boxes": [
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 10 },
          "children": [1] },
        { "kind": "block", "bounds": { "x": 0, "y": 0, "width": 10, "height": 5 },
          "children": [0] }
      ] },
      "page": { "body": 0, "pageOffset": 0, "pageEnd": 10 }
    }"#;
    match PageDocument::from_json(json) {
        Err(TableGridError::InternalInconsistency(message)) => {
            assert!(message.contains("own ancestor"));
        }
        other => panic!("expected an internal inconsistency, got {other:?}"),
    }
}

#[test]
fn test_nested_area_root_rejected() {
    let json = r#"{
      "tree": { "boxes": [
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 10 },
          "children": [1] },
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 5 } }
      ] },
      "page": { "body": 0, "footer": 1, "pageOffset": 0, "pageEnd": 10 }
    }"#;
    match PageDocument::from_json(json) {
        Err(TableGridError::InvalidArgument(message)) => {
            assert!(message.contains("nested under box#0"));
        }
        other => panic!("expected an invalid argument, got {other:?}"),
    }
}

#[test]
fn test_missing_area_root_rejected() {
    let json = r#"{
      "tree": { "boxes": [
        { "kind": "section", "bounds": { "x": 0, "y": 0, "width": 10, "height": 10 } }
      ] },
      "page": { "body": 0, "footer": 3, "pageOffset": 0, "pageEnd": 10 }
    }"#;
    let err = PageDocument::from_json(json).unwrap_err();
    assert!(matches!(err, TableGridError::InvalidArgument(_)));
}

#[test]
fn test_malformed_json_is_json_error() {
    let err = PageDocument::from_json("{ not json").unwrap_err();
    assert!(matches!(err, TableGridError::Json(_)));
    assert!(err.to_string().starts_with("JSON error"));
}
