//! Rectangle selection over snapshot documents.

use veil::selection::{leaves_in_rect, parse_rect, selected_content};
use veil::types::ContentNode;

const SNAPSHOT: &str = r#"{
  "role": "main",
  "handle": "main",
  "children": [
    {
      "role": "article",
      "content": "Headline Body",
      "handle": "article",
      "bounding_box": {"left": 0, "top": 0, "right": 500, "bottom": 400},
      "children": [
        {"role": "h1", "content": "Headline", "handle": "h1",
         "bounding_box": {"left": 0, "top": 0, "right": 500, "bottom": 40}},
        {"role": "p", "content": "Body", "handle": "p",
         "bounding_box": {"left": 0, "top": 50, "right": 500, "bottom": 400}}
      ]
    },
    {"role": "aside", "content": "Sidebar", "handle": "aside",
     "bounding_box": {"left": 520, "top": 0, "right": 700, "bottom": 400}},
    {"role": "footer", "content": "No geometry", "handle": "footer"}
  ]
}"#;

#[test]
fn test_selection_returns_intersecting_leaves_in_document_order() {
    let tree = ContentNode::from_json(SNAPSHOT).unwrap();

    let rect = parse_rect("10,30,600,60").unwrap();
    let handles: Vec<&str> = leaves_in_rect(&tree, &rect)
        .iter()
        .map(|node| node.handle.as_str())
        .collect();
    assert_eq!(handles, vec!["h1", "p", "aside"]);
    assert_eq!(selected_content(&tree, &rect), "Headline\nBody\nSidebar");
}

#[test]
fn test_selection_outside_everything_is_empty() {
    let tree = ContentNode::from_json(SNAPSHOT).unwrap();
    let rect = parse_rect("800,800,900,900").unwrap();
    assert!(leaves_in_rect(&tree, &rect).is_empty());
    assert_eq!(selected_content(&tree, &rect), "");
}

#[test]
fn test_rect_parsing_errors() {
    assert!(parse_rect("1,2,3").is_err());
    assert!(parse_rect("a,2,3,4").is_err());
    assert!(parse_rect("10,0,5,5").is_err());
    assert!(parse_rect(" -5, -5, 5, 5 ").is_ok());
}
