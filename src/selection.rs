//! Rectangle selection over a content tree snapshot.

use crate::types::{BoundingBox, ContentNode};

/// Leaves whose bounding box intersects `rect`, in document order.
///
/// Nodes without a bounding box are never selected, but their children are
/// still searched.
pub fn leaves_in_rect<'a>(root: &'a ContentNode, rect: &BoundingBox) -> Vec<&'a ContentNode> {
    let mut selected = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_leaf() {
            if node
                .bounding_box
                .as_ref()
                .map(|bounds| bounds.intersects(rect))
                .unwrap_or(false)
            {
                selected.push(node);
            }
        } else {
            stack.extend(node.children.iter().rev());
        }
    }
    selected
}

/// The text a rectangle selection flags: selected leaf content joined by newlines.
pub fn selected_content(root: &ContentNode, rect: &BoundingBox) -> String {
    leaves_in_rect(root, rect)
        .iter()
        .map(|node| node.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `left,top,right,bottom`.
pub fn parse_rect(raw: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid coordinate '{}': {}", part.trim(), e))
        })
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [left, top, right, bottom] => {
            if left > right || top > bottom {
                return Err(format!(
                    "rectangle '{}' must satisfy left <= right and top <= bottom",
                    raw
                ));
            }
            Ok(BoundingBox {
                left: *left,
                top: *top,
                right: *right,
                bottom: *bottom,
            })
        }
        _ => Err(format!(
            "expected four comma-separated numbers (left,top,right,bottom), got '{}'",
            raw
        )),
    }
}
