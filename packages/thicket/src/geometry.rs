use thicket_dom::Document;
use thicket_traits::Point;

use crate::value::parse_int;

/// Position of `element`'s border box relative to its parent's content
/// box. Absent elements report the origin.
pub fn position(doc: &Document, element: Option<usize>) -> Point {
    let Some(node) = element.and_then(|id| doc.get_node(id)) else {
        return Point::ZERO;
    };
    Point::new(
        node.final_layout.location.x as f64,
        node.final_layout.location.y as f64,
    )
}

/// Document-relative position of `element`: the viewport-relative client
/// rectangle put back into document coordinates by adding the document
/// scroll. Absent elements report the origin.
pub fn offset(doc: &Document, element: Option<usize>) -> Point {
    let Some(id) = element.filter(|id| doc.get_node(*id).is_some()) else {
        return Point::ZERO;
    };

    let rect = doc.client_rect(id);
    let scroll = doc.scroll();
    Point::new(rect.left + scroll.left, rect.top + scroll.top)
}

/// Border-box width of `element`. Panics on an invalid id.
pub fn width(doc: &Document, element: usize) -> f64 {
    doc.node_from_id(element).final_layout.size.width as f64
}

/// Border-box height of `element`. Panics on an invalid id.
pub fn height(doc: &Document, element: usize) -> f64 {
    doc.node_from_id(element).final_layout.size.height as f64
}

/// Border-box width plus the left and right margins. Margins are read from
/// the document's style source with a leading-integer parse; absent or
/// unparseable margins count as 0.
pub fn outer_width_with_margin(doc: &Document, element: usize) -> f64 {
    width(doc, element) + margin(doc, element, "margin-left") + margin(doc, element, "margin-right")
}

/// Border-box height plus the top and bottom margins
pub fn outer_height_with_margin(doc: &Document, element: usize) -> f64 {
    height(doc, element) + margin(doc, element, "margin-top") + margin(doc, element, "margin-bottom")
}

fn margin(doc: &Document, element: usize, property: &str) -> f64 {
    doc.resolved_property(element, property)
        .and_then(|value| parse_int(&value))
        .unwrap_or(0.0)
}
