use thicket_dom::Document;
use thicket_traits::EventCallback;

/// Registers `callback` to fire when `event` reaches `element`.
///
/// The host's standard listener mechanism is used when available; otherwise
/// the callback is wrapped into the element's legacy single-slot handler
/// for the `on`-prefixed name. Standard registrations deduplicate an
/// identical `(event, callback)` pair; legacy registrations do not, so
/// binding the same callback twice fires it twice.
pub fn on(doc: &mut Document, element: usize, event: &str, callback: &EventCallback) {
    doc.add_event_listener(element, event, callback);
}

/// Removes a registration made by [`on`]. At most one registration is
/// removed per call; callbacks that were never bound are ignored.
pub fn off(doc: &mut Document, element: usize, event: &str, callback: &EventCallback) {
    doc.remove_event_listener(element, event, callback);
}
