use std::collections::HashMap;
use std::sync::atomic::{self, AtomicUsize};

use keyboard_types::Modifiers;
use markup5ever::{QualName, local_name};
use slab::Slab;
use smol_str::{SmolStr, format_smolstr};
use thicket_traits::{
    CurrentEvent, DomEvent, DomEventData, EventCallback, HostCapabilities, MouseEventData, Point,
    Rect,
};

use crate::config::DocumentConfig;
use crate::events::{EventMechanism, select_event_mechanism};
use crate::node::{Attribute, ElementData, Node, NodeData, TextNodeData};
use crate::qual_name;
use crate::style::{
    StyleSource, parse_style_declarations, select_style_source, serialize_style_declarations,
};

/// A slab-backed tree of nodes plus the per-document state the utility
/// functions read: scroll position, the id map, and the event and style
/// mechanisms selected from the host's capabilities.
///
/// Node 0 is always the root [`NodeData::Document`] node.
pub struct Document {
    /// ID of the document
    id: usize,

    /// The nodes of the document
    pub(crate) nodes: Box<Slab<Node>>,

    /// The capability set this document was constructed with
    capabilities: HostCapabilities,
    /// The event mechanism selected from the capabilities
    events: Box<dyn EventMechanism>,
    /// The style source selected from the capabilities
    styles: Box<dyn StyleSource>,
    /// The event currently being delivered (if any)
    current_event: CurrentEvent,

    /// Scroll position of the document
    scroll: Point,

    /// Map of node id (attribute) to node id (slab key)
    pub(crate) nodes_to_id: HashMap<String, usize>,
}

impl Document {
    pub fn new(config: DocumentConfig) -> Self {
        static ID_GENERATOR: AtomicUsize = AtomicUsize::new(1);

        let id = ID_GENERATOR.fetch_add(1, atomic::Ordering::SeqCst);

        let capabilities = config.capabilities.unwrap_or_else(HostCapabilities::modern);
        let current_event = CurrentEvent::new();
        let events = select_event_mechanism(capabilities, current_event.clone());
        let styles = select_style_source(capabilities);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Document {} using {} events and {} styles",
            id,
            events.name(),
            styles.name()
        );

        let mut doc = Self {
            id,
            nodes: Box::new(Slab::new()),
            capabilities,
            events,
            styles,
            current_event,
            scroll: Point::ZERO,
            nodes_to_id: HashMap::new(),
        };

        // Initialise document with root Document node
        doc.create_node(NodeData::Document);
        doc
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    /// A handle to the cell holding the event currently being delivered
    pub fn current_event(&self) -> CurrentEvent {
        self.current_event.clone()
    }

    pub fn get_node(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_node_mut(&mut self, node_id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Like [`get_node`](Self::get_node) but panics on an invalid id
    pub fn node_from_id(&self, node_id: usize) -> &Node {
        &self.nodes[node_id]
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Debug-print the whole tree to stdout
    pub fn print_tree(&self) {
        crate::util::walk_tree(0, self, self.root_node());
    }
}

/// Node creation
impl Document {
    pub fn create_node(&mut self, node_data: NodeData) -> usize {
        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(id, node_data));
        id
    }

    /// Creates an element node, registering its `id` attribute in the id map
    /// and parsing any `style` attribute into inline declarations.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> usize {
        let id = self.create_node(NodeData::Element(ElementData::new(name, attrs)));

        if let Some(id_attr) = self.nodes[id].attr(local_name!("id")) {
            self.nodes_to_id.insert(id_attr.to_string(), id);
        }

        let declarations = self.nodes[id]
            .attr(local_name!("style"))
            .map(parse_style_declarations);
        if let Some(declarations) = declarations {
            self.nodes[id].style.declarations = declarations;
        }

        id
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        self.create_node(NodeData::Text(TextNodeData::new(text.to_string())))
    }

    pub fn create_comment_node(&mut self) -> usize {
        self.create_node(NodeData::Comment)
    }
}

/// Tree mutation
impl Document {
    /// Appends `child_ids` to the end of `parent_id`'s child list, detaching
    /// each child from its previous position first.
    pub fn append(&mut self, parent_id: usize, child_ids: &[usize]) {
        for child_id in child_ids.iter().copied() {
            let old_parent = self.nodes[child_id].parent.replace(parent_id);
            if let Some(old_parent_id) = old_parent {
                self.nodes[old_parent_id]
                    .children
                    .retain(|id| *id != child_id);
            }
            self.nodes[parent_id].children.push(child_id);
        }
    }

    /// Inserts `new_node_ids` immediately before `anchor_node_id` in its
    /// parent's child list, detaching each from its previous position
    /// first. The anchor itself may be among the new nodes; the group
    /// lands where the anchor was. Does nothing if the anchor is detached.
    pub fn insert_before(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        let Some(parent_id) = self.nodes[anchor_node_id].parent else {
            return;
        };
        let Some(mut anchor_idx) = self.nodes[parent_id]
            .children
            .iter()
            .position(|id| *id == anchor_node_id)
        else {
            return;
        };

        for new_node_id in new_node_ids.iter().copied() {
            let old_parent = self.nodes[new_node_id].parent.replace(parent_id);
            if let Some(old_parent_id) = old_parent {
                let children = &mut self.nodes[old_parent_id].children;
                if let Some(old_idx) = children.iter().position(|id| *id == new_node_id) {
                    children.remove(old_idx);
                    // Detaching an earlier sibling shifts the insertion
                    // point left by one
                    if old_parent_id == parent_id && old_idx < anchor_idx {
                        anchor_idx -= 1;
                    }
                }
            }
        }

        self.nodes[parent_id]
            .children
            .splice(anchor_idx..anchor_idx, new_node_ids.iter().copied());
    }

    /// Detaches `node_id` from its parent and drops the whole subtree,
    /// releasing the slab entries, any id-map registrations and any
    /// listener bookkeeping the event mechanism holds for the removed
    /// nodes. The root node cannot be removed.
    pub fn remove_node(&mut self, node_id: usize) {
        if node_id == 0 || !self.nodes.contains(node_id) {
            return;
        }

        if let Some(parent_id) = self.nodes[node_id].parent.take() {
            self.nodes[parent_id].children.retain(|id| *id != node_id);
        }

        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = self.nodes.remove(id);
            if let Some(id_attr) = node.element_data().and_then(ElementData::id) {
                self.nodes_to_id.remove(id_attr);
            }
            self.events.forget_node(id);
            stack.extend(node.children);
        }
    }
}

/// Attributes and styles
impl Document {
    /// Sets an attribute, keeping the id map and the parsed inline
    /// declarations in sync when the `id` or `style` attribute changes.
    pub fn set_attribute(&mut self, node_id: usize, name: QualName, value: &str) {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return;
        };
        let NodeData::Element(ref mut element) = node.data else {
            return;
        };

        match name.local.as_ref() {
            "id" => {
                if let Some(old) = element.id() {
                    self.nodes_to_id.remove(old);
                }
                self.nodes_to_id.insert(value.to_string(), node_id);
            }
            "style" => {
                node.style.declarations = parse_style_declarations(value);
            }
            _ => {}
        }

        element.attrs.set(name, value);
    }

    pub fn remove_attribute(&mut self, node_id: usize, name: QualName) {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return;
        };
        let NodeData::Element(ref mut element) = node.data else {
            return;
        };

        match name.local.as_ref() {
            "id" => {
                if let Some(old) = element.id() {
                    self.nodes_to_id.remove(old);
                }
            }
            "style" => {
                node.style.declarations.clear();
            }
            _ => {}
        }

        element.attrs.remove(&name);
    }

    /// Upserts one inline declaration and reserialises the `style`
    /// attribute from the declaration list.
    pub fn set_style_property(&mut self, node_id: usize, property: &str, value: &str) {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return;
        };
        if !node.is_element() {
            return;
        }

        let property = property.to_ascii_lowercase();
        let declarations = &mut node.style.declarations;
        match declarations
            .iter_mut()
            .rev()
            .find(|(name, _)| name.as_str() == property)
        {
            Some(declaration) => declaration.1 = value.to_string(),
            None => declarations.push((SmolStr::new(property), value.to_string())),
        }

        let css = serialize_style_declarations(&node.style.declarations);
        if let Some(element) = node.element_data_mut() {
            element.attrs.set(qual_name!("style"), &css);
        }
    }

    /// Records a resolved value for a property, standing in for the output
    /// of a style and layout pass.
    pub fn set_computed_style(&mut self, node_id: usize, property: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.style
                .computed
                .insert(SmolStr::new(property.to_ascii_lowercase()), value.to_string());
        }
    }

    /// Resolves `property` for `node_id` through the selected style source
    pub fn resolved_property(&self, node_id: usize, property: &str) -> Option<String> {
        self.styles.resolve(&self.nodes, node_id, property)
    }
}

/// Layout and geometry
impl Document {
    /// Records a node's layout rectangle: `left`/`top` relative to the
    /// parent's border box, `width`/`height` as the border-box size.
    pub fn set_layout_rect(&mut self, node_id: usize, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.final_layout.location.x = rect.left as f32;
            node.final_layout.location.y = rect.top as f32;
            node.final_layout.size.width = rect.width as f32;
            node.final_layout.size.height = rect.height as f32;
        }
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: Point) {
        self.scroll = scroll;
    }

    /// Scrolls a node's own content by the given amounts
    pub fn scroll_node_by(&mut self, node_id: usize, x: f64, y: f64) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.scroll_offset.left += x;
            node.scroll_offset.top += y;
        }
    }

    /// The position of the node's border box relative to the document
    /// origin, accounting for the scroll offset of every node on the way up
    /// the layout hierarchy.
    pub fn absolute_position(&self, node_id: usize) -> Point {
        let mut point = Point::ZERO;
        let mut current = self.get_node(node_id);
        while let Some(node) = current {
            point.left += node.final_layout.location.x as f64 - node.scroll_offset.left;
            point.top += node.final_layout.location.y as f64 - node.scroll_offset.top;
            current = node.parent.and_then(|parent_id| self.get_node(parent_id));
        }
        point
    }

    /// The node's border box in viewport coordinates, i.e. the absolute
    /// position shifted by the document's own scroll position.
    pub fn client_rect(&self, node_id: usize) -> Rect {
        let absolute = self.absolute_position(node_id);
        let size = self
            .get_node(node_id)
            .map(|node| node.final_layout.size)
            .unwrap_or(taffy::Size {
                width: 0.0,
                height: 0.0,
            });

        Rect::new(
            absolute.left - self.scroll.left,
            absolute.top - self.scroll.top,
            size.width as f64,
            size.height as f64,
        )
    }

    /// Creates the payload for a synthetic click at the center of the
    /// node's border box.
    pub fn synthetic_click_event_data(&self, node_id: usize, mods: Modifiers) -> MouseEventData {
        let absolute = self.absolute_position(node_id);
        let size = self
            .get_node(node_id)
            .map(|node| node.final_layout.size)
            .unwrap_or(taffy::Size {
                width: 0.0,
                height: 0.0,
            });

        MouseEventData {
            x: absolute.left + (size.width as f64 / 2.0),
            y: absolute.top + (size.height as f64 / 2.0),
            mods,
            button: Default::default(),
            buttons: Default::default(),
        }
    }
}

/// Events
impl Document {
    /// Registers `callback` for `event` on `target` through the selected
    /// event mechanism.
    pub fn add_event_listener(&mut self, target: usize, event: &str, callback: &EventCallback) {
        self.events.bind(&mut self.nodes, target, event, callback);
    }

    /// Removes `callback` for `event` on `target` through the selected
    /// event mechanism.
    pub fn remove_event_listener(&mut self, target: usize, event: &str, callback: &EventCallback) {
        self.events.unbind(&mut self.nodes, target, event, callback);
    }

    /// Delivers an event to its target node.
    ///
    /// The current-event cell is set for the duration of delivery. Standard
    /// listeners matching the event name run first, from a snapshot taken
    /// before any callback fires. The target's legacy slot for the prefixed
    /// name runs after, with no event argument (the wrappers read the
    /// cell). Events do not propagate to ancestors.
    pub fn dispatch_event(&mut self, target: usize, data: DomEventData) {
        let event = DomEvent::new(target, data);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Document {} dispatching {} to node {}",
            self.id,
            event.name(),
            target
        );

        self.current_event.set(event.clone());

        let standard: Vec<EventCallback> = self
            .get_node(target)
            .map(|node| {
                node.listeners
                    .iter()
                    .filter(|listener| listener.name == event.name())
                    .map(|listener| listener.callback.clone())
                    .collect()
            })
            .unwrap_or_default();
        for callback in standard {
            callback.call(target, &event);
        }

        let slot = self.get_node(target).and_then(|node| {
            node.legacy_slot(&format_smolstr!("on{}", event.name()))
                .cloned()
        });
        if let Some(handler) = slot {
            handler.call(None);
        }

        self.current_event.clear();
    }
}
