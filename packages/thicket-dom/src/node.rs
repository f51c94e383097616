use std::ops::{Deref, DerefMut};

use markup5ever::{LocalName, QualName, local_name};
use smol_str::SmolStr;
use taffy::prelude::Layout;
use thicket_traits::{EventListener, LegacyHandler, Point};

use crate::style::StyleData;

/// A single node in the tree.
///
/// Nodes only ever live inside a [`Document`](crate::Document)'s slab. The
/// `id` is the node's slab key and doubles as the element reference handed
/// out to callers.
pub struct Node {
    /// The node's id within the document
    pub id: usize,
    /// The parent node's id, `None` for the root Document node and for
    /// detached nodes
    pub parent: Option<usize>,
    /// Child node ids in tree order
    pub children: Vec<usize>,

    /// Node type (Document, Element, Text, Comment) specific data
    pub data: NodeData,

    /// Authored inline declarations and recorded computed values
    pub style: StyleData,

    /// The layout rectangle recorded for this node (parent-relative
    /// location, border-box size)
    pub final_layout: Layout,
    /// Amount the node's own content is scrolled
    pub scroll_offset: Point,

    /// Listeners registered through the standard mechanism
    pub listeners: Vec<EventListener>,
    /// Legacy registrations: at most one slot per "on"-prefixed event name
    pub legacy_slots: Vec<(SmolStr, LegacyHandler)>,
}

impl Node {
    pub(crate) fn new(id: usize, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            data,
            style: StyleData::default(),
            final_layout: Layout::new(),
            scroll_offset: Point::ZERO,
            listeners: Vec::new(),
            legacy_slots: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        self.data.downcast_element()
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        self.data.downcast_element_mut()
    }

    pub fn text_data(&self) -> Option<&TextNodeData> {
        match &self.data {
            NodeData::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextNodeData> {
        match &mut self.data {
            NodeData::Text(data) => Some(data),
            _ => None,
        }
    }

    /// Attribute lookup that is `None` for non-element nodes
    pub fn attr(&self, name: LocalName) -> Option<&str> {
        self.element_data()?.attr(name)
    }

    /// The handler currently installed in the slot for the given
    /// "on"-prefixed event name
    pub fn legacy_slot(&self, prefixed: &str) -> Option<&LegacyHandler> {
        self.legacy_slots
            .iter()
            .find(|(name, _)| name.as_str() == prefixed)
            .map(|(_, handler)| handler)
    }

    pub(crate) fn set_legacy_slot(&mut self, prefixed: SmolStr, handler: LegacyHandler) {
        let existing = self
            .legacy_slots
            .iter_mut()
            .find(|(name, _)| *name == prefixed);
        match existing {
            Some(slot) => slot.1 = handler,
            None => self.legacy_slots.push((prefixed, handler)),
        }
    }

    pub(crate) fn clear_legacy_slot(&mut self, prefixed: &str) {
        self.legacy_slots.retain(|(name, _)| name.as_str() != prefixed);
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    /// The Document itself - the root node of the tree
    Document,
    /// An element node
    Element(ElementData),
    /// A text node
    Text(TextNodeData),
    /// A comment node
    Comment,
}

impl NodeData {
    pub fn downcast_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn downcast_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's tag name, namespace and prefix
    pub name: QualName,
    /// The element's attributes
    pub attrs: Attributes,
}

impl ElementData {
    pub fn new(name: QualName, attrs: Vec<Attribute>) -> Self {
        Self {
            name,
            attrs: Attributes::new(attrs),
        }
    }

    pub fn attr(&self, name: LocalName) -> Option<&str> {
        let attr = self.attrs.iter().find(|attr| attr.name.local == name)?;
        Some(&attr.value)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr(local_name!("id"))
    }

    /// Whitespace-separated tokens of the class attribute
    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr(local_name!("class"))
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_tokens().any(|token| token == class)
    }
}

#[derive(Debug, Clone)]
pub struct TextNodeData {
    /// The textual content of the text node
    pub content: String,
}

impl TextNodeData {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}

/// A tag attribute, e.g. `class="test"` in `<div class="test" ...>`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    /// The name of the attribute (e.g. the `class` in `<div class="test">`)
    pub name: QualName,
    /// The value of the attribute (e.g. the `"test"` in `<div class="test">`)
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Attributes {
    inner: Vec<Attribute>,
}

impl Attributes {
    pub fn new(inner: Vec<Attribute>) -> Self {
        Self { inner }
    }

    pub fn set(&mut self, name: QualName, value: &str) {
        let existing_attr = self.inner.iter_mut().find(|a| a.name == name);
        if let Some(existing_attr) = existing_attr {
            existing_attr.value.clear();
            existing_attr.value.push_str(value);
        } else {
            self.push(Attribute {
                name,
                value: value.to_string(),
            });
        }
    }

    pub fn remove(&mut self, name: &QualName) -> Option<Attribute> {
        let idx = self.inner.iter().position(|attr| attr.name == *name);
        idx.map(|idx| self.inner.remove(idx))
    }
}

impl Deref for Attributes {
    type Target = Vec<Attribute>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl DerefMut for Attributes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qual_name;

    #[test]
    fn attributes_set_overwrites_in_place() {
        let mut attrs = Attributes::new(vec![Attribute {
            name: qual_name!("class"),
            value: "a".to_string(),
        }]);
        attrs.set(qual_name!("class"), "b");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, "b");

        attrs.set(qual_name!("id"), "x");
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs.remove(&qual_name!("class")).map(|a| a.value), Some("b".to_string()));
        assert!(attrs.remove(&qual_name!("class")).is_none());
    }

    #[test]
    fn class_tokens_split_on_whitespace() {
        let el = ElementData::new(
            qual_name!("div"),
            vec![Attribute {
                name: qual_name!("class"),
                value: "  foo bar\tbaz ".to_string(),
            }],
        );
        assert!(el.has_class("foo"));
        assert!(el.has_class("baz"));
        assert!(!el.has_class("fo"));
        assert_eq!(el.class_tokens().count(), 3);
    }

    #[test]
    fn legacy_slots_replace_per_name() {
        let mut node = Node::new(1, NodeData::Element(ElementData::new(qual_name!("div"), vec![])));
        node.set_legacy_slot("onclick".into(), LegacyHandler::new(|_| {}));
        node.set_legacy_slot("onclick".into(), LegacyHandler::new(|_| {}));
        node.set_legacy_slot("onfocus".into(), LegacyHandler::new(|_| {}));
        assert_eq!(node.legacy_slots.len(), 2);
        assert!(node.legacy_slot("onclick").is_some());

        node.clear_legacy_slot("onclick");
        assert!(node.legacy_slot("onclick").is_none());
        assert!(node.legacy_slot("onfocus").is_some());
    }
}
