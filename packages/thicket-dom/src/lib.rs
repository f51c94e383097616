//! The headless document tree behind Thicket
//!
//! This crate implements a minimal headless DOM ([`Document`]): a slab-backed
//! node tree with attributes, inline and recorded styles, recorded layout
//! rectangles, scroll state, and per-node event storage. It has no parser,
//! no style engine and no renderer. Embedding code builds the tree directly,
//! records layout output on it, and drives events through
//! [`Document::dispatch_event`].
//!
//! The utility functions that most users want live in the
//! [thicket](https://docs.rs/thicket) crate, which wraps a [`Document`] the
//! way those helpers expect.
//!
//! Two pieces vary with the embedding host, described by
//! [`HostCapabilities`](thicket_traits::HostCapabilities) at construction
//! time: how listeners are stored (standard listener lists vs. legacy
//! single-slot handlers) and where style values are read from (a recorded
//! computed-style map vs. declared inline styles only).

/// The DOM implementation.
///
/// This is the primary entry point for this crate.
mod document;

/// The nodes themselves, and their data.
pub mod node;

mod config;
mod events;
mod query_selector;
mod style;
mod traversal;

pub mod util;

pub use config::DocumentConfig;
pub use document::Document;
pub use events::{
    EventMechanism, LegacyEvents, NoopEvents, StandardEvents, select_event_mechanism,
};
pub use markup5ever::{
    LocalName, Namespace, NamespaceStaticSet, Prefix, PrefixStaticSet, QualName, local_name,
    namespace_prefix, namespace_url, ns,
};
pub use node::{Attribute, Attributes, ElementData, Node, NodeData, TextNodeData};
pub use query_selector::{SelectorError, SelectorList, parse_selector_list};
pub use style::{
    CascadedStyles, ComputedStyles, NoStyles, StyleData, StyleSource, parse_style_declarations,
    select_style_source, serialize_style_declarations,
};
pub use thicket_traits::{
    CurrentEvent, DomEvent, DomEventData, EventCallback, EventListener, HostCapabilities,
    LegacyHandler, MouseEventButton, MouseEventButtons, MouseEventData, Point, Rect,
};
pub use traversal::{AncestorTraverser, TreeTraverser};
