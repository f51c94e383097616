use std::collections::HashMap;

use slab::Slab;
use smol_str::SmolStr;
use thicket_traits::HostCapabilities;

use crate::Node;

/// Styling state carried by every node.
#[derive(Debug, Clone, Default)]
pub struct StyleData {
    /// Inline declarations in authored order (the parsed `style` attribute).
    /// Duplicates are preserved; the last declaration for a property wins.
    pub declarations: Vec<(SmolStr, String)>,
    /// Resolved values recorded by the embedder, standing in for the output
    /// of a layout/style pass
    pub computed: HashMap<SmolStr, String>,
}

impl StyleData {
    /// Last authored value for a property, if any
    pub fn declared(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(name, _)| name.as_str() == property)
            .map(|(_, value)| value.as_str())
    }
}

/// Parses a `style` attribute string into `(property, value)` declarations.
///
/// Semicolon-separated `name: value` pairs. Malformed segments are dropped,
/// property names are lowercased, values kept as authored.
pub fn parse_style_declarations(css: &str) -> Vec<(SmolStr, String)> {
    let mut declarations = Vec::new();
    for declaration in css.split(';') {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            continue;
        }
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            continue;
        }
        declarations.push((SmolStr::new(name.to_ascii_lowercase()), value.to_string()));
    }
    declarations
}

/// Serializes declarations back into `style` attribute form.
pub fn serialize_style_declarations(declarations: &[(SmolStr, String)]) -> String {
    let mut css = String::new();
    for (name, value) in declarations {
        if !css.is_empty() {
            css.push_str("; ");
        }
        css.push_str(name);
        css.push_str(": ");
        css.push_str(value);
    }
    css
}

/// Style lookup for one property on one node.
///
/// Two implementations mirror the host's dual path: resolved values recorded
/// by the embedder ([`ComputedStyles`]) and the authored cascade
/// ([`CascadedStyles`]). One source is selected when the document is
/// constructed and used for every lookup thereafter.
pub trait StyleSource {
    /// Source name, for logging
    fn name(&self) -> &'static str;

    /// The value of `property` for `node_id`, or `None` if this source
    /// cannot produce one
    fn resolve(&self, nodes: &Slab<Node>, node_id: usize, property: &str) -> Option<String>;
}

/// Resolves from values recorded by the embedder, falling back to the
/// authored declarations for properties that were never recorded.
pub struct ComputedStyles;

impl StyleSource for ComputedStyles {
    fn name(&self) -> &'static str {
        "computed"
    }

    fn resolve(&self, nodes: &Slab<Node>, node_id: usize, property: &str) -> Option<String> {
        let node = nodes.get(node_id)?;
        let property = property.to_ascii_lowercase();
        match node.style.computed.get(property.as_str()) {
            Some(value) => Some(value.clone()),
            None => node.style.declared(&property).map(str::to_string),
        }
    }
}

/// Resolves from the authored declarations only, the way an old host's
/// cascaded lookup did. Recorded computed values are ignored, so unresolved
/// forms ("10%", "auto") come back as authored.
pub struct CascadedStyles;

impl StyleSource for CascadedStyles {
    fn name(&self) -> &'static str {
        "cascaded"
    }

    fn resolve(&self, nodes: &Slab<Node>, node_id: usize, property: &str) -> Option<String> {
        let node = nodes.get(node_id)?;
        node.style
            .declared(&property.to_ascii_lowercase())
            .map(str::to_string)
    }
}

/// Selected when the host reports no style capability at all.
pub struct NoStyles;

impl StyleSource for NoStyles {
    fn name(&self) -> &'static str {
        "none"
    }

    fn resolve(&self, _nodes: &Slab<Node>, _node_id: usize, _property: &str) -> Option<String> {
        None
    }
}

/// Picks the style source for a capability set, probing the modern
/// capability first.
pub fn select_style_source(capabilities: HostCapabilities) -> Box<dyn StyleSource> {
    if capabilities.contains(HostCapabilities::COMPUTED_STYLE) {
        Box::new(ComputedStyles)
    } else if capabilities.contains(HostCapabilities::CASCADED_STYLE) {
        Box::new(CascadedStyles)
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!("host reports no style capability, style lookups will resolve nothing");
        Box::new(NoStyles)
    }
}
