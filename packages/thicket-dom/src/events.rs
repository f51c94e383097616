use slab::Slab;
use smol_str::{SmolStr, format_smolstr};
use thicket_traits::{
    CurrentEvent, DomEvent, DomEventData, EventCallback, EventListener, HostCapabilities,
    LegacyHandler,
};

use crate::Node;

/// Listener registration under one host model.
///
/// One mechanism is selected per document when it is constructed, based on
/// the probed [`HostCapabilities`]. Callers registering and removing
/// listeners never see which one they got.
pub trait EventMechanism {
    /// Mechanism name, for logging
    fn name(&self) -> &'static str;

    /// Registers `callback` for `event` on `target`
    fn bind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    );

    /// Removes a previously bound callback. Callbacks that were never bound
    /// through this mechanism are silently ignored.
    fn unbind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    );

    /// Releases any bookkeeping held for a node that is leaving the tree,
    /// so a later node reusing its id starts clean. Mechanisms without
    /// per-node state ignore this.
    fn forget_node(&mut self, _target: usize) {}
}

/// The standard multi-listener model.
///
/// Listener lists live on the nodes themselves. Binding an identical
/// `(event, callback)` pair twice is a no-op; unbinding removes the first
/// listener whose name and callback identity match.
pub struct StandardEvents;

impl EventMechanism for StandardEvents {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn bind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    ) {
        let Some(node) = nodes.get_mut(target) else {
            return;
        };
        let already_bound = node.listeners.iter().any(|listener| {
            listener.name == event && EventCallback::ptr_eq(&listener.callback, callback)
        });
        if already_bound {
            return;
        }
        node.listeners.push(EventListener {
            name: SmolStr::new(event),
            callback: callback.clone(),
        });
    }

    fn unbind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    ) {
        let Some(node) = nodes.get_mut(target) else {
            return;
        };
        let position = node.listeners.iter().position(|listener| {
            listener.name == event && EventCallback::ptr_eq(&listener.callback, callback)
        });
        if let Some(idx) = position {
            node.listeners.remove(idx);
        }
    }
}

/// The legacy single-slot model.
///
/// Event names are prefixed with "on" and the host keeps one handler slot
/// per (node, prefixed name). Each bind creates a fresh wrapper closure
/// around the caller's callback; the mechanism tracks every registration in
/// its own table and folds the wrappers for a slot into one composite
/// handler, in registration order. Binding the same callback twice therefore
/// fires it twice, and only this table makes unbinding possible at all - the
/// wrapper is not retrievable by the caller.
pub struct LegacyEvents {
    current: CurrentEvent,
    registrations: Vec<LegacyRegistration>,
}

struct LegacyRegistration {
    target: usize,
    /// "on"-prefixed event name
    event: SmolStr,
    /// The callback as the caller supplied it, for unbind matching
    source: EventCallback,
    /// The wrapper installed on the callback's behalf
    wrapper: LegacyHandler,
}

impl LegacyEvents {
    pub fn new(current: CurrentEvent) -> Self {
        Self {
            current,
            registrations: Vec::new(),
        }
    }

    /// Wraps a callback so it always receives the target as receiving
    /// context and an event: the native argument when the host passes one,
    /// else the current-event cell, else a synthesized event of the bound
    /// name.
    fn wrap(&self, target: usize, name: SmolStr, callback: &EventCallback) -> LegacyHandler {
        let callback = callback.clone();
        let current = self.current.clone();
        LegacyHandler::new(move |native: Option<&DomEvent>| match native {
            Some(event) => callback.call(target, event),
            None => match current.get() {
                Some(event) => callback.call(target, &event),
                None => {
                    let fallback = DomEvent::new(target, DomEventData::Custom(name.clone()));
                    callback.call(target, &fallback);
                }
            },
        })
    }

    /// Reinstalls the composite handler for (target, prefixed) from the
    /// surviving registrations, or clears the slot when none remain.
    fn rebuild_slot(&self, nodes: &mut Slab<Node>, target: usize, prefixed: &SmolStr) {
        let Some(node) = nodes.get_mut(target) else {
            return;
        };
        let wrappers: Vec<LegacyHandler> = self
            .registrations
            .iter()
            .filter(|reg| reg.target == target && reg.event == *prefixed)
            .map(|reg| reg.wrapper.clone())
            .collect();

        if wrappers.is_empty() {
            node.clear_legacy_slot(prefixed);
        } else {
            let composite = LegacyHandler::new(move |event| {
                for wrapper in &wrappers {
                    wrapper.call(event);
                }
            });
            node.set_legacy_slot(prefixed.clone(), composite);
        }
    }
}

impl EventMechanism for LegacyEvents {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn bind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    ) {
        if !nodes.contains(target) {
            return;
        }
        let prefixed = format_smolstr!("on{event}");
        let wrapper = self.wrap(target, SmolStr::new(event), callback);
        self.registrations.push(LegacyRegistration {
            target,
            event: prefixed.clone(),
            source: callback.clone(),
            wrapper,
        });
        self.rebuild_slot(nodes, target, &prefixed);
    }

    fn unbind(
        &mut self,
        nodes: &mut Slab<Node>,
        target: usize,
        event: &str,
        callback: &EventCallback,
    ) {
        let prefixed = format_smolstr!("on{event}");
        let position = self.registrations.iter().position(|reg| {
            reg.target == target
                && reg.event == prefixed
                && EventCallback::ptr_eq(&reg.source, callback)
        });
        let Some(idx) = position else {
            return;
        };
        self.registrations.remove(idx);
        self.rebuild_slot(nodes, target, &prefixed);
    }

    fn forget_node(&mut self, target: usize) {
        self.registrations.retain(|reg| reg.target != target);
    }
}

/// Selected when the host reports no event capability. Registrations are
/// dropped.
pub struct NoopEvents;

impl EventMechanism for NoopEvents {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn bind(
        &mut self,
        _nodes: &mut Slab<Node>,
        _target: usize,
        _event: &str,
        _callback: &EventCallback,
    ) {
    }

    fn unbind(
        &mut self,
        _nodes: &mut Slab<Node>,
        _target: usize,
        _event: &str,
        _callback: &EventCallback,
    ) {
    }
}

/// Picks the event mechanism for a capability set, probing the modern
/// capability first.
pub fn select_event_mechanism(
    capabilities: HostCapabilities,
    current: CurrentEvent,
) -> Box<dyn EventMechanism> {
    if capabilities.contains(HostCapabilities::EVENT_LISTENERS) {
        Box::new(StandardEvents)
    } else if capabilities.contains(HostCapabilities::LEGACY_EVENTS) {
        #[cfg(feature = "tracing")]
        tracing::debug!("standard event listeners unavailable, falling back to legacy slots");
        Box::new(LegacyEvents::new(current))
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!("host reports no event capability, listener registrations will be dropped");
        Box::new(NoopEvents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ElementData, NodeData};
    use crate::qual_name;
    use std::cell::Cell;
    use std::rc::Rc;

    fn element_node(nodes: &mut Slab<Node>) -> usize {
        let entry = nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(
            id,
            NodeData::Element(ElementData::new(qual_name!("div"), vec![])),
        ));
        id
    }

    fn counting_callback() -> (EventCallback, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let callback = EventCallback::new({
            let count = count.clone();
            move |_, _| count.set(count.get() + 1)
        });
        (callback, count)
    }

    #[test]
    fn standard_dedups_identical_bindings() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let (callback, _) = counting_callback();

        let mut mechanism = StandardEvents;
        mechanism.bind(&mut nodes, el, "click", &callback);
        mechanism.bind(&mut nodes, el, "click", &callback);
        assert_eq!(nodes[el].listeners.len(), 1);

        // Same callback under a different name is a distinct listener
        mechanism.bind(&mut nodes, el, "mousedown", &callback);
        assert_eq!(nodes[el].listeners.len(), 2);
    }

    #[test]
    fn standard_unbind_matches_name_and_identity() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let (callback, _) = counting_callback();
        let (other, _) = counting_callback();

        let mut mechanism = StandardEvents;
        mechanism.bind(&mut nodes, el, "click", &callback);
        mechanism.unbind(&mut nodes, el, "mousedown", &callback);
        mechanism.unbind(&mut nodes, el, "click", &other);
        assert_eq!(nodes[el].listeners.len(), 1);

        mechanism.unbind(&mut nodes, el, "click", &callback);
        assert!(nodes[el].listeners.is_empty());
    }

    #[test]
    fn legacy_folds_duplicate_bindings_into_one_slot() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let (callback, count) = counting_callback();

        let mut mechanism = LegacyEvents::new(CurrentEvent::new());
        mechanism.bind(&mut nodes, el, "click", &callback);
        mechanism.bind(&mut nodes, el, "click", &callback);
        assert_eq!(nodes[el].legacy_slots.len(), 1);

        nodes[el].legacy_slot("onclick").unwrap().call(None);
        assert_eq!(count.get(), 2);

        // One unbind drops one of the two registrations
        mechanism.unbind(&mut nodes, el, "click", &callback);
        nodes[el].legacy_slot("onclick").unwrap().call(None);
        assert_eq!(count.get(), 3);

        mechanism.unbind(&mut nodes, el, "click", &callback);
        assert!(nodes[el].legacy_slot("onclick").is_none());
    }

    #[test]
    fn forget_node_drops_registrations_for_that_node() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let (callback, count) = counting_callback();

        let mut mechanism = LegacyEvents::new(CurrentEvent::new());
        mechanism.bind(&mut nodes, el, "click", &callback);
        nodes.remove(el);
        mechanism.forget_node(el);

        // The freed id comes back for the next node; the old wrappers must
        // not resurface in its slot
        let reused = element_node(&mut nodes);
        assert_eq!(reused, el);
        let (other, other_count) = counting_callback();
        mechanism.bind(&mut nodes, reused, "click", &other);

        nodes[reused].legacy_slot("onclick").unwrap().call(None);
        assert_eq!(other_count.get(), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn legacy_unbind_of_unknown_callback_is_ignored() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let (callback, _) = counting_callback();
        let (stranger, _) = counting_callback();

        let mut mechanism = LegacyEvents::new(CurrentEvent::new());
        mechanism.bind(&mut nodes, el, "click", &callback);
        mechanism.unbind(&mut nodes, el, "click", &stranger);
        assert!(nodes[el].legacy_slot("onclick").is_some());
    }

    #[test]
    fn legacy_wrapper_prefers_native_event_over_cell() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let seen = Rc::new(Cell::new(0usize));
        let callback = EventCallback::new({
            let seen = seen.clone();
            move |_, event| seen.set(event.target)
        });

        let current = CurrentEvent::new();
        let mut mechanism = LegacyEvents::new(current.clone());
        mechanism.bind(&mut nodes, el, "click", &callback);

        current.set(DomEvent::new(11, DomEventData::Focus));
        let native = DomEvent::new(22, DomEventData::Focus);
        nodes[el].legacy_slot("onclick").unwrap().call(Some(&native));
        assert_eq!(seen.get(), 22);

        // Without a native argument the cell is read instead
        nodes[el].legacy_slot("onclick").unwrap().call(None);
        assert_eq!(seen.get(), 11);
    }

    #[test]
    fn legacy_wrapper_synthesizes_event_when_nothing_available() {
        let mut nodes = Slab::new();
        let el = element_node(&mut nodes);
        let seen = Rc::new(std::cell::RefCell::new(String::new()));
        let callback = EventCallback::new({
            let seen = seen.clone();
            move |target, event| {
                assert_eq!(target, event.target);
                *seen.borrow_mut() = event.name().to_string();
            }
        });

        let mut mechanism = LegacyEvents::new(CurrentEvent::new());
        mechanism.bind(&mut nodes, el, "sortstart", &callback);
        nodes[el].legacy_slot("onsortstart").unwrap().call(None);
        assert_eq!(*seen.borrow(), "sortstart");
    }

    #[test]
    fn selection_probes_modern_first() {
        let current = CurrentEvent::new();
        let both = HostCapabilities::EVENT_LISTENERS | HostCapabilities::LEGACY_EVENTS;
        assert_eq!(select_event_mechanism(both, current.clone()).name(), "standard");
        assert_eq!(
            select_event_mechanism(HostCapabilities::LEGACY_EVENTS, current.clone()).name(),
            "legacy"
        );
        assert_eq!(
            select_event_mechanism(HostCapabilities::empty(), current).name(),
            "noop"
        );
    }
}
