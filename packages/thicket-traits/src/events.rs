use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use keyboard_types::Modifiers;
use smol_str::SmolStr;

/// A listener registered through the standard mechanism.
#[derive(Clone)]
pub struct EventListener {
    pub name: SmolStr,
    pub callback: EventCallback,
}

#[derive(Debug, Clone)]
pub struct DomEvent {
    pub target: usize,
    pub data: DomEventData,
}

impl DomEvent {
    pub fn new(target: usize, data: DomEventData) -> Self {
        Self { target, data }
    }

    /// Returns the name of the event ("click", "mousedown", etc)
    pub fn name(&self) -> &str {
        self.data.name()
    }
}

#[derive(Debug, Clone)]
pub enum DomEventData {
    MouseDown(MouseEventData),
    MouseUp(MouseEventData),
    Click(MouseEventData),
    MouseMove(MouseEventData),
    Focus,
    Blur,
    /// A caller-defined event carrying only its type.
    Custom(SmolStr),
}

impl DomEventData {
    pub fn name(&self) -> &str {
        match self {
            DomEventData::MouseDown { .. } => "mousedown",
            DomEventData::MouseUp { .. } => "mouseup",
            DomEventData::Click { .. } => "click",
            DomEventData::MouseMove { .. } => "mousemove",
            DomEventData::Focus => "focus",
            DomEventData::Blur => "blur",
            DomEventData::Custom(name) => name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MouseEventData {
    /// Document-relative x coordinate of the pointer
    pub x: f64,
    /// Document-relative y coordinate of the pointer
    pub y: f64,
    pub mods: Modifiers,
    pub button: MouseEventButton,
    pub buttons: MouseEventButtons,
}

impl Default for MouseEventData {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            mods: Modifiers::empty(),
            button: MouseEventButton::default(),
            buttons: MouseEventButtons::empty(),
        }
    }
}

/// The button that generated a mouse event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MouseEventButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
}

bitflags! {
    /// The set of buttons held down while a mouse event fired.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MouseEventButtons: u8 {
        const PRIMARY = 0b0000_0001;
        const SECONDARY = 0b0000_0010;
        const AUXILIARY = 0b0000_0100;
    }
}

/// A shared event handler.
///
/// Invoked with the id of the node the listener is attached to (the receiving
/// context) and the event being delivered. Identity comparison via [`ptr_eq`]
/// is what makes a callback removable again: two callbacks are the same
/// listener only if they share storage.
///
/// [`ptr_eq`]: EventCallback::ptr_eq
#[derive(Clone)]
pub struct EventCallback(Rc<dyn Fn(usize, &DomEvent)>);

impl EventCallback {
    pub fn new(f: impl Fn(usize, &DomEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, target: usize, event: &DomEvent) {
        (self.0)(target, event)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventCallback")
    }
}

/// A wrapper closure installed into a node's legacy slot.
///
/// The host passes the native event when it has one; the wrapper falls back
/// to the current-event cell otherwise.
#[derive(Clone)]
pub struct LegacyHandler(Rc<dyn Fn(Option<&DomEvent>)>);

impl LegacyHandler {
    pub fn new(f: impl Fn(Option<&DomEvent>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: Option<&DomEvent>) {
        (self.0)(event)
    }
}

impl fmt::Debug for LegacyHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LegacyHandler")
    }
}

/// The event currently being delivered (the global fallback event legacy
/// hosts expose).
///
/// Set for the duration of a dispatch and cleared afterwards. Legacy wrappers
/// read it when they receive no native event argument.
#[derive(Clone, Default)]
pub struct CurrentEvent(Rc<RefCell<Option<DomEvent>>>);

impl CurrentEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, event: DomEvent) {
        *self.0.borrow_mut() = Some(event);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }

    pub fn get(&self) -> Option<DomEvent> {
        self.0.borrow().clone()
    }
}
