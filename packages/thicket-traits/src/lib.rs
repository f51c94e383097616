//! Shared types for the Thicket crates: events and callbacks, geometry value
//! records, and the host capability flags that drive mechanism selection.

mod capabilities;
pub use capabilities::HostCapabilities;

mod events;
pub use events::{
    CurrentEvent, DomEvent, DomEventData, EventCallback, EventListener, LegacyHandler,
    MouseEventButton, MouseEventButtons, MouseEventData,
};

mod geometry;
pub use geometry::{Point, Rect};
