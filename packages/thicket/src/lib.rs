//! A minimal DOM utility belt
//!
//! Thicket is a small set of independent helper functions over a headless
//! document tree ([`Document`], from the
//! [thicket-dom](https://docs.rs/thicket-dom) crate), intended as a
//! lightweight substitute for a general-purpose DOM helper library:
//!
//!  - Event binding: [`on`] / [`off`], with a legacy single-slot fallback
//!    for hosts without standard listener registration.
//!  - Geometry queries: [`position`], [`offset`], [`width`], [`height`],
//!    [`outer_width_with_margin`], [`outer_height_with_margin`].
//!  - Generic helpers: [`is_function`], [`is_numeric`], [`closest`],
//!    [`assign`], [`get`].
//!
//! Every function takes the document explicitly and keeps no state of its
//! own. Which mechanisms the helpers use is decided once, when the
//! document is constructed from a
//! [`HostCapabilities`](thicket_traits::HostCapabilities) set.

mod events;
mod geometry;
mod query;
pub mod value;

pub use events::{off, on};
pub use geometry::{
    height, offset, outer_height_with_margin, outer_width_with_margin, position, width,
};
pub use query::{closest, get, get_all};
pub use value::{
    Object, ObjectRef, OwnProperty, TypeError, Value, assign, is_function, is_numeric, parse_float,
    parse_int, to_number, to_string_value,
};

pub use thicket_dom::{Document, DocumentConfig, SelectorError};
pub use thicket_traits::{EventCallback, HostCapabilities, Point, Rect};
