/// A point in document space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub left: f64,
    pub top: f64,
}

impl Point {
    pub const ZERO: Self = Point {
        left: 0.0,
        top: 0.0,
    };

    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// A viewport-relative rectangle: scroll-adjusted position plus border-box
/// size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}
