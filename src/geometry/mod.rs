//! Geometry domain — coordinate mapping between viewport, display and
//! native pixel space.
//!
//! Everything here is pure: no host access, no hidden state. The same
//! inputs always produce the same outputs.

mod mapper;
mod rect;

pub use mapper::{to_local, to_native, to_native_rect};
pub use rect::{LocalRect, NativeRect, SelectionRect};

/// A point in viewport or local display space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair. Used for both display and native dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Native sizes arrive as integer pixel counts.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }
}

/// An element's on-screen box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub origin: Point,
    pub size: Size,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(left, top),
            size: Size::new(width, height),
        }
    }
}
