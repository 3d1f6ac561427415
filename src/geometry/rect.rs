//! Selection and region rectangles.

use super::Point;

/// The user-dragged region while a gesture is live: two corners in local
/// display space, in the order they were produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub start: Point,
    pub end: Point,
}

impl SelectionRect {
    /// A zero-size selection anchored at `start`.
    pub fn anchored(start: Point) -> Self {
        Self { start, end: start }
    }

    /// Move the free corner.
    pub fn extend_to(&mut self, end: Point) {
        self.end = end;
    }

    /// Origin at the top-left corner, non-negative extent.
    pub fn normalized(&self) -> LocalRect {
        LocalRect {
            x: self.start.x.min(self.end.x),
            y: self.start.y.min(self.end.y),
            width: (self.end.x - self.start.x).abs(),
            height: (self.end.y - self.start.y).abs(),
        }
    }
}

/// Axis-aligned rectangle in local display space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LocalRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Snap every component to whole display pixels.
    pub fn rounded(&self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
            width: self.width.round(),
            height: self.height.round(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Region of an image in native pixel coordinates.
///
/// (0,0) is the top-left pixel; `x + width` and `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl NativeRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn end_x(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn end_y(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width × height` grid anchored at the origin.
    pub fn clipped_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.end_x().min(width) - x,
            height: self.end_y().min(height) - y,
        }
    }
}
