//! Viewport → local → native coordinate mapping.

use super::{Bounds, LocalRect, NativeRect, Point, Size};

/// Clamp `value` into `[0, max]`. NaN and negative limits collapse to 0.
fn clamp_axis(value: f64, max: f64) -> f64 {
    let max = if max.is_finite() && max > 0.0 { max } else { 0.0 };
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

/// Map a viewport point into the element's local display space.
///
/// The result is clamped to `[0, width] × [0, height]`, so a pointer that
/// left the element (or the viewport) pins to the nearest edge.
pub fn to_local(viewport: Point, bounds: Bounds) -> Point {
    Point {
        x: clamp_axis(viewport.x - bounds.origin.x, bounds.size.width),
        y: clamp_axis(viewport.y - bounds.origin.y, bounds.size.height),
    }
}

fn scale_axis(value: f64, display: f64, native: u32) -> u32 {
    if !(display.is_finite() && display > 0.0) {
        return 0;
    }
    let scaled = (value * native as f64 / display).round();
    clamp_axis(scaled, native as f64) as u32
}

/// Rescale a local point into the native pixel grid, rounding to the
/// nearest pixel. Output always lies in `[0, native.0] × [0, native.1]`.
pub fn to_native(local: Point, display: Size, native: (u32, u32)) -> (u32, u32) {
    (
        scale_axis(local.x, display.width, native.0),
        scale_axis(local.y, display.height, native.1),
    )
}

/// Map a local rectangle into native space by mapping both corners.
///
/// Mapping corners (not origin + extent) keeps the far edge inside the
/// native grid even when rounding pushes both ends the same way.
pub fn to_native_rect(local: LocalRect, display: Size, native: (u32, u32)) -> NativeRect {
    let (x0, y0) = to_native(Point::new(local.x, local.y), display, native);
    let (x1, y1) = to_native(
        Point::new(local.x + local.width, local.y + local.height),
        display,
        native,
    );
    NativeRect {
        x: x0,
        y: y0,
        width: x1.saturating_sub(x0),
        height: y1.saturating_sub(y0),
    }
}
