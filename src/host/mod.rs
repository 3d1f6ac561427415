//! Host capabilities — the page the engine is embedded in.
//!
//! The engine never touches a real DOM. A host implements these traits:
//! it enumerates images, paints the selection overlay, and routes
//! window-level gesture events back into the binder.
//!
//! `headless` is an in-memory host used by the CLI and the tests.

pub mod headless;

use crate::extract::PixelSource;
use crate::geometry::{Bounds, LocalRect, Size};

/// Stable identity of an element on the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The document root. `bind` on it covers the whole page.
    pub fn root() -> Self {
        Self("document".to_string())
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which family of window listeners a session needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputDevice {
    Mouse,
    Touch,
}

/// The input that drives one gesture. Touch ids come from the host's
/// touch identifiers, so two fingers never share a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    Mouse,
    Touch(i64),
}

impl InputId {
    pub fn device(&self) -> InputDevice {
        match self {
            InputId::Mouse => InputDevice::Mouse,
            InputId::Touch(_) => InputDevice::Touch,
        }
    }
}

/// Identifier the host uses to scope window listeners to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// A displayed raster image eligible for region selection.
pub trait VisualSource: PixelSource {
    fn id(&self) -> ElementId;

    /// Current box in viewport coordinates.
    fn bounding_box(&self) -> Bounds;

    /// Laid-out (CSS) width and height. Not assumed equal to the native size.
    fn display_size(&self) -> Size;
}

/// The transient selection layer placed over one image.
pub trait Overlay: Send {
    /// Show the live rectangle at `rect` (local display space).
    fn draw_selection(&mut self, rect: LocalRect);

    fn hide_selection(&mut self);

    /// Detach the overlay from the page. Called exactly once.
    fn remove(&mut self);
}

pub trait Page: Send + Sync {
    /// Every eligible image under `root`, in document order.
    fn visual_sources(&self, root: &ElementId) -> Vec<std::sync::Arc<dyn VisualSource>>;

    /// Crosshair cursor, native drag ghosting disabled.
    fn mark_selectable(&self, element: &ElementId);

    /// Create an overlay positioned and sized to `bounds`.
    fn create_overlay(&self, bounds: Bounds) -> Box<dyn Overlay>;

    fn attach_window_listeners(&self, session: SessionId, device: InputDevice);

    fn detach_window_listeners(&self, session: SessionId, device: InputDevice);
}
