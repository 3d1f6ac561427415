//! Headless host: an in-memory page with images laid out at fixed boxes.
//!
//! Overlay and listener activity is recorded in a shared `PageLog` so the
//! CLI can report it and tests can assert on it.

use super::{ElementId, InputDevice, Overlay, Page, SessionId, VisualSource};
use crate::extract::{ExtractError, ImageSource, PixelSource};
use crate::geometry::{Bounds, LocalRect, NativeRect, Size};
use image::RgbaImage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// An image placed on the headless page.
pub struct HeadlessImage {
    id: ElementId,
    container: ElementId,
    source: ImageSource,
    bounds: Mutex<Bounds>,
    display: Size,
}

impl HeadlessImage {
    /// Place `source` at `bounds`; the display size equals the box size.
    pub fn new(id: impl Into<String>, source: ImageSource, bounds: Bounds) -> Self {
        Self {
            id: ElementId::new(id),
            container: ElementId::root(),
            source,
            bounds: Mutex::new(bounds),
            display: bounds.size,
        }
    }

    /// Put the image inside a container other than the document root.
    pub fn in_container(mut self, container: ElementId) -> Self {
        self.container = container;
        self
    }

    /// Simulate a layout shift (scroll, reflow).
    pub fn move_to(&self, bounds: Bounds) {
        if let Ok(mut guard) = self.bounds.lock() {
            *guard = bounds;
        }
    }
}

impl PixelSource for HeadlessImage {
    fn native_size(&self) -> (u32, u32) {
        self.source.native_size()
    }

    fn read_pixels(&self, rect: NativeRect) -> Result<RgbaImage, ExtractError> {
        self.source.read_pixels(rect)
    }
}

impl VisualSource for HeadlessImage {
    fn id(&self) -> ElementId {
        self.id.clone()
    }

    fn bounding_box(&self) -> Bounds {
        self.bounds.lock().map(|b| *b).unwrap_or_default()
    }

    fn display_size(&self) -> Size {
        self.display
    }
}

/// Everything the headless page has been asked to do.
#[derive(Debug, Default)]
pub struct PageLog {
    pub selectable: Vec<ElementId>,
    pub overlays_created: usize,
    pub overlays_removed: usize,
    pub overlay_bounds: Vec<Bounds>,
    pub last_selection: Option<LocalRect>,
    pub selection_visible: bool,
    pub listeners: HashSet<(SessionId, InputDevice)>,
}

impl PageLog {
    pub fn live_overlays(&self) -> usize {
        self.overlays_created - self.overlays_removed
    }
}

struct HeadlessOverlay {
    log: Arc<Mutex<PageLog>>,
    removed: bool,
}

impl Overlay for HeadlessOverlay {
    fn draw_selection(&mut self, rect: LocalRect) {
        if let Ok(mut log) = self.log.lock() {
            log.last_selection = Some(rect);
            log.selection_visible = true;
        }
    }

    fn hide_selection(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.selection_visible = false;
        }
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Ok(mut log) = self.log.lock() {
            log.overlays_removed += 1;
            log.selection_visible = false;
        }
    }
}

#[derive(Default)]
pub struct HeadlessPage {
    images: Mutex<Vec<Arc<HeadlessImage>>>,
    log: Arc<Mutex<PageLog>>,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image to the page. Returns a handle for later layout changes.
    pub fn insert(&self, image: HeadlessImage) -> Arc<HeadlessImage> {
        let image = Arc::new(image);
        if let Ok(mut images) = self.images.lock() {
            images.push(image.clone());
        }
        image
    }

    /// Run `f` against the activity log.
    pub fn with_log<R>(&self, f: impl FnOnce(&PageLog) -> R) -> R {
        match self.log.lock() {
            Ok(log) => f(&log),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl Page for HeadlessPage {
    fn visual_sources(&self, root: &ElementId) -> Vec<Arc<dyn VisualSource>> {
        let images = match self.images.lock() {
            Ok(images) => images,
            Err(_) => return Vec::new(),
        };
        images
            .iter()
            .filter(|img| *root == ElementId::root() || img.container == *root)
            .map(|img| img.clone() as Arc<dyn VisualSource>)
            .collect()
    }

    fn mark_selectable(&self, element: &ElementId) {
        if let Ok(mut log) = self.log.lock() {
            log.selectable.push(element.clone());
        }
    }

    fn create_overlay(&self, bounds: Bounds) -> Box<dyn Overlay> {
        if let Ok(mut log) = self.log.lock() {
            log.overlays_created += 1;
            log.overlay_bounds.push(bounds);
        }
        Box::new(HeadlessOverlay {
            log: self.log.clone(),
            removed: false,
        })
    }

    fn attach_window_listeners(&self, session: SessionId, device: InputDevice) {
        if let Ok(mut log) = self.log.lock() {
            log.listeners.insert((session, device));
        }
    }

    fn detach_window_listeners(&self, session: SessionId, device: InputDevice) {
        if let Ok(mut log) = self.log.lock() {
            log.listeners.remove(&(session, device));
        }
    }
}
