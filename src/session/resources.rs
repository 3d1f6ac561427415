//! Scoped ownership of a session's overlay and window listeners.

use crate::host::{InputDevice, Overlay, Page, SessionId};
use std::sync::Arc;

/// Holds what a session acquired from the page. `release` runs at most
/// once; `Drop` calls it so an abandoned session never leaks an overlay.
pub(super) struct SessionResources {
    page: Arc<dyn Page>,
    overlay: Box<dyn Overlay>,
    id: SessionId,
    device: InputDevice,
    released: bool,
}

impl SessionResources {
    pub(super) fn acquire(
        page: Arc<dyn Page>,
        overlay: Box<dyn Overlay>,
        id: SessionId,
        device: InputDevice,
    ) -> Self {
        page.attach_window_listeners(id, device);
        Self {
            page,
            overlay,
            id,
            device,
            released: false,
        }
    }

    pub(super) fn overlay(&mut self) -> &mut dyn Overlay {
        self.overlay.as_mut()
    }

    pub(super) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.overlay.remove();
        self.page.detach_window_listeners(self.id, self.device);
    }
}

impl Drop for SessionResources {
    fn drop(&mut self) {
        self.release();
    }
}
