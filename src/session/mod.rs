//! Selection session — one drag gesture over one image.
//!
//! States: Idle → Active → Finalizing → (Committed | Discarded).
//! A session is created Active by `begin` and ends in a terminal state on
//! gesture end or cancel. The overlay and the window listeners it acquired
//! are released on every terminal transition, and on drop.

mod resources;

use crate::extract::{self, Encoder, ExtractError};
use crate::geometry::{self, Bounds, Point, SelectionRect};
use crate::host::{InputId, Page, SessionId, VisualSource};
use crate::relay::{DeliveryOutcome, Publisher};
use resources::SessionResources;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No overlay exists for this input.
    Idle,
    Active,
    Finalizing,
    Committed,
    Discarded,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Discarded)
    }
}

/// How a finished session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A payload was extracted and handed to the relay.
    Committed(DeliveryOutcome),
    /// Zero-area selection or explicit cancel. Nothing was extracted.
    Discarded,
    /// Extraction failed (e.g. unreadable source). Reported, not fatal.
    Failed(ExtractError),
}

/// Whether the host should suppress the event's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ignored,
    Consumed,
}

pub struct SelectionSession {
    id: SessionId,
    input: InputId,
    source: Arc<dyn VisualSource>,
    /// Viewport box captured at gesture start. Not re-queried.
    bounds: Bounds,
    selection: SelectionRect,
    state: SessionState,
    resources: SessionResources,
}

impl SelectionSession {
    /// Start a gesture at `viewport_point` over `source`.
    pub fn begin(
        id: SessionId,
        source: Arc<dyn VisualSource>,
        input: InputId,
        viewport_point: Point,
        page: Arc<dyn Page>,
    ) -> Self {
        let bounds = source.bounding_box();
        let overlay = page.create_overlay(bounds);
        let mut resources = SessionResources::acquire(page, overlay, id, input.device());

        let anchor = geometry::to_local(viewport_point, bounds);
        let selection = SelectionRect::anchored(anchor);
        resources.overlay().draw_selection(selection.normalized());

        log::debug!(
            "[SESSION] {:?} started on {} by {:?} at ({:.1}, {:.1})",
            id,
            source.id(),
            input,
            anchor.x,
            anchor.y
        );

        Self {
            id,
            input,
            source,
            bounds,
            selection,
            state: SessionState::Active,
            resources,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn input(&self) -> InputId {
        self.input
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> &Arc<dyn VisualSource> {
        &self.source
    }

    pub fn selection(&self) -> SelectionRect {
        self.selection
    }

    /// Pointer/touch moved while down.
    pub fn on_move(&mut self, input: InputId, viewport_point: Point) -> Disposition {
        if self.state != SessionState::Active || input != self.input {
            return Disposition::Ignored;
        }
        self.selection
            .extend_to(geometry::to_local(viewport_point, self.bounds));
        self.resources
            .overlay()
            .draw_selection(self.selection.normalized());
        Disposition::Consumed
    }

    /// Pointer-up / touch-end. Returns `None` when the event belongs to a
    /// different input or the session already ended.
    pub fn on_end(
        &mut self,
        input: InputId,
        viewport_point: Point,
        encoder: &dyn Encoder,
        publisher: &dyn Publisher,
    ) -> Option<SessionOutcome> {
        if self.state != SessionState::Active || input != self.input {
            return None;
        }
        self.selection
            .extend_to(geometry::to_local(viewport_point, self.bounds));
        self.state = SessionState::Finalizing;
        self.resources.overlay().hide_selection();

        let outcome = self.finalize(encoder, publisher);
        self.state = match outcome {
            SessionOutcome::Committed(_) => SessionState::Committed,
            _ => SessionState::Discarded,
        };
        self.resources.release();
        Some(outcome)
    }

    /// Abandon the gesture without extracting (e.g. Escape).
    pub fn cancel(&mut self) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        log::debug!("[SESSION] {:?} cancelled", self.id);
        self.state = SessionState::Discarded;
        self.resources.release();
        true
    }

    fn finalize(&self, encoder: &dyn Encoder, publisher: &dyn Publisher) -> SessionOutcome {
        let local = self.selection.normalized().rounded();
        if local.is_empty() {
            log::debug!("[SESSION] {:?} zero-area selection, discarded", self.id);
            return SessionOutcome::Discarded;
        }

        let native = geometry::to_native_rect(
            local,
            self.source.display_size(),
            self.source.native_size(),
        );
        if native.is_empty() {
            log::debug!(
                "[SESSION] {:?} selection {:?} collapses to zero native pixels",
                self.id,
                local
            );
            return SessionOutcome::Discarded;
        }

        match extract::extract(self.source.as_ref(), native, encoder) {
            Ok(payload) => SessionOutcome::Committed(publisher.publish(payload)),
            Err(ExtractError::EmptyRegion) => SessionOutcome::Discarded,
            Err(e) => {
                log::warn!("[SESSION] {:?} extraction on {} failed: {}", self.id, self.source.id(), e);
                SessionOutcome::Failed(e)
            }
        }
    }
}
