//! Surface binder — makes every image on the page drag-selectable.
//!
//! The binder owns the idempotency guard (which elements are already bound)
//! and the live sessions, keyed by the input that drives them. The host
//! forwards element-level gesture starts and window-level moves/ends here.

use crate::extract::{Encoder, PngEncoder};
use crate::geometry::Point;
use crate::host::{ElementId, InputId, Page, SessionId, VisualSource};
use crate::relay::{Publisher, RelayMessage};
use crate::session::{Disposition, SelectionSession, SessionOutcome, SessionState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Result of one `bind` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub newly_bound: usize,
    pub already_bound: usize,
}

/// Pointer-down or touch-start directly over an element.
#[derive(Debug, Clone)]
pub struct GestureStart {
    pub element: ElementId,
    pub input: InputId,
    pub point: Point,
    /// Fingers on the surface. Only single-finger touches start a session.
    pub touch_count: usize,
}

impl GestureStart {
    pub fn mouse(element: ElementId, point: Point) -> Self {
        Self {
            element,
            input: InputId::Mouse,
            point,
            touch_count: 0,
        }
    }

    pub fn touch(element: ElementId, id: i64, point: Point) -> Self {
        Self {
            element,
            input: InputId::Touch(id),
            point,
            touch_count: 1,
        }
    }
}

/// Window-level events delivered while a gesture is live.
#[derive(Debug, Clone, Copy)]
pub enum GestureEvent {
    Move { input: InputId, point: Point },
    End { input: InputId, point: Point },
    Cancel { input: InputId },
}

impl GestureEvent {
    fn input(&self) -> InputId {
        match *self {
            GestureEvent::Move { input, .. }
            | GestureEvent::End { input, .. }
            | GestureEvent::Cancel { input } => input,
        }
    }
}

/// What the host should do with a window event.
#[derive(Debug)]
pub struct Dispatch {
    pub disposition: Disposition,
    /// Set when the event ended a session.
    pub outcome: Option<SessionOutcome>,
}

impl Dispatch {
    fn ignored() -> Self {
        Self {
            disposition: Disposition::Ignored,
            outcome: None,
        }
    }
}

pub struct SurfaceBinder {
    page: Arc<dyn Page>,
    publisher: Arc<dyn Publisher>,
    encoder: Arc<dyn Encoder>,
    bound: Mutex<HashMap<ElementId, Arc<dyn VisualSource>>>,
    sessions: Mutex<HashMap<InputId, SelectionSession>>,
    next_session: AtomicU64,
}

impl SurfaceBinder {
    pub fn new(page: Arc<dyn Page>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            page,
            publisher,
            encoder: Arc::new(PngEncoder),
            bound: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Bind every eligible image under `root` that is not bound yet.
    pub fn bind(&self, root: &ElementId) -> BindReport {
        let mut report = BindReport::default();
        let mut bound = match self.bound.lock() {
            Ok(bound) => bound,
            Err(_) => return report,
        };

        for source in self.page.visual_sources(root) {
            let id = source.id();
            if bound.contains_key(&id) {
                report.already_bound += 1;
                continue;
            }
            self.page.mark_selectable(&id);
            bound.insert(id, source);
            report.newly_bound += 1;
        }

        log::info!(
            "[BINDER] Bound {} image(s) under {} ({} already bound)",
            report.newly_bound,
            root,
            report.already_bound
        );
        report
    }

    pub fn is_bound(&self, element: &ElementId) -> bool {
        self.bound
            .lock()
            .map(|b| b.contains_key(element))
            .unwrap_or(false)
    }

    /// Handle a message from the consumer context.
    pub fn handle_message(&self, message: &RelayMessage) {
        if let RelayMessage::EnableCrop = message {
            self.bind(&ElementId::root());
        }
    }

    /// Element-level pointer-down / touch-start.
    ///
    /// Returns `Consumed` when a session started (the host must suppress the
    /// default action, which also suppresses compatibility mouse events that
    /// would follow a touch).
    pub fn gesture_start(&self, start: GestureStart) -> Disposition {
        if let InputId::Touch(_) = start.input {
            if start.touch_count != 1 {
                return Disposition::Ignored;
            }
        }

        let source = match self.bound.lock() {
            Ok(bound) => match bound.get(&start.element) {
                Some(source) => source.clone(),
                None => return Disposition::Ignored,
            },
            Err(_) => return Disposition::Ignored,
        };

        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(_) => return Disposition::Ignored,
        };

        // One physical gesture, one session.
        if sessions.contains_key(&start.input) {
            return Disposition::Ignored;
        }
        if start.input == InputId::Mouse
            && sessions.keys().any(|k| matches!(k, InputId::Touch(_)))
        {
            log::debug!("[BINDER] Ignoring mouse-down during touch gesture");
            return Disposition::Ignored;
        }
        if sessions.values().any(|s| s.source().id() == start.element) {
            return Disposition::Ignored;
        }

        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let session = SelectionSession::begin(id, source, start.input, start.point, self.page.clone());
        sessions.insert(start.input, session);
        Disposition::Consumed
    }

    /// Window-level move / end / cancel.
    pub fn window_event(&self, event: GestureEvent) -> Dispatch {
        let input = event.input();
        let mut session = {
            let mut sessions = match self.sessions.lock() {
                Ok(sessions) => sessions,
                Err(_) => return Dispatch::ignored(),
            };
            if let GestureEvent::Move { point, .. } = event {
                return match sessions.get_mut(&input) {
                    Some(session) => Dispatch {
                        disposition: session.on_move(input, point),
                        outcome: None,
                    },
                    None => Dispatch::ignored(),
                };
            }
            match sessions.remove(&input) {
                Some(session) => session,
                None => return Dispatch::ignored(),
            }
        };

        // Extraction and publishing run outside the sessions lock.
        let outcome = match event {
            GestureEvent::End { point, .. } => session.on_end(
                input,
                point,
                self.encoder.as_ref(),
                self.publisher.as_ref(),
            ),
            _ => {
                session.cancel();
                Some(SessionOutcome::Discarded)
            }
        };

        Dispatch {
            disposition: Disposition::Consumed,
            outcome,
        }
    }

    /// State of the session driven by `input`, `Idle` when there is none.
    pub fn session_state(&self, input: InputId) -> SessionState {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&input).map(|s| s.state()))
            .unwrap_or(SessionState::Idle)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractedPayload, ImageSource};
    use crate::geometry::Bounds;
    use crate::host::headless::{HeadlessImage, HeadlessPage};
    use crate::relay::DeliveryOutcome;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ExtractedPayload>>);

    impl Publisher for Collect {
        fn publish(&self, payload: ExtractedPayload) -> DeliveryOutcome {
            self.0.lock().unwrap().push(payload);
            DeliveryOutcome::Queued
        }
    }

    fn setup() -> (Arc<HeadlessPage>, Arc<Collect>, SurfaceBinder) {
        let page = Arc::new(HeadlessPage::new());
        for (i, left) in [0.0, 500.0].iter().enumerate() {
            page.insert(HeadlessImage::new(
                format!("img-{}", i),
                ImageSource::new(image::RgbaImage::new(200, 200).into()),
                Bounds::new(*left, 0.0, 200.0, 200.0),
            ));
        }
        let publisher = Arc::new(Collect::default());
        let binder = SurfaceBinder::new(page.clone(), publisher.clone());
        (page, publisher, binder)
    }

    fn img(i: usize) -> ElementId {
        ElementId::new(format!("img-{}", i))
    }

    #[test]
    fn bind_is_idempotent() {
        let (page, _, binder) = setup();
        assert_eq!(binder.bind(&ElementId::root()), BindReport { newly_bound: 2, already_bound: 0 });
        assert_eq!(binder.bind(&ElementId::root()), BindReport { newly_bound: 0, already_bound: 2 });
        page.with_log(|log| assert_eq!(log.selectable.len(), 2));
    }

    #[test]
    fn late_images_need_rebind() {
        let (page, _, binder) = setup();
        binder.bind(&ElementId::root());
        page.insert(HeadlessImage::new(
            "late",
            ImageSource::new(image::RgbaImage::new(10, 10).into()),
            Bounds::new(0.0, 300.0, 10.0, 10.0),
        ));
        assert!(!binder.is_bound(&ElementId::new("late")));
        assert_eq!(
            binder.gesture_start(GestureStart::mouse(ElementId::new("late"), Point::new(1.0, 301.0))),
            Disposition::Ignored
        );

        binder.handle_message(&RelayMessage::EnableCrop);
        assert!(binder.is_bound(&ElementId::new("late")));
    }

    #[test]
    fn unbound_element_does_not_start() {
        let (_, _, binder) = setup();
        assert_eq!(
            binder.gesture_start(GestureStart::mouse(img(0), Point::new(10.0, 10.0))),
            Disposition::Ignored
        );
        assert_eq!(binder.active_sessions(), 0);
    }

    #[test]
    fn mouse_drag_commits() {
        let (page, publisher, binder) = setup();
        binder.bind(&ElementId::root());

        assert_eq!(
            binder.gesture_start(GestureStart::mouse(img(0), Point::new(10.0, 10.0))),
            Disposition::Consumed
        );
        assert_eq!(binder.session_state(InputId::Mouse), SessionState::Active);
        binder.window_event(GestureEvent::Move { input: InputId::Mouse, point: Point::new(40.0, 30.0) });
        let dispatch = binder.window_event(GestureEvent::End {
            input: InputId::Mouse,
            point: Point::new(60.0, 50.0),
        });

        assert!(matches!(dispatch.outcome, Some(SessionOutcome::Committed(DeliveryOutcome::Queued))));
        assert_eq!(binder.session_state(InputId::Mouse), SessionState::Idle);
        assert_eq!(publisher.0.lock().unwrap()[0].width(), 50);
        page.with_log(|log| {
            assert_eq!(log.live_overlays(), 0);
            assert!(log.listeners.is_empty());
        });
    }

    #[test]
    fn touch_gesture_blocks_compat_mouse_down() {
        let (page, _, binder) = setup();
        binder.bind(&ElementId::root());

        assert_eq!(
            binder.gesture_start(GestureStart::touch(img(0), 7, Point::new(10.0, 10.0))),
            Disposition::Consumed
        );
        assert_eq!(
            binder.gesture_start(GestureStart::mouse(img(0), Point::new(10.0, 10.0))),
            Disposition::Ignored
        );
        assert_eq!(binder.active_sessions(), 1);
        page.with_log(|log| assert_eq!(log.overlays_created, 1));
    }

    #[test]
    fn multi_finger_touch_is_ignored() {
        let (_, _, binder) = setup();
        binder.bind(&ElementId::root());
        let mut start = GestureStart::touch(img(0), 1, Point::new(10.0, 10.0));
        start.touch_count = 2;
        assert_eq!(binder.gesture_start(start), Disposition::Ignored);
    }

    #[test]
    fn concurrent_touches_on_different_images_are_independent() {
        let (_, publisher, binder) = setup();
        binder.bind(&ElementId::root());

        binder.gesture_start(GestureStart::touch(img(0), 1, Point::new(10.0, 10.0)));
        binder.gesture_start(GestureStart::touch(img(1), 2, Point::new(510.0, 10.0)));
        assert_eq!(binder.active_sessions(), 2);

        binder.window_event(GestureEvent::Move { input: InputId::Touch(2), point: Point::new(590.0, 90.0) });
        binder.window_event(GestureEvent::End { input: InputId::Touch(1), point: Point::new(30.0, 30.0) });
        assert_eq!(binder.active_sessions(), 1);
        binder.window_event(GestureEvent::End { input: InputId::Touch(2), point: Point::new(590.0, 90.0) });

        let published = publisher.0.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].width(), 20);
        assert_eq!(published[1].width(), 80);
    }

    #[test]
    fn end_for_other_input_is_ignored() {
        let (_, publisher, binder) = setup();
        binder.bind(&ElementId::root());
        binder.gesture_start(GestureStart::touch(img(0), 1, Point::new(10.0, 10.0)));

        let dispatch = binder.window_event(GestureEvent::End { input: InputId::Touch(9), point: Point::new(50.0, 50.0) });
        assert_eq!(dispatch.disposition, Disposition::Ignored);
        assert_eq!(binder.active_sessions(), 1);
        assert!(publisher.0.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_discards() {
        let (page, publisher, binder) = setup();
        binder.bind(&ElementId::root());
        binder.gesture_start(GestureStart::mouse(img(0), Point::new(10.0, 10.0)));
        binder.window_event(GestureEvent::Move { input: InputId::Mouse, point: Point::new(90.0, 90.0) });

        let dispatch = binder.window_event(GestureEvent::Cancel { input: InputId::Mouse });
        assert!(matches!(dispatch.outcome, Some(SessionOutcome::Discarded)));
        assert!(publisher.0.lock().unwrap().is_empty());
        page.with_log(|log| assert_eq!(log.live_overlays(), 0));
    }
}
