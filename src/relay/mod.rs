//! Result relay — public API.
//!
//! At-least-once delivery of an extracted payload:
//! 1. persist the delivery record (always first),
//! 2. try a live send to an open consumer,
//! 3. if nobody is listening, open a consumer surface (panel, then
//!    standalone window).
//!
//! A consumer reads the record on startup, so the live send is an
//! optimization. Redelivering the same record is expected.

mod channel;
mod launcher;
mod message;
mod store;

pub use channel::{BroadcastChannel, ChannelError, ConsumerChannel};
pub use launcher::{LaunchError, ProcessLauncher, SurfaceLauncher, WindowSpec};
pub use message::RelayMessage;
pub use store::{
    DeliveryRecord, FileStore, KeyValueStore, MemoryStore, StoreError, DELIVERY_RECORD_KEY,
};

use crate::extract::ExtractedPayload;
use std::sync::Arc;

/// What `publish` achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A live consumer received the message.
    Delivered,
    /// Persisted; a consumer will pick it up on startup.
    Queued,
    /// Neither persisted nor delivered.
    Failed,
}

/// Sink for committed selections.
pub trait Publisher: Send + Sync {
    fn publish(&self, payload: ExtractedPayload) -> DeliveryOutcome;
}

pub struct ResultRelay {
    record: DeliveryRecord,
    channel: Arc<dyn ConsumerChannel>,
    launcher: Arc<dyn SurfaceLauncher>,
    window: WindowSpec,
}

impl ResultRelay {
    pub fn new(
        record: DeliveryRecord,
        channel: Arc<dyn ConsumerChannel>,
        launcher: Arc<dyn SurfaceLauncher>,
    ) -> Self {
        Self {
            record,
            channel,
            launcher,
            window: WindowSpec::default(),
        }
    }

    pub fn with_window(mut self, window: WindowSpec) -> Self {
        self.window = window;
        self
    }

    pub fn record(&self) -> &DeliveryRecord {
        &self.record
    }

    /// Persist, notify, launch. Never fails loudly.
    pub fn publish_data_url(&self, data_url: String) -> DeliveryOutcome {
        let persisted = match self.record.save(&data_url) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[RELAY] Failed to persist delivery record: {}", e);
                false
            }
        };

        match self.channel.send(&RelayMessage::cropped_image(data_url)) {
            Ok(()) => {
                log::info!("[RELAY] Delivered to live consumer (persisted={})", persisted);
                return DeliveryOutcome::Delivered;
            }
            Err(e) => log::debug!("[RELAY] Live delivery skipped: {}", e),
        }

        // No consumer is confirmed either way, so one is opened even when the
        // record could not be written.
        self.launch_consumer();

        if persisted {
            DeliveryOutcome::Queued
        } else {
            log::error!("[RELAY] Payload neither persisted nor delivered");
            DeliveryOutcome::Failed
        }
    }

    /// Open the consumer panel, falling back to a standalone window.
    /// Failure of both is logged and swallowed.
    fn launch_consumer(&self) {
        let panel_err = match self.launcher.open_panel() {
            Ok(()) => return,
            Err(e) => e,
        };
        log::debug!("[RELAY] Panel unavailable ({}), opening standalone window", panel_err);

        if let Err(e) = self.launcher.open_window(&self.window) {
            log::warn!(
                "[RELAY] Could not open consumer surface: {}. Record is kept for next startup",
                e
            );
        }
    }
}

impl Publisher for ResultRelay {
    fn publish(&self, payload: ExtractedPayload) -> DeliveryOutcome {
        log::info!(
            "[RELAY] Publishing {:?} {}x{} ({} bytes)",
            payload.kind(),
            payload.width(),
            payload.height(),
            payload.bytes().len()
        );
        self.publish_data_url(payload.to_data_url())
    }
}
