//! Consumer adapter — the surface that shows and forwards a payload.
//!
//! Startup always reads the delivery record, so a consumer opened after
//! the fact renders the same thing a live one would have. Live messages
//! arrive over the relay's broadcast channel.

mod report;
mod upload;

pub use report::{AnalysisReport, RenderedResult, Verdict};
pub use upload::{HttpUploader, UploadError, UploadResponse, Uploader};

use crate::dataurl::DataUrl;
use crate::relay::{DeliveryRecord, RelayMessage};
use tokio::sync::broadcast;

/// Everything the consumer surface displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerView {
    /// Data URL of the image being shown, if any.
    pub preview: Option<String>,
    pub status: String,
    pub result: Option<RenderedResult>,
}

pub struct ConsumerAdapter<U: Uploader> {
    record: DeliveryRecord,
    uploader: U,
    view: ConsumerView,
}

impl<U: Uploader> ConsumerAdapter<U> {
    pub fn new(record: DeliveryRecord, uploader: U) -> Self {
        Self {
            record,
            uploader,
            view: ConsumerView::default(),
        }
    }

    pub fn view(&self) -> &ConsumerView {
        &self.view
    }

    /// Read the delivery record and, if it holds a valid image, render and
    /// upload it. Returns whether anything was shown.
    pub async fn start(&mut self) -> bool {
        let data_url = match self.record.load() {
            Ok(Some(data_url)) => data_url,
            Ok(None) => {
                log::debug!("[CONSUMER] No delivery record on startup");
                return false;
            }
            Err(e) => {
                log::warn!("[CONSUMER] Delivery record unreadable, treating as empty: {}", e);
                return false;
            }
        };
        self.present(data_url).await
    }

    /// Handle one live message from the producer.
    pub async fn on_message(&mut self, message: RelayMessage) -> bool {
        match message {
            RelayMessage::CroppedImage { data_url } => {
                if let Err(e) = self.record.save(&data_url) {
                    log::warn!("[CONSUMER] Failed to persist received image: {}", e);
                }
                self.present(data_url).await
            }
            RelayMessage::EnableCrop => false,
        }
    }

    /// Process live messages until every sender is gone.
    ///
    /// If the receiver falls behind, the skipped messages are replaced by a
    /// fresh read of the record, which always holds the latest payload. The
    /// messages still buffered are older than the record and are dropped.
    pub async fn run(&mut self, mut rx: broadcast::Receiver<RelayMessage>) {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    self.on_message(message).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[CONSUMER] Skipped {} message(s), reloading record", skipped);
                    self.start().await;
                    rx = rx.resubscribe();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    log::debug!("[CONSUMER] Channel closed");
                    break;
                }
            }
        }
    }

    /// Remove the record and reset the surface.
    pub fn clear(&mut self) {
        if let Err(e) = self.record.clear() {
            log::warn!("[CONSUMER] Failed to clear delivery record: {}", e);
        }
        self.view = ConsumerView::default();
    }

    async fn present(&mut self, data_url: String) -> bool {
        let image = match DataUrl::parse(&data_url) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("[CONSUMER] Malformed delivery record ignored: {}", e);
                return false;
            }
        };

        self.view.preview = Some(data_url);
        self.view.status = "Uploading cropped image...".to_string();
        self.view.result = None;

        match self.uploader.upload(&image).await {
            Ok(resp) => {
                self.view.status = if resp.ok {
                    "Upload complete".to_string()
                } else {
                    format!("Upload failed ({})", resp.status)
                };
                self.view.result = Some(RenderedResult::from_body(&resp.body));
            }
            Err(e) => {
                log::warn!("[CONSUMER] Upload failed: {}", e);
                self.view.status = "Upload error".to_string();
                self.view.result = Some(RenderedResult::Text(e.to_string()));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataurl;
    use crate::relay::{BroadcastChannel, ConsumerChannel, MemoryStore};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeUploader {
        calls: Arc<Mutex<Vec<DataUrl>>>,
        status: u16,
    }

    impl Uploader for FakeUploader {
        async fn upload(&self, image: &DataUrl) -> Result<UploadResponse, UploadError> {
            self.calls.lock().unwrap().push(image.clone());
            Ok(UploadResponse {
                status: self.status,
                ok: (200..300).contains(&self.status),
                body: r#"{"type":"image","result":{"Realism":0.2,"Deepfake":0.8}}"#.to_string(),
            })
        }
    }

    fn adapter(status: u16) -> (DeliveryRecord, FakeUploader, ConsumerAdapter<FakeUploader>) {
        let record = DeliveryRecord::new(Arc::new(MemoryStore::new()));
        let uploader = FakeUploader {
            status,
            ..Default::default()
        };
        let adapter = ConsumerAdapter::new(record.clone(), uploader.clone());
        (record, uploader, adapter)
    }

    #[tokio::test]
    async fn start_without_record_shows_nothing() {
        let (_, uploader, mut consumer) = adapter(200);
        assert!(!consumer.start().await);
        assert_eq!(consumer.view(), &ConsumerView::default());
        assert!(uploader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_renders_and_uploads_record() {
        let (record, uploader, mut consumer) = adapter(200);
        let url = dataurl::encode("image/png", &[9, 9, 9]);
        record.save(&url).unwrap();

        assert!(consumer.start().await);
        assert_eq!(consumer.view().preview.as_deref(), Some(url.as_str()));
        assert_eq!(consumer.view().status, "Upload complete");
        assert!(matches!(consumer.view().result, Some(RenderedResult::Report(_))));
        assert_eq!(uploader.calls.lock().unwrap()[0].bytes, vec![9, 9, 9]);
    }

    #[tokio::test]
    async fn malformed_record_is_treated_as_absent() {
        let (record, uploader, mut consumer) = adapter(200);
        record.save("data:image/png;base64,%%%").unwrap();

        assert!(!consumer.start().await);
        assert!(consumer.view().preview.is_none());
        assert!(uploader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_status_is_shown() {
        let (record, _, mut consumer) = adapter(503);
        record.save(&dataurl::encode("image/png", &[1])).unwrap();
        consumer.start().await;
        assert_eq!(consumer.view().status, "Upload failed (503)");
    }

    #[tokio::test]
    async fn live_message_is_persisted() {
        let (record, _, mut consumer) = adapter(200);
        let url = dataurl::encode("image/png", &[4, 2]);
        assert!(consumer.on_message(RelayMessage::cropped_image(url.clone())).await);
        assert_eq!(record.load().unwrap(), Some(url));
    }

    fn uploaded(uploader: &FakeUploader) -> Vec<Vec<u8>> {
        uploader
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|image| image.bytes.clone())
            .collect()
    }

    #[tokio::test]
    async fn run_presents_live_messages_in_order() {
        let (record, uploader, mut consumer) = adapter(200);
        let channel = BroadcastChannel::default();
        let rx = channel.subscribe();

        for n in 1..=2u8 {
            channel
                .send(&RelayMessage::cropped_image(dataurl::encode("image/png", &[n])))
                .unwrap();
        }
        drop(channel);

        consumer.run(rx).await;
        assert_eq!(uploaded(&uploader), vec![vec![1], vec![2]]);
        assert_eq!(record.load().unwrap(), Some(dataurl::encode("image/png", &[2])));
        assert_eq!(consumer.view().status, "Upload complete");
    }

    #[tokio::test]
    async fn run_after_lag_shows_only_the_latest_record() {
        let (record, uploader, mut consumer) = adapter(200);
        let channel = BroadcastChannel::new(1);
        let rx = channel.subscribe();

        for n in 1..=5u8 {
            let url = dataurl::encode("image/png", &[n]);
            record.save(&url).unwrap();
            channel.send(&RelayMessage::cropped_image(url)).unwrap();
        }
        drop(channel);

        consumer.run(rx).await;
        assert_eq!(uploaded(&uploader), vec![vec![5]]);
        assert_eq!(
            consumer.view().preview,
            Some(dataurl::encode("image/png", &[5]))
        );
    }

    #[tokio::test]
    async fn run_returns_when_channel_closes() {
        let (_, uploader, mut consumer) = adapter(200);
        let channel = BroadcastChannel::default();
        let rx = channel.subscribe();
        drop(channel);

        consumer.run(rx).await;
        assert!(uploaded(&uploader).is_empty());
        assert_eq!(consumer.view(), &ConsumerView::default());
    }

    #[tokio::test]
    async fn clear_resets_view_and_record() {
        let (record, _, mut consumer) = adapter(200);
        record.save(&dataurl::encode("image/png", &[1])).unwrap();
        consumer.start().await;

        consumer.clear();
        assert_eq!(consumer.view(), &ConsumerView::default());
        assert_eq!(record.load().unwrap(), None);
        assert!(!consumer.start().await);
    }
}
