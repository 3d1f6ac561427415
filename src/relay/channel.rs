//! Live notification channel to an open consumer.

use super::RelayMessage;
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChannelError {
    /// Nobody is listening. Expected when the consumer surface is closed.
    #[error("no active consumer")]
    NoActiveConsumer,
}

pub trait ConsumerChannel: Send + Sync {
    /// Best-effort send. Never blocks.
    fn send(&self, message: &RelayMessage) -> Result<(), ChannelError>;
}

/// In-process channel backed by `tokio::sync::broadcast`.
///
/// Every consumer `subscribe`s; a send with zero receivers reports
/// `NoActiveConsumer`.
#[derive(Clone)]
pub struct BroadcastChannel {
    tx: broadcast::Sender<RelayMessage>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ConsumerChannel for BroadcastChannel {
    fn send(&self, message: &RelayMessage) -> Result<(), ChannelError> {
        self.tx
            .send(message.clone())
            .map(|_| ())
            .map_err(|_| ChannelError::NoActiveConsumer)
    }
}
