use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::error::Result;
use crate::topology::Topic;

pub mod http;
pub mod memory;

pub use http::{HttpBus, Peer};
pub use memory::InMemoryBus;

/// Topic based publish/subscribe transport between nodes.
///
/// Every subscriber of a topic sees every message published to it after the
/// subscription was made, in publish order per publisher. A publish that
/// returns `Ok` has been queued for every live subscriber; nothing queued is
/// discarded.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &Topic, message: Vec<u8>) -> Result<()>;

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription>;
}

/// A live subscription to one topic. Dropping it unsubscribes.
pub struct Subscription {
    topic: Topic,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    pub(crate) fn new(topic: Topic, receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { topic, receiver }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Waits for the next message. Returns `None` once the bus is gone and
    /// everything queued has been read.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}
