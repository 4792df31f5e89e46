use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use crate::bus::{MessageBus, Subscription};
use crate::error::{ArbiterError, Result};
use crate::topology::Topic;

/// In-process bus: every subscription owns a queue, and publishing appends the
/// message to the queue of each live subscriber of the topic.
///
/// Queues are unbounded. With three or more identities the count topics form
/// a cycle between Counters, and bounded queues there could leave every
/// Counter waiting on a full neighbour.
///
/// Serves as the whole transport when several nodes share a process and as the
/// local inbox behind [`crate::bus::HttpBus`].
#[derive(Debug, Default)]
pub struct InMemoryBus {
    topics: DashMap<Topic, Vec<mpsc::UnboundedSender<Vec<u8>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .get(topic)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &Topic, message: Vec<u8>) -> Result<()> {
        let delivered = match self.topics.get_mut(topic) {
            Some(mut senders) => {
                // a failed send means the subscription was dropped
                senders.retain(|tx| tx.send(message.clone()).is_ok());
                senders.len()
            }
            None => 0,
        };

        // nobody listening means the message would vanish
        if delivered == 0 {
            return Err(ArbiterError::Transport(format!("no subscriber on topic {}", topic)));
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics.entry(topic.clone()).or_default().push(tx);
        Ok(Subscription::new(topic.clone(), rx))
    }
}
