use std::sync::Arc;
use crate::app::ArbiterNode;
use crate::bits::count_for;
use crate::bus::Subscription;
use crate::error::{ArbiterError, Result};
use crate::pipeline::log_publish_failure;
use crate::record::CountRecord;
use crate::topology::{Identity, Topic, Topology};

/// Fills `identity`'s slot of a record that arrived on `topic` and returns the
/// topic it moves on to.
///
/// A record whose slot is already filled means duplicate delivery or a
/// misrouted topic. Recounting would hide that, so it is rejected.
pub fn fill_own_slot(
    topology: &Topology,
    identity: Identity,
    topic: &Topic,
    record: &mut CountRecord,
) -> Result<Topic> {
    let slot = topology.require_slot(identity)?;
    if record.counts.len() != topology.len() {
        return Err(ArbiterError::violation(
            topic,
            format!("record {} has {} slots, expected {}", record.meta.id, record.counts.len(), topology.len()),
        ));
    }
    if let Some(existing) = record.counts[slot] {
        return Err(ArbiterError::violation(
            topic,
            format!("record {} already has slot {} set to {}", record.meta.id, identity, existing),
        ));
    }

    record.counts[slot] = Some(count_for(&record.payload, identity));
    Ok(topology.next_topic(identity, &record.counts))
}

/// Consumes the node's own `count_*` topic until it closes.
/// Stops with an error on the first undecodable or invalid record.
pub async fn run(node: Arc<ArbiterNode>, mut subscription: Subscription) -> Result<()> {
    let topic = subscription.topic().clone();
    tracing::info!("Counter {} consuming {}", node.identity, topic);

    while let Some(message) = subscription.next().await {
        let mut record = CountRecord::decode(&message).map_err(|e| {
            tracing::error!("Counter {} got an undecodable record on {}: {}", node.identity, topic, e);
            e
        })?;
        let next = fill_own_slot(&node.topology, node.identity, &topic, &mut record).map_err(|e| {
            tracing::error!("Counter {} stopping: {}", node.identity, e);
            e
        })?;

        tracing::debug!("Counter {} counted {}: {:?} -> {}", node.identity, record.meta.id, record.counts, next);
        if let Err(e) = node.bus.publish(&next, record.encode()?).await {
            log_publish_failure("Counter", &record.meta.id, &next, &e);
        }
    }

    tracing::info!("Counter {} stopped, {} closed", node.identity, topic);
    Ok(())
}
