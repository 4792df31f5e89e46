//! The three stages every node runs.
//!
//! Ingress fills the uploading node's slot and hands the record to the next
//! identity's `count_*` topic; each Counter fills its own slot and forwards the
//! record until every slot is set, then publishes it on `save`; every Decider
//! reads `save` and persists the blob if the vote selects its node.

use crate::error::ArbiterError;
use crate::topology::Topic;

pub mod counter;
pub mod decider;
pub mod ingress;

/// Logs a publish of record `id` to `topic` that did not reach every consumer.
fn log_publish_failure(stage: &str, id: &str, topic: &Topic, e: &ArbiterError) {
    match e {
        ArbiterError::PartialDelivery { delivered, failed } => tracing::warn!(
            "{} published {} to {} on {:?} only, missing: {}",
            stage,
            id,
            topic,
            delivered,
            failed.join("; ")
        ),
        _ => tracing::error!("{} dropping {}: publish to {} failed: {}", stage, id, topic, e),
    }
}
