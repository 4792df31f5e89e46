use std::sync::Arc;
use crate::app::ArbiterNode;
use crate::bus::Subscription;
use crate::error::{ArbiterError, Result};
use crate::record::CountRecord;
use crate::topology::{Identity, Topic, Topology};

/// Which nodes keep a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// One identity has strictly the highest count.
    Single(Identity),
    /// Several identities share the highest count and all of them keep a copy.
    Replicated(Vec<Identity>),
}

impl Verdict {
    pub fn owners(&self) -> &[Identity] {
        match self {
            Verdict::Single(owner) => std::slice::from_ref(owner),
            Verdict::Replicated(owners) => owners,
        }
    }

    pub fn selects(&self, identity: Identity) -> bool {
        self.owners().contains(&identity)
    }
}

/// Highest count wins; a tie at the top keeps the blob on every tied node.
///
/// For `{0, 1}`: `counts[0] > counts[1]` selects 0, `<` selects 1, equal
/// (including both zero) selects both.
pub fn arbitrate(topology: &Topology, counts: &[u64]) -> Verdict {
    let max = counts.iter().copied().max().unwrap_or(0);
    let owners: Vec<Identity> = topology
        .identities()
        .iter()
        .zip(counts)
        .filter(|&(_, &count)| count == max)
        .map(|(identity, _)| *identity)
        .collect();

    if owners.len() == 1 {
        Verdict::Single(owners[0])
    } else {
        Verdict::Replicated(owners)
    }
}

/// What one node concluded for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub id: String,
    pub decided_by: Identity,
    pub counts: Vec<u64>,
    pub verdict: Verdict,
    /// Whether `decided_by` stored the blob.
    pub persisted: bool,
}

/// Arbitrates a fully counted record and persists it when this node is an owner.
pub async fn decide(node: &ArbiterNode, record: CountRecord) -> Result<Decision> {
    if record.counts.len() != node.topology.len() {
        return Err(ArbiterError::violation(
            &Topic::Save,
            format!("record {} has {} slots, expected {}", record.meta.id, record.counts.len(), node.topology.len()),
        ));
    }
    let counts = record.complete_counts().ok_or_else(|| {
        ArbiterError::violation(&Topic::Save, format!("record {} reached save with an unset slot", record.meta.id))
    })?;

    let verdict = arbitrate(&node.topology, &counts);
    let persisted = verdict.selects(node.identity);
    if persisted {
        tracing::info!("Decider {} keeps {}, counts {:?}, {:?}", node.identity, record.meta.id, counts, verdict);
        node.store.save(&record.meta, &record.payload).await?;
    } else {
        tracing::debug!("Decider {} skips {}, counts {:?}, {:?}", node.identity, record.meta.id, counts, verdict);
    }

    Ok(Decision { id: record.meta.id, decided_by: node.identity, counts, verdict, persisted })
}

/// Consumes `save` until it closes. Invalid records and store failures stop the loop.
pub async fn run(node: Arc<ArbiterNode>, mut subscription: Subscription) -> Result<()> {
    tracing::info!("Decider {} consuming {}", node.identity, subscription.topic());

    while let Some(message) = subscription.next().await {
        let decision = match CountRecord::decode(&message) {
            Ok(record) => decide(&node, record).await,
            Err(e) => Err(e),
        }
        .map_err(|e| {
            tracing::error!("Decider {} stopping: {}", node.identity, e);
            e
        })?;
        node.announce(decision);
    }

    tracing::info!("Decider {} stopped, {} closed", node.identity, subscription.topic());
    Ok(())
}
