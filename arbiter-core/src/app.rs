use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use crate::bus::MessageBus;
use crate::error::Result;
use crate::pipeline::decider::Decision;
use crate::pipeline::ingress::{self, Upload};
use crate::pipeline::{counter, decider};
use crate::record::BlobMeta;
use crate::store::Storage;
use crate::topology::{Identity, Topic, Topology};

const DECISION_BUFFER_SIZE: usize = 256;

// Everything a node's pipeline stages share. Built once at startup and handed
// to each stage; there is no process-wide state.
pub struct ArbiterNode {
    pub identity: Identity,
    pub topology: Topology,
    pub bus: Arc<dyn MessageBus>,
    pub store: Arc<dyn Storage>,
    decisions: broadcast::Sender<Decision>,
}

impl ArbiterNode {
    pub fn new(
        identity: Identity,
        topology: Topology,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn Storage>,
    ) -> Result<Arc<Self>> {
        topology.require_slot(identity)?;
        let (decisions, _) = broadcast::channel(DECISION_BUFFER_SIZE);
        Ok(Arc::new(Self { identity, topology, bus, store, decisions }))
    }

    /// Hands an upload to the pipeline. Returns before anyone has decided where it is stored.
    pub async fn upload(&self, upload: Upload) -> Result<BlobMeta> {
        ingress::submit(self, upload).await
    }

    pub async fn load(&self, id: &str) -> Result<(BlobMeta, Vec<u8>)> {
        self.store.load(id).await
    }

    pub async fn total_size(&self) -> Result<u64> {
        self.store.total_size().await
    }

    /// Every decision this node's Decider reaches from now on, after any
    /// resulting save has completed.
    pub fn subscribe_decisions(&self) -> broadcast::Receiver<Decision> {
        self.decisions.subscribe()
    }

    pub(crate) fn announce(&self, decision: Decision) {
        // no listeners is the normal case
        let _ = self.decisions.send(decision);
    }

    /// Subscribes to `count_{identity}` and `save`, then spawns the Counter and
    /// Decider loops. Both subscriptions exist once this returns.
    pub async fn start(self: &Arc<Self>) -> Result<NodeHandle> {
        let count_subscription = self.bus.subscribe(&Topic::Count(self.identity)).await?;
        let save_subscription = self.bus.subscribe(&Topic::Save).await?;

        let counter = tokio::spawn(counter::run(self.clone(), count_subscription));
        let decider = tokio::spawn(decider::run(self.clone(), save_subscription));

        tracing::info!("Arbiter {} started in topology {:?}", self.identity, self.topology.identities());
        Ok(NodeHandle { identity: self.identity, counter, decider })
    }
}

/// Owns a started node's consumer tasks. Dropping it aborts them.
pub struct NodeHandle {
    identity: Identity,
    counter: JoinHandle<Result<()>>,
    decider: JoinHandle<Result<()>>,
}

impl NodeHandle {
    pub fn is_finished(&self) -> bool {
        self.counter.is_finished() || self.decider.is_finished()
    }

    /// Waits until either consumer loop ends and returns how it ended.
    pub async fn join(mut self) -> Result<()> {
        let finished = tokio::select! {
            res = &mut self.counter => res,
            res = &mut self.decider => res,
        };
        finished?
    }

    /// Aborts both consumer loops, dropping their subscriptions.
    pub fn shutdown(self) {
        tracing::info!("Arbiter {} shutting down", self.identity);
        self.counter.abort();
        self.decider.abort();
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.counter.abort();
        self.decider.abort();
    }
}
