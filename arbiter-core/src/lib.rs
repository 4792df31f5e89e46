#![deny(unused_qualifications)]

use std::path::Path;
use std::sync::Arc;

pub mod app;
pub mod bits;
pub mod bus;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod topology;

pub use app::{ArbiterNode, NodeHandle};
pub use bus::{HttpBus, InMemoryBus, MessageBus, Peer, Subscription};
pub use error::{ArbiterError, Result};
pub use pipeline::decider::{Decision, Verdict};
pub use pipeline::ingress::Upload;
pub use record::{BlobMeta, CountRecord};
pub use store::{MemoryStorage, RocksStorage, Storage};
pub use topology::{Identity, Topic, Topology};

/// A node wired to its peers over HTTP with on-disk storage.
pub struct RunningNode {
    pub node: Arc<ArbiterNode>,
    /// Where the `/bus/{topic}` endpoint delivers messages from peers.
    pub inbox: Arc<InMemoryBus>,
    pub handle: NodeHandle,
}

pub async fn start_arbiter_node<P>(
    identity: Identity,
    topology: Topology,
    peers: Vec<Peer>,
    data_dir: P,
) -> Result<RunningNode>
where
    P: AsRef<Path>,
{
    let store = Arc::new(RocksStorage::open(data_dir)?);
    let inbox = Arc::new(InMemoryBus::new());
    let bus = Arc::new(HttpBus::new(&topology, peers, inbox.clone())?);

    let node = ArbiterNode::new(identity, topology, bus, store)?;
    let handle = node.start().await?;

    Ok(RunningNode { node, inbox, handle })
}
