use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use crate::bus::{InMemoryBus, MessageBus, Subscription};
use crate::error::{ArbiterError, Result};
use crate::topology::{Identity, Topic, Topology};

const APP_TYPE_JSON: &str = "application/json";

/// A node of the deployment and the HTTP address it serves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub identity: Identity,
    pub addr: String,
}

impl FromStr for Peer {
    type Err = ArbiterError;

    /// Parses `IDENTITY=HOST:PORT`, e.g. `1=127.0.0.1:9001`.
    fn from_str(s: &str) -> Result<Self> {
        let (identity, addr) = s
            .split_once('=')
            .ok_or_else(|| ArbiterError::Config(format!("peer {:?} is not IDENTITY=ADDR", s)))?;
        let addr = addr.trim();
        if addr.is_empty() {
            return Err(ArbiterError::Config(format!("peer {:?} has an empty address", s)));
        }
        Ok(Peer { identity: identity.parse()?, addr: addr.to_string() })
    }
}

/// Bus spanning several processes. Publishing POSTs the message to
/// `/bus/{topic}` on every node that consumes the topic; each node feeds what
/// it receives into its local [`InMemoryBus`], which is also what
/// subscriptions read from.
pub struct HttpBus {
    local: Arc<InMemoryBus>,
    peers: BTreeMap<Identity, String>,
    client: reqwest::Client,
}

impl HttpBus {
    /// Requires exactly one address per identity of `topology`.
    pub fn new(topology: &Topology, peers: Vec<Peer>, local: Arc<InMemoryBus>) -> Result<Self> {
        let mut by_identity = BTreeMap::new();
        for peer in peers {
            if !topology.contains(peer.identity) {
                return Err(ArbiterError::Config(format!(
                    "peer {} at {} is not part of the topology",
                    peer.identity, peer.addr
                )));
            }
            if let Some(previous) = by_identity.insert(peer.identity, peer.addr) {
                return Err(ArbiterError::Config(format!(
                    "identity {} has more than one address (first: {})",
                    peer.identity, previous
                )));
            }
        }
        if let Some(missing) = topology.identities().iter().find(|id| !by_identity.contains_key(*id)) {
            return Err(ArbiterError::Config(format!("no address configured for identity {}", missing)));
        }

        Ok(Self { local, peers: by_identity, client: reqwest::Client::new() })
    }

    /// The inbox remote publishes are delivered into.
    pub fn local(&self) -> Arc<InMemoryBus> {
        self.local.clone()
    }

    /// Addresses of the nodes that consume `topic`.
    pub fn targets(&self, topic: &Topic) -> Vec<&str> {
        match topic {
            Topic::Count(identity) => self.peers.get(identity).map(String::as_str).into_iter().collect(),
            Topic::Save => self.peers.values().map(String::as_str).collect(),
        }
    }

    async fn post(&self, addr: &str, topic: &Topic, message: Vec<u8>) -> Result<()> {
        let endpoint = format!("http://{}/bus/{}", addr, topic);
        let resp = self
            .client
            .post(&endpoint)
            .header(CONTENT_TYPE, APP_TYPE_JSON)
            .body(message)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ArbiterError::Transport(format!("{} answered {}", endpoint, resp.status())))
        }
    }
}

#[async_trait]
impl MessageBus for HttpBus {
    async fn publish(&self, topic: &Topic, message: Vec<u8>) -> Result<()> {
        let targets = self.targets(topic);
        if targets.is_empty() {
            return Err(ArbiterError::Transport(format!("no node consumes topic {}", topic)));
        }

        // one unreachable node must not keep the others from getting the message
        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for addr in targets {
            match self.post(addr, topic, message.clone()).await {
                Ok(()) => delivered.push(addr.to_string()),
                Err(e) => {
                    tracing::warn!("Failed to deliver {} to {}: {}", topic, addr, e);
                    failed.push(format!("{}: {}", addr, e));
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else if delivered.is_empty() {
            Err(ArbiterError::Transport(failed.join("; ")))
        } else {
            Err(ArbiterError::PartialDelivery { delivered, failed })
        }
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        self.local.subscribe(topic).await
    }
}
