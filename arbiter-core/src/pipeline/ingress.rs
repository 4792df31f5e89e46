use crate::app::ArbiterNode;
use crate::bits::count_for;
use crate::error::Result;
use crate::pipeline::log_publish_failure;
use crate::record::{BlobMeta, CountRecord};
use crate::topology::{Identity, Topic, Topology};

/// An upload as received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

/// Assigns a fresh id and fills `identity`'s slot. Returns the record together
/// with the topic it has to be published on.
pub fn prepare(topology: &Topology, identity: Identity, upload: Upload) -> Result<(Topic, CountRecord)> {
    let slot = topology.require_slot(identity)?;
    let meta = BlobMeta::new(upload.filename, upload.size, upload.content_type);
    let mut record = CountRecord::new(meta, upload.payload, topology);
    record.counts[slot] = Some(count_for(&record.payload, identity));

    let topic = topology.next_topic(identity, &record.counts);
    Ok((topic, record))
}

/// Hands the upload to the pipeline and returns its metadata right away.
///
/// Where the blob ends up is decided later by the peers. A failed publish is
/// logged and the record is lost; the uploader still gets the metadata.
pub async fn submit(node: &ArbiterNode, upload: Upload) -> Result<BlobMeta> {
    let (topic, record) = prepare(&node.topology, node.identity, upload)?;
    let meta = record.meta.clone();
    let message = record.encode()?;

    tracing::info!(
        "Ingress {} accepted {} ({} bytes), counts {:?} -> {}",
        node.identity,
        meta.id,
        record.payload.len(),
        record.counts,
        topic
    );
    if let Err(e) = node.bus.publish(&topic, message).await {
        log_publish_failure("Ingress", &meta.id, &topic, &e);
    }
    Ok(meta)
}
