use async_trait::async_trait;
use crate::error::Result;
use crate::record::BlobMeta;

pub mod memory;
pub mod rocks;

pub use memory::MemoryStorage;
pub use rocks::RocksStorage;

/// Durable home of the blobs a node decided to keep.
///
/// There is no record-level locking: two saves of the same id race and the last
/// one wins.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upserts the payload and metadata under `meta.id`.
    async fn save(&self, meta: &BlobMeta, payload: &[u8]) -> Result<()>;

    /// Fails with [`crate::ArbiterError::NotFound`] when this node never saved `id`.
    async fn load(&self, id: &str) -> Result<(BlobMeta, Vec<u8>)>;

    /// Sum of the recorded `size` of every stored blob.
    async fn total_size(&self) -> Result<u64>;
}
