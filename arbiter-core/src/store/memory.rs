use std::collections::BTreeMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::error::{ArbiterError, Result};
use crate::record::BlobMeta;
use crate::store::Storage;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<BTreeMap<String, (BlobMeta, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ids(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, meta: &BlobMeta, payload: &[u8]) -> Result<()> {
        self.blobs.write().await.insert(meta.id.clone(), (meta.clone(), payload.to_vec()));
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<(BlobMeta, Vec<u8>)> {
        self.blobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ArbiterError::NotFound(id.to_string()))
    }

    async fn total_size(&self) -> Result<u64> {
        Ok(self.blobs.read().await.values().map(|(meta, _)| meta.size).sum())
    }
}
