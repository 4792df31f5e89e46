use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use blob_store::{BlobStore, LocalFileBlobStore};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use crate::error::{ArbiterError, Result};
use crate::record::BlobMeta;
use crate::store::Storage;

const META_CF: &str = "meta";

/// Metadata in RocksDB (JSON values keyed by blob id), payloads as files.
pub struct RocksStorage {
    db: Arc<DB>,
    blobs: LocalFileBlobStore,
    data_dir: PathBuf,
}

impl RocksStorage {
    /// Opens or creates `<data_dir>/meta.db` and `<data_dir>/blobs`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let mut db_opts = Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);

        let meta = ColumnFamilyDescriptor::new(META_CF, Options::default());
        let db = DB::open_cf_descriptors(&db_opts, data_dir.join("meta.db"), vec![meta])?;
        let blobs = LocalFileBlobStore::open(data_dir.join("blobs"))?;

        tracing::info!("Opened storage at {}", data_dir.display());
        Ok(Self { db: Arc::new(db), blobs, data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn meta(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(META_CF)
            .ok_or_else(|| ArbiterError::Config(format!("column family {} is missing", META_CF)))
    }
}

#[async_trait]
impl Storage for RocksStorage {
    async fn save(&self, meta: &BlobMeta, payload: &[u8]) -> Result<()> {
        // payload first, so metadata never points at a missing file
        self.blobs.put_blob(&meta.id, payload)?;
        self.db.put_cf(self.meta()?, meta.id.as_bytes(), serde_json::to_vec(meta)?)?;
        self.db.flush_wal(true)?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<(BlobMeta, Vec<u8>)> {
        let raw = self
            .db
            .get_cf(self.meta()?, id.as_bytes())?
            .ok_or_else(|| ArbiterError::NotFound(id.to_string()))?;
        let meta: BlobMeta = serde_json::from_slice(&raw)?;
        let payload = self.blobs.get_blob(id).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArbiterError::NotFound(id.to_string()),
            _ => ArbiterError::Io(e),
        })?;
        Ok((meta, payload))
    }

    async fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for item in self.db.iterator_cf(self.meta()?, IteratorMode::Start) {
            let (_, value) = item?;
            let meta: BlobMeta = serde_json::from_slice(&value)?;
            total += meta.size;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = RocksStorage::open(temp_dir.path()).unwrap();

        let meta = BlobMeta::new("1", 6, Some("application/octet-stream".to_string()));
        let payload = b"\x00\x00\x00\x01\x01\x01";
        store.save(&meta, payload).await.unwrap();

        let (loaded_meta, loaded) = store.load(&meta.id).await.unwrap();
        assert_eq!(loaded_meta, meta);
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let store = RocksStorage::open(temp_dir.path()).unwrap();

        assert!(matches!(store.load("absent").await, Err(ArbiterError::NotFound(_))));
        // path-like ids never reach the file system
        assert!(matches!(store.load("../absent").await, Err(ArbiterError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_total_size_sums_recorded_sizes() {
        let temp_dir = tempdir().unwrap();
        let store = RocksStorage::open(temp_dir.path()).unwrap();
        assert_eq!(store.total_size().await.unwrap(), 0);

        // recorded size is informational and may disagree with the payload
        store.save(&BlobMeta::new("a", 100, None), b"short").await.unwrap();
        store.save(&BlobMeta::new("b", 23, None), b"").await.unwrap();
        assert_eq!(store.total_size().await.unwrap(), 123);
    }

    #[tokio::test]
    async fn test_upsert_and_reopen() {
        let temp_dir = tempdir().unwrap();
        let meta = BlobMeta::new("a", 3, None);
        {
            let store = RocksStorage::open(temp_dir.path()).unwrap();
            store.save(&meta, b"abc").await.unwrap();
            store.save(&meta, b"abc").await.unwrap();
            assert_eq!(store.total_size().await.unwrap(), 3);
        }

        let store = RocksStorage::open(temp_dir.path()).unwrap();
        let (loaded_meta, payload) = store.load(&meta.id).await.unwrap();
        assert_eq!(loaded_meta, meta);
        assert_eq!(payload, b"abc");
        assert_eq!(store.total_size().await.unwrap(), 3);
    }
}
