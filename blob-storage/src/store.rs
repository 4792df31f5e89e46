/// Payload storage keyed by blob id. Writes replace whatever was stored under the id.
pub trait BlobStore {
    fn put_blob(&self, blob_id: &str, data: &[u8]) -> std::io::Result<()>;

    /// Fails with `ErrorKind::NotFound` when nothing was stored under `blob_id`.
    fn get_blob(&self, blob_id: &str) -> std::io::Result<Vec<u8>>;

    fn delete_blob(&self, blob_id: &str) -> std::io::Result<()>;
}
