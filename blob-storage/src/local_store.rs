use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use crate::store::BlobStore;

/// Stores each blob as a single file named after its id under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalFileBlobStore {
    base_path: PathBuf,
}

impl LocalFileBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    /// Creates the base directory if it is missing.
    pub fn open(base_path: impl Into<PathBuf>) -> io::Result<Self> {
        let store = Self::new(base_path);
        fs::create_dir_all(&store.base_path)?;
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, blob_id: &str) -> io::Result<PathBuf> {
        // ids become file names, so nothing that could escape base_path
        let valid = !blob_id.is_empty()
            && blob_id != "."
            && blob_id != ".."
            && !blob_id.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid blob id: {:?}", blob_id),
            ));
        }
        Ok(self.base_path.join(blob_id))
    }
}

impl BlobStore for LocalFileBlobStore {
    fn put_blob(&self, blob_id: &str, data: &[u8]) -> io::Result<()> {
        let file_path = self.blob_path(blob_id)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(file_path)?;
        file.write_all(data)?;
        file.sync_data()?;
        Ok(())
    }

    fn get_blob(&self, blob_id: &str) -> io::Result<Vec<u8>> {
        fs::read(self.blob_path(blob_id)?)
    }

    fn delete_blob(&self, blob_id: &str) -> io::Result<()> {
        match fs::remove_file(self.blob_path(blob_id)?) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
