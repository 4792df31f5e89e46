pub mod local_store;
pub mod store;

pub use local_store::LocalFileBlobStore;
pub use store::BlobStore;
