use std::sync::Arc;
use actix_web::web;
use arbiter_core::{ArbiterNode, InMemoryBus};

pub mod blob_service;
pub mod bus_service;

pub const APP_TYPE_JSON: &str = "application/json";

pub struct AppState {
    pub(crate) node: Arc<ArbiterNode>,
    /// Local side of the bus; peers' publishes land here.
    pub(crate) inbox: Arc<InMemoryBus>,
    /// Largest file a multipart upload may carry.
    pub(crate) max_upload_bytes: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(blob_service::health)
        .service(blob_service::upload_form)
        .service(blob_service::upload)
        .service(blob_service::get_file)
        .service(blob_service::get_size)
        .service(bus_service::deliver);
}
