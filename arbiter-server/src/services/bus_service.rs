use actix_web::{post, web, HttpResponse};
use arbiter_core::{MessageBus, Topic};
use crate::errors::ArbiterHttpErr;
use crate::services::AppState;

/// Receiving end of [`arbiter_core::HttpBus`]: hands a peer's message to the
/// local consumers of `topic`. Answers 503 when nothing here consumes it.
#[post("/bus/{topic}")]
async fn deliver(
    topic: web::Path<String>,
    body: web::Bytes,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, ArbiterHttpErr> {
    let topic: Topic = topic
        .parse()
        .map_err(|_| ArbiterHttpErr::UnknownTopic(topic.to_string()))?;

    tracing::debug!("Delivering {} bytes on {}", body.len(), topic);
    shared_state.inbox.publish(&topic, body.to_vec()).await?;
    Ok(HttpResponse::Accepted().finish())
}
