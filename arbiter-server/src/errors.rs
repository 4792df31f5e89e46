use actix_multipart::MultipartError;
use actix_web::{HttpResponse, ResponseError};
use arbiter_core::ArbiterError;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;


#[derive(Debug, Error)]
pub enum ArbiterHttpErr {
    #[error("Item not found")]
    NotFound,

    #[error("Invalid upload parameters")]
    Validation(#[from] ValidationErrors),

    #[error("Malformed multipart upload")]
    Multipart(#[from] MultipartError),

    #[error("The upload has no `file` field")]
    MissingFile,

    #[error("The file is larger than {0} bytes")]
    TooLarge(usize),

    #[error("Unknown topic {0}")]
    UnknownTopic(String),

    #[error("The message bus is unavailable")]
    Unavailable(#[source] ArbiterError),

    #[error("An error occurred in the arbitration pipeline")]
    Arbiter(#[source] ArbiterError),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl From<ArbiterError> for ArbiterHttpErr {
    fn from(e: ArbiterError) -> Self {
        match e {
            ArbiterError::NotFound(id) => {
                // absence is expected on nodes that lost the vote
                tracing::debug!("{} is not stored on this node", id);
                ArbiterHttpErr::NotFound
            }
            e @ ArbiterError::Transport(_) => ArbiterHttpErr::Unavailable(e),
            e => ArbiterHttpErr::Arbiter(e),
        }
    }
}

impl ResponseError for ArbiterHttpErr {
    fn error_response(&self) -> HttpResponse {
        match self {
            ArbiterHttpErr::NotFound => HttpResponse::NotFound().json(ErrorBody { detail: self.to_string() }),
            ArbiterHttpErr::Validation(errors) => HttpResponse::BadRequest().json(errors),
            ArbiterHttpErr::Multipart(e) => {
                tracing::debug!("{}: {}", self, e);
                HttpResponse::BadRequest().json(ErrorBody { detail: self.to_string() })
            }
            ArbiterHttpErr::MissingFile => HttpResponse::BadRequest().json(ErrorBody { detail: self.to_string() }),
            ArbiterHttpErr::TooLarge(_) => HttpResponse::PayloadTooLarge().json(ErrorBody { detail: self.to_string() }),
            ArbiterHttpErr::UnknownTopic(_) => HttpResponse::NotFound().body(self.to_string()),
            ArbiterHttpErr::Unavailable(e) => {
                tracing::warn!("{}: {}", self, e);
                HttpResponse::ServiceUnavailable().body(self.to_string())
            }
            ArbiterHttpErr::Arbiter(e) => {
                tracing::error!("{}: {}", self, e);
                HttpResponse::InternalServerError().body(self.to_string())
            }
        }
    }
}
