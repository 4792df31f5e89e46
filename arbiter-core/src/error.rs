use std::io;
use thiserror::Error;
use tokio::task::JoinError;
use crate::topology::Topic;

pub type Result<T> = std::result::Result<T, ArbiterError>;

#[derive(Debug, Error)]
pub enum ArbiterError {
    /// A record reached a topic in a state the protocol never produces,
    /// e.g. a count topic delivering a record whose slot is already filled.
    #[error("Protocol violation on {topic}: {reason}")]
    ProtocolViolation { topic: Topic, reason: String },

    #[error("Blob {0} not found")]
    NotFound(String),

    #[error("Failed to reach the message bus: {0}")]
    Transport(String),

    /// Some consumers of a topic got the message and some did not.
    #[error("Delivered to {} of {} nodes, failed for {}", .delivered.len(), .delivered.len() + .failed.len(), .failed.join("; "))]
    PartialDelivery { delivered: Vec<String>, failed: Vec<String> },

    #[error("Failed to encode or decode a record")]
    Codec(#[from] serde_json::Error),

    #[error("An error occurred in the metadata store")]
    Metadata(#[from] rocksdb::Error),

    #[error("An error occurred in the blob store")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("A pipeline task stopped unexpectedly")]
    Task(#[from] JoinError),
}

impl ArbiterError {
    pub fn violation(topic: &Topic, reason: impl Into<String>) -> Self {
        ArbiterError::ProtocolViolation { topic: topic.clone(), reason: reason.into() }
    }
}

impl From<reqwest::Error> for ArbiterError {
    fn from(e: reqwest::Error) -> Self {
        ArbiterError::Transport(e.to_string())
    }
}
