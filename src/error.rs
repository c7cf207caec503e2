use thiserror::Error;

use crate::assets::SpriteKey;

/// Inbound payload that could not be decoded. The offending message is dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed server message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed {action} message: {source}")]
    Malformed {
        action: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("join_game ack reported success without {0}")]
    IncompleteJoinAck(&'static str),
}

/// Server refused the join. Reported, never retried automatically.
#[derive(Debug, Error)]
#[error("join rejected: {0}")]
pub struct JoinRejected(pub String);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("failed to decode sprite {0}")]
    Sprite(SpriteKey),
    #[error("failed to decode world backdrop {0}")]
    Backdrop(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not open connection to {url}: {reason}")]
    Open { url: String, reason: String },
    #[error("send failed: {0}")]
    Send(String),
}
