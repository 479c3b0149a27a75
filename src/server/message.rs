//! Wire messages
//!
//! Every frame is an envelope `{"type": ..., "payload": ...}`. Inbound
//! envelopes are decoded in two steps so an unknown `type` can be told
//! apart from a known one with a bad payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerResult, AnswerSubmission, Leaderboard};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// First message on every connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub quiz_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
}

impl JoinRequest {
    /// True when every field is present and non-empty
    pub fn is_complete(&self) -> bool {
        !self.quiz_id.is_empty() && !self.user_id.is_empty() && !self.name.is_empty()
    }
}

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Join(JoinRequest),
    Answer(AnswerSubmission),
}

/// Why an inbound frame could not be decoded
#[derive(Debug)]
pub enum DecodeError {
    /// Not a JSON envelope at all
    Malformed(serde_json::Error),
    /// Envelope with a `type` this server does not handle
    Unsupported(String),
    /// Known `type` whose payload does not decode
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "malformed message: {}", e),
            DecodeError::Unsupported(kind) => write!(f, "unsupported message type: {}", kind),
            DecodeError::InvalidPayload { kind, source } => {
                write!(f, "invalid {} payload: {}", kind, source)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed(e) => Some(e),
            DecodeError::InvalidPayload { source, .. } => Some(source),
            DecodeError::Unsupported(_) => None,
        }
    }
}

impl Inbound {
    /// Decode one frame
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(line).map_err(DecodeError::Malformed)?;

        match envelope.kind.as_str() {
            "join" => serde_json::from_value(envelope.payload)
                .map(Inbound::Join)
                .map_err(|source| DecodeError::InvalidPayload { kind: "join", source }),
            "answer" => serde_json::from_value(envelope.payload)
                .map(Inbound::Answer)
                .map_err(|source| DecodeError::InvalidPayload { kind: "answer", source }),
            _ => Err(DecodeError::Unsupported(envelope.kind)),
        }
    }
}

/// Payload of an `error` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Outbound {
    /// Leaderboard right after a successful join
    Joined(Leaderboard),
    /// Leaderboard update
    Leaderboard(Leaderboard),
    /// Outcome of the participant's own answer
    AnswerResult(AnswerResult),
    Error(ErrorPayload),
}

impl Outbound {
    pub fn error(message: impl Into<String>) -> Self {
        Outbound::Error(ErrorPayload {
            message: message.into(),
        })
    }
}
