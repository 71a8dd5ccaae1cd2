//! Typed wire events for both channels.
//!
//! Inbound payloads are tagged enums validated at the serde boundary, so
//! malformed frames never reach handler logic. The `event` tag carries the
//! wire name; `data` carries the payload.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ids::LectureId;
use crate::records::{AnswerPayload, ChatMessage};

/// Online/offline presence state on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// At least one live connection.
    Online,
    /// No live connections.
    Offline,
}

/// Inbound events on the chat channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Relay an opaque signaling payload to a classmate.
    #[serde(rename = "signal")]
    Signal {
        /// Target classmate.
        peer_identity: Identity,
        /// Negotiation phase label, relayed without interpretation.
        signal_type: String,
        /// Opaque payload, relayed without interpretation.
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },

    /// Typing indicator for a classmate.
    #[serde(rename = "typing")]
    Typing {
        /// Target classmate.
        peer_identity: Identity,
        /// Whether the sender is currently typing.
        typing: bool,
    },

    /// Send a persisted chat message to a classmate.
    #[serde(rename = "send_message")]
    SendMessage {
        /// Target classmate.
        peer_identity: Identity,
        /// Message body.
        message: String,
        /// Opaque share/attachment metadata.
        #[serde(default)]
        share_metadata: Option<serde_json::Value>,
    },

    /// Request the current presence snapshot.
    #[serde(rename = "presence:request")]
    PresenceRequest,
}

/// Outbound events on the chat channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// An identity crossed an online/offline boundary.
    #[serde(rename = "presence:update")]
    PresenceUpdate {
        /// Affected identity.
        identity: Identity,
        /// New presence state.
        status: PresenceStatus,
    },

    /// Relayed signaling payload.
    #[serde(rename = "signal")]
    Signal {
        /// Originating identity.
        sender_identity: Identity,
        /// Negotiation phase label.
        signal_type: String,
        /// Opaque payload.
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },

    /// Relayed typing indicator.
    #[serde(rename = "typing")]
    Typing {
        /// Originating identity.
        sender_identity: Identity,
        /// Whether the sender is currently typing.
        typing: bool,
    },

    /// A chat message was persisted and is being fanned out.
    #[serde(rename = "message:new")]
    MessageNew {
        /// The durable record, verbatim from the store.
        message: ChatMessage,
        /// Both conversation participants.
        participants: Vec<Identity>,
    },

    /// Private reply to a `presence:request`.
    #[serde(rename = "presence:snapshot")]
    PresenceSnapshot {
        /// Identities with at least one live connection.
        online: Vec<Identity>,
    },
}

/// Inbound events on the lecture channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LectureClientEvent {
    /// Ask for the localized pause prompt of a lecture.
    #[serde(rename = "pause_prompt")]
    PausePrompt {
        /// Paused lecture.
        lecture_id: LectureId,
    },

    /// Ask the lecture Q&A generator a question.
    #[serde(rename = "chat")]
    Chat {
        /// Lecture providing the answering context.
        lecture_id: LectureId,
        /// The question text.
        question: String,
        /// Optional answer style hint, passed through to the generator.
        #[serde(default)]
        answer_type: Option<String>,
    },
}

/// Localized pause prompt, delivered privately to the requester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PausePrompt {
    /// Paused lecture.
    pub lecture_id: LectureId,
    /// Localized prompt text.
    pub message: String,
    /// Language the prompt was localized to.
    pub language: String,
    /// Synthesized speech for the prompt, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Q&A reply, delivered privately to the requester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Lecture the question was asked against.
    pub lecture_id: LectureId,
    /// Generator payload, passed through verbatim.
    #[serde(flatten)]
    pub answer: AnswerPayload,
    /// Synthesized speech for the answer, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Structured failure reply on the lecture channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LectureError {
    /// Human-readable failure description.
    pub error: String,
    /// Lecture the request referenced, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecture_id: Option<LectureId>,
}

/// Outbound events on the lecture channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LectureServerEvent {
    /// Localized pause prompt.
    #[serde(rename = "prompt")]
    Prompt(PausePrompt),
    /// Q&A reply.
    #[serde(rename = "reply")]
    Reply(ChatReply),
    /// Request failure.
    #[serde(rename = "error")]
    Error(LectureError),
}

impl LectureServerEvent {
    /// Build an `error` reply.
    pub fn error(message: impl Into<String>, lecture_id: Option<LectureId>) -> Self {
        Self::Error(LectureError {
            error: message.into(),
            lecture_id,
        })
    }
}
