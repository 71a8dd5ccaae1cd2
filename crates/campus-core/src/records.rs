//! Records owned by the external collaborators.
//!
//! The hub never mutates these; it only wraps them in outbound envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ids::{LectureId, MessageId};

/// Durable chat message returned by the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Record id assigned by the store.
    pub id: MessageId,
    /// Sending identity.
    pub sender: Identity,
    /// Receiving identity.
    pub recipient: Identity,
    /// Message body (trimmed, non-empty).
    pub body: String,
    /// Opaque share/attachment metadata passed through from the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_metadata: Option<serde_json::Value>,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Lecture record as returned by the lecture store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LectureRecord {
    /// Lecture id.
    pub id: LectureId,
    /// Display title.
    pub title: String,
    /// Lecture language; absent means English.
    #[serde(default)]
    pub language: Option<String>,
    /// Stored context handed to the Q&A generator.
    #[serde(default)]
    pub context: String,
}

impl LectureRecord {
    /// The lecture language, defaulting to English.
    #[must_use]
    pub fn language_or_default(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("English")
    }
}

/// Response payload from the Q&A generation collaborator.
///
/// Generators differ in which field carries the human-readable answer, so
/// all candidates are optional and [`AnswerPayload::assistant_text`] picks
/// the first non-empty one. Unrecognized fields pass through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    /// Primary answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Alternate display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    /// Alternate message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Alternate content text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Answer language, when the generator reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Any additional generator fields, passed through to the reply.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnswerPayload {
    /// Build a payload carrying only an `answer` string.
    pub fn from_answer(text: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
            ..Self::default()
        }
    }

    /// First non-empty of `answer`, `display_text`, `message`, `content`.
    #[must_use]
    pub fn assistant_text(&self) -> Option<&str> {
        [
            self.answer.as_deref(),
            self.display_text.as_deref(),
            self.message.as_deref(),
            self.content.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_text_prefers_answer() {
        let payload = AnswerPayload {
            answer: Some("a".into()),
            message: Some("m".into()),
            ..AnswerPayload::default()
        };
        assert_eq!(payload.assistant_text(), Some("a"));
    }

    #[test]
    fn assistant_text_skips_blank_candidates() {
        let payload = AnswerPayload {
            answer: Some("   ".into()),
            display_text: None,
            message: Some("from message".into()),
            ..AnswerPayload::default()
        };
        assert_eq!(payload.assistant_text(), Some("from message"));
    }

    #[test]
    fn assistant_text_none_when_all_empty() {
        assert_eq!(AnswerPayload::default().assistant_text(), None);
    }

    #[test]
    fn extra_fields_pass_through() {
        let json = r#"{"answer":"hi","confidence":0.9}"#;
        let payload: AnswerPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.assistant_text(), Some("hi"));
        assert_eq!(payload.extra["confidence"], 0.9);
        let back = serde_json::to_value(&payload).unwrap();
        assert_eq!(back["confidence"], 0.9);
    }

    #[test]
    fn lecture_language_defaults_to_english() {
        let record = LectureRecord {
            id: "l1".into(),
            title: "Algebra".into(),
            language: None,
            context: String::new(),
        };
        assert_eq!(record.language_or_default(), "English");
        let record = LectureRecord {
            language: Some("  ".into()),
            ..record
        };
        assert_eq!(record.language_or_default(), "English");
    }

    #[test]
    fn lecture_language_passes_through() {
        let record = LectureRecord {
            id: "l1".into(),
            title: "t".into(),
            language: Some("Hindi".into()),
            context: String::new(),
        };
        assert_eq!(record.language_or_default(), "Hindi");
    }

    #[test]
    fn chat_message_serde_round_trip() {
        let msg = ChatMessage {
            id: "m1".into(),
            sender: "s1".into(),
            recipient: "s2".into(),
            body: "hello".into(),
            share_metadata: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("share_metadata"));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
