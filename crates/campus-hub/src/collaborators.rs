//! Trait seams for the external collaborators.
//!
//! The hub calls out through these traits and never owns their concerns:
//! token decoding, roster lookups, durable storage, and AI generation all
//! live with the embedding application. All traits are object-safe and
//! injected as `Arc<dyn …>`.

use async_trait::async_trait;

use campus_core::{
    AnswerPayload, ChatMessage, HubResult, Identity, LectureId, LectureRecord, RoleContext,
    RosterContext, StudentSession,
};

/// Identity resolution and roster scoping for the chat channel.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Convert an opaque token into a caller identity.
    async fn resolve_identity(&self, token: &str) -> HubResult<Identity>;

    /// Roster context for an authenticated identity.
    async fn roster_context(&self, identity: &Identity) -> HubResult<RosterContext>;

    /// Validate that `peer` shares the caller's tenant + grade + section.
    ///
    /// Returns the peer's context on success and [`HubError::Forbidden`]
    /// otherwise — including for unknown peers, so a caller can never
    /// probe roster membership.
    ///
    /// [`HubError::Forbidden`]: campus_core::HubError::Forbidden
    async fn validate_same_scope(
        &self,
        context: &RosterContext,
        peer: &Identity,
    ) -> HubResult<RosterContext>;
}

/// Durable chat storage.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Persist a chat message and return the durable record.
    ///
    /// The hub broadcasts the returned record verbatim; a failure here
    /// aborts the whole send so unsaved messages are never delivered.
    async fn persist_message(
        &self,
        sender: &StudentSession,
        peer: &Identity,
        peer_context: &RosterContext,
        body: &str,
        share_metadata: Option<serde_json::Value>,
    ) -> HubResult<ChatMessage>;
}

/// Token-to-role resolution for the lecture channel.
#[async_trait]
pub trait RoleAuthenticator: Send + Sync {
    /// Convert an opaque token into a role context.
    async fn resolve_role(&self, token: &str) -> HubResult<RoleContext>;
}

/// Lecture records and interaction logging.
#[async_trait]
pub trait LectureStore: Send + Sync {
    /// Fetch a lecture record.
    async fn lecture(&self, id: &LectureId) -> HubResult<LectureRecord>;

    /// Persist one Q&A exchange.
    ///
    /// Failures are logged by the caller and never fail the user-visible
    /// reply.
    async fn persist_interaction(
        &self,
        lecture_id: &LectureId,
        question: &str,
        answer: Option<&str>,
        audio_url: Option<&str>,
    ) -> HubResult<()>;
}

/// Lecture Q&A generation.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    /// Answer a question against a lecture's stored context.
    async fn answer(
        &self,
        lecture_id: &LectureId,
        question: &str,
        context: &str,
        language: &str,
        answer_type: Option<&str>,
    ) -> HubResult<AnswerPayload>;
}

/// Text-to-speech synthesis.
///
/// The signature is infallible: implementations swallow their own failures
/// and `None` simply means no audio gets attached.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for `text`, returning a public audio URL.
    async fn synthesize(&self, text: &str, language: &str) -> Option<String>;
}
