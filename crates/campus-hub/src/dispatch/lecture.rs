//! Lecture-channel event dispatcher.
//!
//! A separate namespace with its own registry and session shape. The
//! channel is request/response shaped: `chat` answers with exactly one
//! `reply` or `error`, while `pause_prompt` is advisory and fails silently.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use campus_core::events::{ChatReply, LectureClientEvent, LectureServerEvent, PausePrompt};
use campus_core::{ConnectionId, HubError, HubResult, LectureId, LectureSession};

use crate::collaborators::{AnswerEngine, LectureStore, RoleAuthenticator, SpeechSynthesizer};
use crate::connection::HubConnection;
use crate::registry::ConnectionRegistry;

/// Localized pause prompt, defaulting to English for unrecognized
/// languages.
fn pause_prompt_message(language: &str) -> &'static str {
    match language.trim().to_lowercase().as_str() {
        "hindi" => "कृपया आगे बढ़ने के लिए तैयार हों। क्या आप अगले भाग के लिए तैयार हैं?",
        "gujarati" => "મહેરબાની કરીને આગળનો ભાગ શરૂ કરવા તૈયાર રહો. શું તમે તૈયાર છો?",
        _ => "Please get ready to continue. Let me know when you want to resume.",
    }
}

/// Dispatcher for the lecture Q&A channel.
pub struct LectureHub {
    registry: ConnectionRegistry<LectureSession>,
    auth: Arc<dyn RoleAuthenticator>,
    lectures: Arc<dyn LectureStore>,
    answers: Arc<dyn AnswerEngine>,
    speech: Arc<dyn SpeechSynthesizer>,
}

impl LectureHub {
    /// Create a hub with its external collaborators.
    pub fn new(
        auth: Arc<dyn RoleAuthenticator>,
        lectures: Arc<dyn LectureStore>,
        answers: Arc<dyn AnswerEngine>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            auth,
            lectures,
            answers,
            speech,
        }
    }

    /// The channel's connection registry.
    pub fn registry(&self) -> &ConnectionRegistry<LectureSession> {
        &self.registry
    }

    /// Authorize a token and register the connection.
    ///
    /// Only `admin` and `member` roles may join; any other role or a
    /// resolution failure refuses the connection at the transport level.
    #[instrument(skip_all, fields(connection = %connection_id))]
    pub async fn handshake(
        &self,
        connection_id: ConnectionId,
        token: &str,
        tx: mpsc::Sender<Arc<String>>,
    ) -> HubResult<Arc<HubConnection<LectureSession>>> {
        let role_context = self.auth.resolve_role(token).await?;
        if !role_context.role.may_join_lecture() {
            return Err(HubError::forbidden(format!(
                "role {} may not join the lecture channel",
                role_context.role
            )));
        }

        debug!(role = %role_context.role, user = %role_context.user_id, "lecture viewer connected");
        let connection = Arc::new(HubConnection::new(
            connection_id,
            LectureSession::new(role_context),
            tx,
        ));
        self.registry.register(Arc::clone(&connection)).await;
        Ok(connection)
    }

    /// Tear down a connection. Idempotent.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id).await.is_some() {
            debug!(connection = %connection_id, "lecture viewer disconnected");
        }
    }

    /// Route one inbound event.
    pub async fn handle_event(&self, connection_id: &ConnectionId, event: LectureClientEvent) {
        let Some(connection) = self.registry.lookup(connection_id).await else {
            debug!(connection = %connection_id, "event from unregistered connection dropped");
            return;
        };

        match event {
            LectureClientEvent::PausePrompt { lecture_id } => {
                self.pause_prompt(&connection, lecture_id).await;
            }
            LectureClientEvent::Chat {
                lecture_id,
                question,
                answer_type,
            } => {
                self.chat(&connection, lecture_id, question, answer_type)
                    .await;
            }
        }
    }

    /// Advisory event: derive a localized pause message for the lecture and
    /// reply privately. All failures are logged and swallowed; no reply is
    /// sent on failure.
    async fn pause_prompt(
        &self,
        connection: &HubConnection<LectureSession>,
        lecture_id: LectureId,
    ) {
        if lecture_id.as_str().trim().is_empty() {
            return;
        }
        match self.build_pause_prompt(&lecture_id).await {
            Ok(prompt) => {
                let _ = connection.send_event(&LectureServerEvent::Prompt(prompt));
            }
            Err(error) => {
                warn!(lecture = %lecture_id, %error, "pause prompt failed");
            }
        }
    }

    async fn build_pause_prompt(&self, lecture_id: &LectureId) -> HubResult<PausePrompt> {
        let record = self.lectures.lecture(lecture_id).await?;
        let language = record.language_or_default().to_owned();
        let message = pause_prompt_message(&language).to_owned();
        let audio_url = self.speech.synthesize(&message, &language).await;
        Ok(PausePrompt {
            lecture_id: lecture_id.clone(),
            message,
            language,
            audio_url,
        })
    }

    /// Request/response event: exactly one `reply` or `error` per request.
    async fn chat(
        &self,
        connection: &HubConnection<LectureSession>,
        lecture_id: LectureId,
        question: String,
        answer_type: Option<String>,
    ) {
        let question = question.trim().to_owned();
        if lecture_id.as_str().trim().is_empty() || question.is_empty() {
            let _ = connection.send_event(&LectureServerEvent::error(
                "Lecture ID and question are required",
                None,
            ));
            return;
        }

        let event = match self
            .answer_chat(&lecture_id, &question, answer_type.as_deref())
            .await
        {
            Ok(reply) => LectureServerEvent::Reply(reply),
            Err(HubError::NotFound(_)) => {
                LectureServerEvent::error("Lecture not found", Some(lecture_id))
            }
            Err(HubError::ServiceUnavailable(message)) => {
                let message = if message.trim().is_empty() {
                    "Service unavailable".to_owned()
                } else {
                    message
                };
                LectureServerEvent::error(message, None)
            }
            Err(error) => {
                warn!(lecture = %lecture_id, %error, "lecture chat failed");
                LectureServerEvent::error("Unable to process request", None)
            }
        };
        let _ = connection.send_event(&event);
    }

    async fn answer_chat(
        &self,
        lecture_id: &LectureId,
        question: &str,
        answer_type: Option<&str>,
    ) -> HubResult<ChatReply> {
        let record = self.lectures.lecture(lecture_id).await?;
        let language = record.language_or_default().to_owned();
        let answer = self
            .answers
            .answer(lecture_id, question, &record.context, &language, answer_type)
            .await?;

        let text = answer.assistant_text().map(str::to_owned);
        let audio_url = match &text {
            Some(text) => {
                let speech_language = answer.language.as_deref().unwrap_or(&language);
                self.speech.synthesize(text, speech_language).await
            }
            None => None,
        };

        // Interaction logging must never fail the reply already produced.
        if let Err(error) = self
            .lectures
            .persist_interaction(lecture_id, question, text.as_deref(), audio_url.as_deref())
            .await
        {
            warn!(lecture = %lecture_id, %error, "failed to persist lecture chat");
        }

        Ok(ChatReply {
            lecture_id: lecture_id.clone(),
            answer,
            audio_url,
        })
    }
}
