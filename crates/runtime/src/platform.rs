//! Platform Adapter: the dispatch logic sitting between the external message
//! bus and the [`crate::manager::LifecycleManager`].
//!
//! The concrete HTTP/publish transport is out of scope; this module only
//! owns the decision of what to do with each inbound control/update message,
//! expressed against a small [`PlatformApi`] trait so it can be exercised
//! with an in-memory fake.

use std::sync::{Arc, Mutex};

use swarm_sim::{Bot, GameLoopConfig, ParticipantId, PositionCodec, SharedState};
use swarm_wire::{
    AllParticipantsRequest, ControlMessageIn, ControlMessageOut, JoinParticipantRequest, JoinParticipantResponse,
    ParticipantInfo, QuestionResponse, SessionApiError, UpdateMessageIn,
};

use crate::config::PlatformConfig;
use crate::data::{Participant, Question, Round};
use crate::error::RuntimeError;
use crate::manager::LifecycleManager;

/// The HTTP/publish operations the adapter needs from an external
/// collaborator, matching §6's HTTP surface one method per endpoint.
/// Fetch methods carry the implementation's own error message rather than
/// `RuntimeError` directly, since this crate only depends on `PlatformApi`
/// as a trait and shouldn't need to know how a concrete transport fails.
pub trait PlatformApi: Send + Sync {
    fn post_participant(
        &self,
        session_id: &str,
        request: JoinParticipantRequest,
    ) -> Result<JoinParticipantResponse, SessionApiError>;
    fn get_question(&self, collection_id: &str, question_id: &str) -> Result<QuestionResponse, String>;
    fn get_all_participants(
        &self,
        session_id: &str,
        credentials: AllParticipantsRequest,
    ) -> Result<Vec<ParticipantInfo>, String>;
    fn publish(&self, topic: &str, payload: &[u8]);
}

/// Wires one session's control/update traffic to a [`LifecycleManager`].
///
/// `bot_factory` builds a fresh `B` for each round, since a `Bot` is
/// round-scoped while the adapter and manager live for the session.
pub struct PlatformAdapter<B: Bot + 'static, P: PlatformApi> {
    platform: P,
    manager: LifecycleManager<B>,
    session_id: String,
    local_client_id: ParticipantId,
    bot_factory: Box<dyn Fn() -> B + Send>,
    current_question: Mutex<Option<Question>>,
    current_shared_state: Mutex<Option<Arc<SharedState>>>,
    answer_radius: f64,
}

impl<B: Bot + 'static, P: PlatformApi> PlatformAdapter<B, P> {
    pub fn new(platform: P, config: PlatformConfig, bot_factory: Box<dyn Fn() -> B + Send>) -> Self {
        Self {
            platform,
            manager: LifecycleManager::new(),
            session_id: config.session_id,
            local_client_id: config.local_client_id,
            bot_factory,
            current_question: Mutex::new(None),
            current_shared_state: Mutex::new(None),
            answer_radius: config.answer_radius,
        }
    }

    /// `POST /api/session/{sid}/participant` per §6: registers `user` and
    /// returns the participant id the platform assigned. Maps the HTTP
    /// surface's 409/404 error bodies onto the matching `RuntimeError`
    /// variants rather than the generic `Io` catch-all, since both are
    /// caller-actionable (retry with a different name, or a fresh session).
    pub fn join(&self, user: String) -> Result<ControlMessageOut, RuntimeError> {
        let request = JoinParticipantRequest { user: user.clone() };
        match self.platform.post_participant(&self.session_id, request) {
            Ok(response) => Ok(ControlMessageOut::Join {
                participant: response.id,
                session: self.session_id.clone(),
            }),
            Err(SessionApiError::DuplicateName) => Err(RuntimeError::DuplicateName(user)),
            Err(SessionApiError::SessionNotFound) => Err(RuntimeError::SessionNotFound(self.session_id.clone())),
        }
    }

    /// Dispatches one control message per §4.H.
    pub fn handle_control(&mut self, message: ControlMessageIn) -> Result<Option<ControlMessageOut>, RuntimeError> {
        match message {
            ControlMessageIn::Setup {
                collection_id,
                question_id,
            } => {
                let response = self
                    .platform
                    .get_question(&collection_id, &question_id)
                    .map_err(RuntimeError::Io)?;
                let question = Question {
                    id: question_id,
                    collection_id,
                    prompt: response.prompt,
                    answers: response.answers,
                    image_blob: None,
                };
                tracing::info!(question_id = %question.id, "setup: question fetched, emitting ready");
                *self.current_question.lock().unwrap() = Some(question);
                Ok(Some(ControlMessageOut::Ready {
                    participant: self.local_client_id,
                    session: self.session_id.clone(),
                }))
            }
            ControlMessageIn::Start { duration } => {
                let question = self
                    .current_question
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or(RuntimeError::CannotStartRound)?;
                let credentials = AllParticipantsRequest {
                    user: "admin".into(),
                    pass: "admin".into(),
                };
                let infos = self
                    .platform
                    .get_all_participants(&self.session_id, credentials)
                    .map_err(RuntimeError::Io)?;
                let participants: Vec<Participant> = infos
                    .into_iter()
                    .map(|info| Participant {
                        id: info.id,
                        name: info.username,
                    })
                    .collect();
                let round = Round::new(question, duration, participants, self.answer_radius);

                let codec = PositionCodec::new(round.answer_positions.clone());
                let ids: Vec<ParticipantId> = round.participants.iter().map(|p| p.id).collect();
                let shared_state = Arc::new(SharedState::new(codec, &ids, self.local_client_id));
                *self.current_shared_state.lock().unwrap() = Some(shared_state.clone());

                tracing::info!(duration, participants = round.participants.len(), "start: round created");
                let bot = (self.bot_factory)();
                self.manager
                    .start_session(&round, bot, shared_state, self.local_client_id, GameLoopConfig::default());
                Ok(None)
            }
            ControlMessageIn::Stop => {
                tracing::info!("stop: finishing session");
                self.manager.finish_session();
                *self.current_shared_state.lock().unwrap() = None;
                Ok(None)
            }
        }
    }

    /// Dispatches one non-control update message, §4.H: extract
    /// `participant_id` from the topic tail, forward to Shared State if
    /// nonzero and a round is active.
    pub fn handle_update(&self, topic: &str, payload: &[u8]) {
        let Some(participant_id) = swarm_wire::participant_id_from_topic(topic) else {
            tracing::debug!(topic, "dropping update: no participant id in topic");
            return;
        };
        if participant_id == 0 {
            tracing::debug!("dropping update: reserved server id");
            return;
        }
        let Ok(message) = serde_json::from_slice::<UpdateMessageIn>(payload) else {
            tracing::debug!(topic, "dropping update: malformed JSON body");
            return;
        };
        let Some(shared_state) = self.current_shared_state.lock().unwrap().clone() else {
            tracing::debug!("dropping update: no round active");
            return;
        };
        shared_state.update(participant_id, &message.data.position);
    }
}
