//! JSON wire types for the swarm bot control/update channels and the HTTP
//! session bootstrap API.
//!
//! The concrete socket/HTTP transport is an external collaborator; this
//! crate only owns the message *shapes* and the small amount of parsing
//! (topic suffixes, `type`-tagged dispatch) needed to turn bytes into
//! values a [`swarm_sim`] component can consume.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swarm_sim::ParticipantId;
use thiserror::Error;

// ============================================================================
// Control channel
// ============================================================================

/// Inbound control message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessageIn {
    Setup {
        collection_id: String,
        question_id: String,
    },
    Start {
        duration: f64,
    },
    Stop,
}

/// Outbound control message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessageOut {
    Join {
        participant: ParticipantId,
        session: String,
    },
    Ready {
        participant: ParticipantId,
        session: String,
    },
    /// Sent during an orderly disconnect; the original client also posts a
    /// departure to the HTTP API at the same point (§6 of the supplemental
    /// carry from the original source).
    Leave {
        participant: ParticipantId,
        session: String,
    },
}

// ============================================================================
// Update channel
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionData {
    pub position: Vec<f64>,
}

/// Inbound position update, received on `swarm/session/{session_id}/updates/{client_id}`.
/// The participant id itself comes from the topic suffix, not the body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateMessageIn {
    pub data: PositionData,
}

/// Outbound position update published on the local client's update topic.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateMessageOut {
    pub data: PositionData,
    #[serde(rename = "timeStamp")]
    pub time_stamp: DateTime<Utc>,
}

/// Parses the participant id out of a topic of the form
/// `swarm/session/{session_id}/updates/{client_id}` (or the control
/// equivalent). Returns `None` if the suffix isn't a valid id.
pub fn participant_id_from_topic(topic: &str) -> Option<ParticipantId> {
    topic.rsplit('/').next()?.parse().ok()
}

// ============================================================================
// HTTP session bootstrap API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JoinParticipantRequest {
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JoinParticipantResponse {
    pub id: ParticipantId,
}

/// `GET /api/question/{cid}/{qid}` response.
///
/// The original source reads the literal key `"question"` while this
/// specification's data model names the field `prompt`; both are accepted on
/// deserialize via the alias, and `prompt` is always the name used on
/// serialize.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuestionResponse {
    #[serde(alias = "question")]
    pub prompt: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllParticipantsRequest {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParticipantInfo {
    pub username: String,
    pub id: ParticipantId,
}

/// Error bodies the HTTP surface returns in place of a 4xx status (§6).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionApiError {
    #[error("Participant already joined session")]
    DuplicateName,
    #[error("Session not found")]
    SessionNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_in_setup_round_trips() {
        let json = r#"{"type":"setup","collection_id":"c1","question_id":"q9"}"#;
        let msg: ControlMessageIn = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ControlMessageIn::Setup {
                collection_id: "c1".into(),
                question_id: "q9".into(),
            }
        );
        assert_eq!(serde_json::to_string(&msg).unwrap(), json);
    }

    #[test]
    fn control_in_stop_has_no_extra_fields() {
        let msg: ControlMessageIn = serde_json::from_str(r#"{"type":"stop"}"#).unwrap();
        assert_eq!(msg, ControlMessageIn::Stop);
    }

    #[test]
    fn control_out_join_serializes_with_type_tag() {
        let msg = ControlMessageOut::Join {
            participant: 7,
            session: "s1".into(),
        };
        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "join");
        assert_eq!(value["participant"], 7);
    }

    #[test]
    fn update_out_timestamp_is_iso8601() {
        let msg = UpdateMessageOut {
            data: PositionData {
                position: vec![0.5, -0.25],
            },
            time_stamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["timeStamp"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn participant_id_parsed_from_topic_suffix() {
        assert_eq!(
            participant_id_from_topic("swarm/session/abc/updates/42"),
            Some(42)
        );
        assert_eq!(participant_id_from_topic("swarm/session/abc/updates/#"), None);
    }

    #[test]
    fn question_response_accepts_either_key() {
        let via_prompt: QuestionResponse =
            serde_json::from_str(r#"{"prompt":"2+2?","answers":["3","4"]}"#).unwrap();
        let via_question: QuestionResponse =
            serde_json::from_str(r#"{"question":"2+2?","answers":["3","4"]}"#).unwrap();
        assert_eq!(via_prompt, via_question);
    }

    #[test]
    fn question_response_serializes_as_prompt() {
        let q = QuestionResponse {
            prompt: "2+2?".into(),
            answers: vec!["4".into()],
        };
        let value: serde_json::Value = serde_json::to_value(&q).unwrap();
        assert!(value.get("prompt").is_some());
        assert!(value.get("question").is_none());
    }
}
