//! Round-scoped domain types assembled by the Platform Adapter and handed to
//! the Loop Lifecycle Manager.

use swarm_sim::{ParticipantId, Vec2};

/// Immutable for the duration of a round. Id `0` is reserved for the server;
/// its position updates are ignored by [`swarm_sim::SharedState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// Held by the Platform Adapter between `setup` and `start`. `image_blob` is
/// never decoded (Non-goal); it is carried as an opaque byte buffer.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub collection_id: String,
    pub prompt: String,
    pub answers: Vec<String>,
    pub image_blob: Option<Vec<u8>>,
}

/// Created on `start`, lives until `stop`.
#[derive(Debug, Clone)]
pub struct Round {
    pub question: Question,
    pub duration_seconds: f64,
    pub participants: Vec<Participant>,
    /// Vertex `i` of the arena polygon; `len() == question.answers.len()`.
    pub answer_positions: Vec<Vec2>,
    pub radius: f64,
}

impl Round {
    /// Builds `answer_positions` via the documented layout (§6): `N` points
    /// on a circle of `radius`, starting at `-π/2`, increasing clockwise,
    /// each coordinate truncated toward zero.
    pub fn new(
        question: Question,
        duration_seconds: f64,
        participants: Vec<Participant>,
        radius: f64,
    ) -> Self {
        let answer_positions = swarm_sim::polygon_vertices(question.answers.len(), radius);
        debug_assert_eq!(answer_positions.len(), question.answers.len());
        Self {
            question,
            duration_seconds,
            participants,
            answer_positions,
            radius,
        }
    }
}
