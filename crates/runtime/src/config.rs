//! Platform Adapter configuration.

use serde::{Deserialize, Serialize};
use swarm_sim::ParticipantId;

fn default_answer_radius() -> f64 {
    430.0
}

/// Parameters for [`crate::platform::PlatformAdapter`]. Deserializable so a
/// session's bootstrap parameters can be carried in a config payload instead
/// of hardcoded, mirroring [`swarm_sim::GameLoopConfig`] for the loop side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Session this adapter's control/update topics are scoped to.
    pub session_id: String,
    /// This process's own participant id, excluded from `other_positions`.
    pub local_client_id: ParticipantId,
    /// Radius of the answer polygon passed to `Round::new`, matching the
    /// hexagon layout documented for the reference scenario.
    pub answer_radius: f64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            local_client_id: 0,
            answer_radius: default_answer_radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_answer_radius() {
        let cfg = PlatformConfig::default();
        assert!((cfg.answer_radius - 430.0).abs() < 1e-9);
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let cfg: PlatformConfig = serde_json::from_str(r#"{"session_id": "s1"}"#).unwrap();
        assert_eq!(cfg.session_id, "s1");
        assert!((cfg.answer_radius - 430.0).abs() < 1e-9);
    }
}
