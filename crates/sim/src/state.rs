//! Shared State: thread-safe fan-in of decoded per-participant positions.
//!
//! One mutex guards the whole map. Writers (the I/O thread, via the
//! platform adapter) and readers (the simulation thread, once per tick) both
//! do O(N) work under the lock and never run user callbacks while holding
//! it.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::codec::{PositionCodec, Vec2};

pub type ParticipantId = i64;

/// An immutable, point-in-time copy of [`SharedState`], handed to one tick
/// of user code. `all_positions` includes the local client's own entry;
/// `other_positions` filters it out.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    positions: HashMap<ParticipantId, Vec2>,
    client_id: ParticipantId,
}

impl StateSnapshot {
    pub fn all_positions(&self) -> &HashMap<ParticipantId, Vec2> {
        &self.positions
    }

    pub fn other_positions(&self) -> HashMap<ParticipantId, Vec2> {
        self.positions
            .iter()
            .filter(|(id, _)| **id != self.client_id)
            .map(|(id, pos)| (*id, *pos))
            .collect()
    }

    pub fn position_of(&self, participant_id: ParticipantId) -> Option<Vec2> {
        self.positions.get(&participant_id).copied()
    }
}

/// Updates the global position map from individual per-participant updates.
pub struct SharedState {
    codec: PositionCodec,
    client_id: ParticipantId,
    positions: Mutex<HashMap<ParticipantId, Vec2>>,
}

impl SharedState {
    /// Every participant starts at the origin.
    pub fn new(codec: PositionCodec, participant_ids: &[ParticipantId], client_id: ParticipantId) -> Self {
        let positions = participant_ids
            .iter()
            .map(|&id| (id, [0.0, 0.0]))
            .collect();
        Self {
            codec,
            client_id,
            positions: Mutex::new(positions),
        }
    }

    /// Decodes `encoded_position` and stores it. Unknown participant ids
    /// are dropped, never inserted, to preserve the key-set invariant.
    pub fn update(&self, participant_id: ParticipantId, encoded_position: &[f64]) {
        let decoded = self.codec.decode(encoded_position);
        let mut positions = self.positions.lock().unwrap();
        if let Some(slot) = positions.get_mut(&participant_id) {
            *slot = decoded;
        }
    }

    /// Deep-copies the current map under the lock.
    pub fn snapshot(&self) -> StateSnapshot {
        let positions = self.positions.lock().unwrap().clone();
        StateSnapshot {
            positions,
            client_id: self.client_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::polygon_vertices;
    use std::sync::Arc;
    use std::thread;

    fn codec() -> PositionCodec {
        PositionCodec::new(polygon_vertices(6, 430.0))
    }

    #[test]
    fn new_participants_start_at_origin() {
        let state = SharedState::new(codec(), &[1, 2], 1);
        let snap = state.snapshot();
        assert_eq!(snap.position_of(1), Some([0.0, 0.0]));
        assert_eq!(snap.position_of(2), Some([0.0, 0.0]));
    }

    #[test]
    fn snapshot_includes_local_client() {
        let state = SharedState::new(codec(), &[1, 2], 1);
        let snap = state.snapshot();
        assert!(snap.all_positions().contains_key(&1));
        assert!(!snap.other_positions().contains_key(&1));
        assert!(snap.other_positions().contains_key(&2));
    }

    #[test]
    fn unknown_participant_is_dropped() {
        let state = SharedState::new(codec(), &[1], 1);
        state.update(99, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let snap = state.snapshot();
        assert!(!snap.all_positions().contains_key(&99));
        assert_eq!(snap.all_positions().len(), 1);
    }

    #[test]
    fn update_then_snapshot_reflects_decoded_position() {
        let state = SharedState::new(codec(), &[1], 5);
        let encoded = codec().encode([0.0, -430.0]).unwrap();
        state.update(1, &encoded);
        let snap = state.snapshot();
        let pos = snap.position_of(1).unwrap();
        assert!((pos[0]).abs() < 1e-6);
        assert!((pos[1] + 430.0).abs() < 1e-6);
    }

    #[test]
    fn snapshot_isolation_under_concurrent_updates() {
        let state = Arc::new(SharedState::new(codec(), &[1, 2], 5));
        let writer_state = state.clone();

        let writer = thread::spawn(move || {
            let encoded = codec().encode([10.0, -20.0]).unwrap();
            for _ in 0..10_000 {
                writer_state.update(1, &encoded);
            }
        });

        for _ in 0..10_000 {
            let snap = state.snapshot();
            // participant 2 is never written to; every snapshot must show origin
            assert_eq!(snap.position_of(2), Some([0.0, 0.0]));
        }

        writer.join().unwrap();
    }
}
