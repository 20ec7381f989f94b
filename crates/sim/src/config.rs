//! Game Loop configuration.

use serde::{Deserialize, Serialize};

fn default_rate() -> u32 {
    20
}

fn default_max_delta_time() -> f64 {
    0.333_33
}

/// Parameters for [`crate::game_loop::GameLoop`]. Deserializable so a round's
/// timing can be carried in a session-start payload instead of hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameLoopConfig {
    /// Target variable-update rate.
    pub fps: u32,
    /// Fixed-update rate.
    pub tps: u32,
    /// Upper bound on a single frame's delta time, seconds.
    pub max_delta_time: f64,
}

impl GameLoopConfig {
    /// `max_delta_time` is always widened to at least `1/tps`: the bound
    /// would otherwise be tighter than a single fixed step can drain.
    pub fn fixed_delta(&self) -> f64 {
        1.0 / f64::from(self.tps)
    }

    pub fn frame_time(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    pub fn effective_max_delta_time(&self) -> f64 {
        self.max_delta_time.max(self.fixed_delta())
    }
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            fps: default_rate(),
            tps: default_rate(),
            max_delta_time: default_max_delta_time(),
        }
    }
}
