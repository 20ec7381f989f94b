//! Bot Facade: the user-extensible hooks a Game Loop drives each tick.
//!
//! Modeled as a trait with no-op default methods rather than a base class to
//! subclass, matching the "optional hook" shape of the original subclassing
//! model without requiring inheritance.

/// User-implemented game logic for one round.
///
/// All methods are optional; the defaults do nothing. `Bot` itself never
/// touches `Scheduler` or `StateSnapshot` directly: a [`crate::game_loop::GameLoop`]
/// implementation is expected to wire those in (see the runtime crate's
/// snapshot-refreshing wrapper).
pub trait Bot: Send {
    /// Called once before the first tick. `kwargs` is left to the caller's
    /// convention (e.g. a serde_json::Value) since positional setup
    /// arguments are not meaningful here.
    fn setup(&mut self) {}

    /// Variable-rate hook; `delta` never exceeds `max_delta_time`. The
    /// recommended place to call `send_position`.
    fn update(&mut self, delta: f64) {
        let _ = delta;
    }

    /// Fixed-rate hook; `sync_ratio` is `accumulator / fixed_delta` and lies
    /// in `[0, 1)`.
    fn fixed_update(&mut self, delta: f64, sync_ratio: f64) {
        let _ = (delta, sync_ratio);
    }

    /// Called exactly once after the last tick.
    fn close(&mut self) {}

    /// Only meaningful for leader/follower bot variants; the transport that
    /// would deliver `data` is out of scope here.
    fn on_message_receive(&mut self, data: &[u8]) {
        let _ = data;
    }
}
