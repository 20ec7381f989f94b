//! Composition helpers handed to a [`swarm_sim::Bot`] each tick: a scheduler
//! handle for `start_coroutine`, and the latest position snapshot.
//!
//! `Bot` itself exposes neither directly: holding a `Scheduler` or
//! `SharedState` would force every implementor to carry state it may not
//! need. Instead a user's bot holds its own `Arc<AgentContext>` clone and
//! calls `ctx.snapshot()` / `ctx.start_coroutine(...)` from its own hook
//! overrides, and [`RoundAgent`] wraps that bot so the snapshot is refreshed
//! before `update`/`fixed_update` run -- the composition equivalent of the
//! original subclassing model's inherited `self.snapshot`/`self.start_coroutine`.

use std::sync::{Arc, Mutex};

use swarm_sim::{Bot, Coroutine, ParticipantId, Scheduler, SharedState, StateSnapshot};

/// Shared between the game loop's bot and anything else (coroutines, other
/// threads) that needs to read positions or arm a delayed callback.
pub struct AgentContext {
    scheduler: Arc<Mutex<Scheduler>>,
    shared_state: Arc<SharedState>,
    snapshot: Mutex<StateSnapshot>,
    client_id: ParticipantId,
}

impl AgentContext {
    pub fn new(scheduler: Arc<Mutex<Scheduler>>, shared_state: Arc<SharedState>, client_id: ParticipantId) -> Self {
        let snapshot = shared_state.snapshot();
        Self {
            scheduler,
            shared_state,
            snapshot: Mutex::new(snapshot),
            client_id,
        }
    }

    pub fn client_id(&self) -> ParticipantId {
        self.client_id
    }

    /// Copies the current shared position map into the cached snapshot. Call
    /// once per tick, before reading positions for that tick.
    pub fn refresh_snapshot(&self) {
        let fresh = self.shared_state.snapshot();
        *self.snapshot.lock().unwrap() = fresh;
    }

    /// The snapshot as of the most recent `refresh_snapshot()` call.
    pub fn snapshot(&self) -> StateSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    /// Arms `coroutine` to first resume `after_seconds` from now, on the
    /// scheduler this context's game loop steps each tick.
    pub fn start_coroutine(&self, coroutine: impl Coroutine + 'static, after_seconds: f64) {
        self.scheduler
            .lock()
            .unwrap()
            .add_task(Box::new(coroutine), after_seconds);
    }
}

/// Wraps a user [`Bot`] so its snapshot is refreshed before every
/// `update`/`fixed_update`, then delegates every hook unchanged.
pub struct RoundAgent<B: Bot> {
    inner: B,
    ctx: Arc<AgentContext>,
}

impl<B: Bot> RoundAgent<B> {
    pub fn new(inner: B, ctx: Arc<AgentContext>) -> Self {
        Self { inner, ctx }
    }

    pub fn context(&self) -> Arc<AgentContext> {
        self.ctx.clone()
    }
}

impl<B: Bot> Bot for RoundAgent<B> {
    fn setup(&mut self) {
        self.ctx.refresh_snapshot();
        self.inner.setup();
    }

    fn update(&mut self, delta: f64) {
        self.ctx.refresh_snapshot();
        self.inner.update(delta);
    }

    fn fixed_update(&mut self, delta: f64, sync_ratio: f64) {
        self.ctx.refresh_snapshot();
        self.inner.fixed_update(delta, sync_ratio);
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn on_message_receive(&mut self, data: &[u8]) {
        self.inner.on_message_receive(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_sim::{polygon_vertices, PositionCodec, Step};

    fn context() -> Arc<AgentContext> {
        let scheduler = Arc::new(Mutex::new(Scheduler::new()));
        let codec = PositionCodec::new(polygon_vertices(4, 100.0));
        let shared_state = Arc::new(SharedState::new(codec, &[1, 2], 1));
        Arc::new(AgentContext::new(scheduler, shared_state, 1))
    }

    #[test]
    fn snapshot_only_updates_on_refresh() {
        let ctx = context();
        assert_eq!(ctx.snapshot().position_of(2), Some([0.0, 0.0]));
    }

    #[test]
    fn start_coroutine_adds_to_shared_scheduler() {
        let ctx = context();
        ctx.start_coroutine(|| Step::Done, 0.0);
        assert_eq!(ctx.scheduler.lock().unwrap().len(), 1);
    }

    struct RecordingBot {
        setups: u32,
        updates: u32,
        fixed_updates: u32,
        closes: u32,
    }

    impl Bot for RecordingBot {
        fn setup(&mut self) {
            self.setups += 1;
        }
        fn update(&mut self, _delta: f64) {
            self.updates += 1;
        }
        fn fixed_update(&mut self, _delta: f64, _sync_ratio: f64) {
            self.fixed_updates += 1;
        }
        fn close(&mut self) {
            self.closes += 1;
        }
    }

    #[test]
    fn round_agent_delegates_every_hook() {
        let ctx = context();
        let inner = RecordingBot {
            setups: 0,
            updates: 0,
            fixed_updates: 0,
            closes: 0,
        };
        let mut agent = RoundAgent::new(inner, ctx);

        agent.setup();
        agent.update(0.016);
        agent.fixed_update(0.05, 0.3);
        agent.close();

        assert_eq!(agent.inner.setups, 1);
        assert_eq!(agent.inner.updates, 1);
        assert_eq!(agent.inner.fixed_updates, 1);
        assert_eq!(agent.inner.closes, 1);
    }
}
