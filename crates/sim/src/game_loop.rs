//! Game Loop: the semi-fixed timestep from Gaffer-on-Games.
//!
//! <https://gafferongames.com/post/fix_your_timestep/>
//!
//! Interpolating between frames is deliberately not implemented: it solves
//! stutter and time-dilation artifacts that only matter for rendering, and
//! this runtime never renders anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::bot::Bot;
use crate::clock::{Clock, SystemClock};
use crate::config::GameLoopConfig;
use crate::event::Event;
use crate::scheduler::Scheduler;

/// Sets `completely_finished` when dropped, including on an unwinding panic,
/// so a concurrent `quit(timeout)` call is never left waiting forever just
/// because a bot hook panicked partway through an iteration.
struct FinishGuard<'a>(&'a Event);
impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// Runs one [`Bot`] at a fixed cadence until told to quit.
pub struct GameLoop<B: Bot> {
    bot: B,
    scheduler: Arc<Mutex<Scheduler>>,
    config: GameLoopConfig,
    clock: Arc<dyn Clock>,
    quit: Arc<Event>,
    completely_finished: Arc<Event>,
    close_called: AtomicBool,
}

impl<B: Bot> GameLoop<B> {
    pub fn new(bot: B, scheduler: Scheduler, config: GameLoopConfig) -> Self {
        Self::with_clock(bot, scheduler, config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(bot: B, scheduler: Scheduler, config: GameLoopConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_shared_scheduler(bot, Arc::new(Mutex::new(scheduler)), config, clock)
    }

    /// Like [`Self::with_clock`], but takes a scheduler already shared with
    /// another holder (e.g. an `AgentContext` that exposes `start_coroutine`
    /// to the wrapped bot) instead of taking sole ownership of a fresh one.
    pub fn with_shared_scheduler(
        bot: B,
        scheduler: Arc<Mutex<Scheduler>>,
        config: GameLoopConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bot,
            scheduler,
            config,
            clock,
            quit: Arc::new(Event::new()),
            completely_finished: Arc::new(Event::new()),
            close_called: AtomicBool::new(false),
        }
    }

    /// A handle that can signal quit from another thread without holding a
    /// reference to the whole `GameLoop` (which is busy running on its own
    /// thread).
    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            quit: self.quit.clone(),
            completely_finished: self.completely_finished.clone(),
        }
    }

    pub fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    /// A clone of the scheduler handle this loop steps, for a caller that
    /// wants to hand out `start_coroutine` access before construction
    /// completes (see `with_shared_scheduler`).
    pub fn scheduler_handle(&self) -> Arc<Mutex<Scheduler>> {
        self.scheduler.clone()
    }

    /// Runs until `quit()`/`signal_quit()` is observed. `setup()` runs once
    /// before the first iteration.
    ///
    /// # Panics
    /// If the loop has already run to completion once (`quit` already set).
    pub fn run(&mut self) {
        assert!(
            !self.quit.is_set(),
            "the game loop has already finished and cannot be started again"
        );

        let _finish_guard = FinishGuard(&self.completely_finished);

        tracing::debug!("setup");
        self.bot.setup();

        let frame_time = self.config.frame_time();
        let mut current_time = self.clock.now();
        let mut accumulator = 0.0;

        while !self.quit.is_set() {
            let new_time = self.clock.now();
            let frame = new_time - current_time;
            current_time = new_time;

            accumulator = self.run_iteration(frame, accumulator);

            let remaining = frame_time - (self.clock.now() - current_time);
            if remaining > 0.0 {
                self.quit.wait_timeout(Duration::from_secs_f64(remaining));
            }
        }
    }

    /// Runs the fixed_update* / update / scheduler.step() sequence for one
    /// already-measured frame and returns the updated accumulator. Split out
    /// of `run()` so the spiral-of-hell bound and fixed-update count can be
    /// tested by injecting a frame directly instead of faking wall-clock
    /// gaps between two back-to-back clock reads.
    fn run_iteration(&mut self, frame: f64, mut accumulator: f64) -> f64 {
        let max_delta_time = self.config.effective_max_delta_time();
        let fixed_delta = self.config.fixed_delta();

        if frame > max_delta_time {
            tracing::warn!(frame, max_delta_time, "frame exceeded max_delta_time, clamping");
        }
        let frame = frame.min(max_delta_time);
        accumulator += frame;

        let iteration_start = self.clock.now();
        while accumulator >= fixed_delta {
            self.bot.fixed_update(fixed_delta, accumulator / fixed_delta);
            accumulator -= fixed_delta;
        }

        // Include the time fixed_update() itself took so `delta` reflects
        // the real gap between successive update() calls.
        let delta = (frame + (self.clock.now() - iteration_start)).min(max_delta_time);
        self.bot.update(delta);

        self.scheduler.lock().unwrap().step();

        accumulator
    }

    pub fn has_finished(&self) -> bool {
        self.completely_finished.is_set()
    }

    /// Sets quit and blocks until the loop has completely finished, then
    /// calls `close()` exactly once. Idempotent: a second call (or a call
    /// after `signal_quit()` already requested the stop) returns after the
    /// wait without calling `close()` again.
    pub fn quit(&mut self, timeout: Option<Duration>) {
        let first_call = !self.close_called.load(Ordering::SeqCst);
        if first_call {
            tracing::debug!("quit requested");
        }
        self.quit.set();
        match timeout {
            Some(t) => {
                self.completely_finished.wait_timeout(t);
            }
            None => self.completely_finished.wait(),
        }
        if !self.close_called.swap(true, Ordering::SeqCst) {
            tracing::debug!("close");
            self.bot.close();
        }
    }

    /// Only sets the quit flag; safe to call from the loop's own thread to
    /// avoid the self-join deadlock that calling `quit()` there would cause.
    pub fn signal_quit(&self) {
        self.quit.set();
    }
}

/// A cross-thread handle that can only signal quit, not observe or close
/// the bot -- handed to the lifecycle manager so it need not hold a `&mut
/// GameLoop` while the loop's own thread is running it.
#[derive(Clone)]
pub struct QuitHandle {
    quit: Arc<Event>,
    completely_finished: Arc<Event>,
}

impl QuitHandle {
    pub fn signal_quit(&self) {
        self.quit.set();
    }

    pub fn wait_finished(&self, timeout: Option<Duration>) {
        match timeout {
            Some(t) => {
                self.completely_finished.wait_timeout(t);
            }
            None => self.completely_finished.wait(),
        }
    }

    pub fn has_finished(&self) -> bool {
        self.completely_finished.is_set()
    }
}
