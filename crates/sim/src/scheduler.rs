//! Priority Queue & Coroutine Scheduler.
//!
//! Rust has no stackful/stackless generators exposed the way the original
//! client used `async`/`yield` for its coroutines, so the resumable unit is
//! modeled as a trait object: `resume()` returns either another wait point
//! or completion. Callers drive their own state machine across calls.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// What a coroutine does when resumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Sleep for this many seconds (must be non-negative) before the next resume.
    Yield(f64),
    /// The coroutine has finished; it will not be resumed again.
    Done,
}

/// A resumable unit of cooperative work.
pub trait Coroutine: Send {
    fn resume(&mut self) -> Step;
}

impl<F> Coroutine for F
where
    F: FnMut() -> Step + Send,
{
    fn resume(&mut self) -> Step {
        (self)()
    }
}

struct WaitTask {
    coroutine: Box<dyn Coroutine>,
    wake_at: f64,
    seq: u64,
}

impl PartialEq for WaitTask {
    fn eq(&self, other: &Self) -> bool {
        self.wake_at == other.wake_at && self.seq == other.seq
    }
}
impl Eq for WaitTask {}

impl Ord for WaitTask {
    /// Reversed so that `BinaryHeap` (a max-heap) behaves as a min-heap
    /// keyed by `wake_at`, ties broken by insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .wake_at
            .partial_cmp(&self.wake_at)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for WaitTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Drains coroutines whose wake time has passed, once per frame.
pub struct Scheduler {
    tasks: BinaryHeap<WaitTask>,
    next_seq: u64,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: BinaryHeap::new(),
            next_seq: 0,
            clock,
        }
    }

    /// Schedules `coroutine` to first resume `after_seconds` from now.
    pub fn add_task(&mut self, coroutine: Box<dyn Coroutine>, after_seconds: f64) {
        let wake_at = self.clock.now() + after_seconds;
        self.push(coroutine, wake_at);
    }

    fn push(&mut self, coroutine: Box<dyn Coroutine>, wake_at: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(WaitTask {
            coroutine,
            wake_at,
            seq,
        });
    }

    /// Resumes every task whose `wake_at <= now`, in wake-at order (ties by
    /// insertion order). Coroutines that yield are rescheduled for a later
    /// `step()`, never re-resumed within this same call, even if they yield
    /// `0`; coroutines that finish are dropped.
    pub fn step(&mut self) {
        let now = self.clock.now();

        // Drain the due tasks into a batch first, then resume them. If we
        // resumed-and-requeued one at a time, a task yielding 0 would land
        // right back at wake_at == now and get picked up again in the same
        // call, looping forever.
        let mut ready = Vec::new();
        while self.tasks.peek().is_some_and(|t| t.wake_at <= now) {
            ready.push(self.tasks.pop().unwrap());
        }

        for mut task in ready {
            match task.coroutine.resume() {
                Step::Yield(seconds) => {
                    let wake_at = now + seconds.max(0.0);
                    self.push(task.coroutine, wake_at);
                }
                Step::Done => {}
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// `sleep(seconds)` as a one-shot coroutine: yields once, then completes.
pub fn sleep(seconds: f64) -> impl Coroutine {
    let mut yielded = false;
    move || {
        if yielded {
            Step::Done
        } else {
            yielded = true;
            Step::Yield(seconds)
        }
    }
}

/// `next_update()`: resumes on the very next `step()`.
pub fn next_update() -> impl Coroutine {
    sleep(0.0)
}
