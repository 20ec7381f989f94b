//! A manual-reset event, the `Condvar`-backed equivalent of `threading.Event`
//! used to gate the game loop and lifecycle manager across threads.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub struct Event {
    flag: Mutex<bool>,
    condvar: Condvar,
}

impl Event {
    pub fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.condvar.notify_all();
    }

    pub fn clear(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = false;
    }

    pub fn is_set(&self) -> bool {
        *self.flag.lock().unwrap()
    }

    /// Blocks until the event is set, with no timeout.
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.condvar.wait(flag).unwrap();
        }
    }

    /// Blocks until the event is set or `timeout` elapses, whichever first.
    /// Returns `true` iff the event was observed set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let flag = self.flag.lock().unwrap();
        if *flag {
            return true;
        }
        let (flag, result) = self.condvar.wait_timeout(flag, timeout).unwrap();
        *flag || !result.timed_out()
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_unblocks_after_set() {
        let event = Arc::new(Event::new());
        let waiter = event.clone();
        let handle = thread::spawn(move || waiter.wait());
        event.set();
        handle.join().unwrap();
    }

    #[test]
    fn wait_timeout_returns_false_when_not_set() {
        let event = Event::new();
        assert!(!event.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn wait_timeout_returns_true_when_already_set() {
        let event = Event::new();
        event.set();
        assert!(event.wait_timeout(Duration::from_millis(0)));
    }
}
