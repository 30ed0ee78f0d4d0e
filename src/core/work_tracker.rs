use std::sync::{Condvar, Mutex};

/// Counts generation work that has been enqueued but not yet published.
///
/// The store increments the counter when it enqueues a coordinate and a worker
/// decrements it after publishing (or failing) that coordinate. Callers that
/// need a complete snapshot block in [`WorkTracker::wait_until_idle`] until
/// the counter reaches zero; the condvar wakes them promptly rather than
/// leaving them to poll.
pub struct WorkTracker {
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl WorkTracker {
    /// Creates a tracker with no outstanding work.
    pub fn new() -> Self {
        WorkTracker {
            outstanding: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    /// Records `count` newly enqueued units of work.
    pub fn add(&self, count: usize) {
        let mut outstanding = self.outstanding.lock().unwrap();
        *outstanding += count;
    }

    /// Records one finished unit of work, waking idle waiters at zero.
    pub fn finish(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        debug_assert!(*outstanding > 0, "finish() without matching add()");
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }

    /// Returns the number of units currently in flight or queued.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock().unwrap()
    }

    /// Blocks the calling thread until the counter reaches zero.
    ///
    /// Returns immediately if no work is outstanding.
    pub fn wait_until_idle(&self) {
        let mut outstanding = self.outstanding.lock().unwrap();
        while *outstanding > 0 {
            outstanding = self.idle.wait(outstanding).unwrap();
        }
    }
}

impl Default for WorkTracker {
    fn default() -> Self {
        Self::new()
    }
}
