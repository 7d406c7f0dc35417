//! Pending value-change queue

use std::collections::VecDeque;

use tracing::trace;

use crate::protocol::Update;

/// Queue capacity; the flush drains everything into one `DataUpdate`
pub const MAX_UPDATES: usize = 10;

/// Bounded FIFO of updates awaiting transmission
///
/// This is a best-effort telemetry channel: when the queue is full the new
/// update is dropped, not the oldest, and nothing blocks. The master keeps
/// polling, so a dropped intermediate value only shortens the history it
/// sees.
#[derive(Debug)]
pub struct UpdateQueue {
    queue: VecDeque<Update>,
}

impl UpdateQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::with_capacity(MAX_UPDATES),
        }
    }

    /// Queue an update; silently dropped when full
    pub fn push(&mut self, update: Update) {
        if self.queue.len() >= MAX_UPDATES {
            trace!(
                assignment_id = update.assignment_id,
                "update queue full, dropping"
            );
            return;
        }
        self.queue.push_back(update);
    }

    /// Take the oldest queued update
    pub fn pop(&mut self) -> Option<Update> {
        self.queue.pop_front()
    }

    /// Drop everything (master reset)
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Number of queued updates
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check for an empty queue
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}
