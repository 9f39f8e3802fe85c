use crate::domain::Event;
use std::collections::VecDeque;

/// Unbounded FIFO queue of engine events. No priority, no deduplication.
#[derive(Debug, Default)]
pub struct EventChannel {
    queue: VecDeque<Event>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Remove and return the oldest event, or `None` when empty.
    pub fn drain_one(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
