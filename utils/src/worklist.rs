use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// FIFO work queue. An item already waiting in the queue is not queued twice.
#[derive(Debug, Clone)]
pub struct Worklist<T> {
    queue: VecDeque<T>,
    queued: HashSet<T>,
}

impl<T: Copy + Eq + Hash> Worklist<T> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.queued.insert(item) {
            self.queue.push_back(item);
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.queue.pop_front()?;
        self.queued.remove(&item);
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Copy + Eq + Hash> Default for Worklist<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> Extend<T> for Worklist<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}
