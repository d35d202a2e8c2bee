//! Bounded write groups
//!
//! A [`WriteGroup`] accumulates records until it holds `capacity` of them,
//! at which point [`WriteGroup::push`] hands the full batch back for
//! submission. [`WriteGroup::take`] drains whatever is left at end of
//! stream. Neither ever yields an empty batch.

/// Append-only buffer that flushes at a fixed size
#[derive(Debug)]
pub struct WriteGroup<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> WriteGroup<T> {
    /// Create an empty group. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the full batch once capacity is reached
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);

        if self.items.len() >= self.capacity {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Remove the pending items, or None when nothing is pending
    pub fn take(&mut self) -> Option<Vec<T>> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.drain())
        }
    }

    /// First pending item matching `predicate`
    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.items.iter_mut().find(|item| predicate(&**item))
    }

    fn drain(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
