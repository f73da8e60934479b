use std::collections::VecDeque;

use super::types::Keyed;

/// Bounded list of items ordered newest first.
///
/// Holds at most `capacity` items. Prepending past capacity evicts the
/// oldest entries from the back.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Keyed + Clone> PagedList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the contents, keeping the first `capacity` items.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items.into_iter().take(self.capacity).collect();
    }

    /// Prepend `item` unless an item with the same key is already held.
    /// Returns false when the key was already present.
    pub fn prepend_unique(&mut self, item: T) -> bool {
        let key = item.key();
        if self.contains_key(&key) {
            return false;
        }

        self.items.push_front(item);
        self.items.truncate(self.capacity);
        true
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.items.iter().any(|i| &i.key() == key)
    }

    /// Key of the newest item.
    pub fn first_key(&self) -> Option<T::Key> {
        self.items.front().map(Keyed::key)
    }

    /// Key of the oldest item.
    pub fn last_key(&self) -> Option<T::Key> {
        self.items.back().map(Keyed::key)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    pub fn head(&self, len: usize) -> Vec<T> {
        self.items.iter().take(len).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear()
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
