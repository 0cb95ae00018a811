use std::collections::VecDeque;

/// Fixed-capacity ordered buffer that always keeps the most recent entries,
/// evicting from the front. Storage-agnostic; the session stores use it for
/// the `append` eviction policy.
///
/// ```
/// use chatwire_session::BoundedLog;
///
/// let mut log = BoundedLog::new(3);
/// for n in 1..=5 {
///     log.push(n);
/// }
/// assert_eq!(log.into_vec(), vec![3, 4, 5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// A capacity of zero is clamped to one; a log that can hold nothing
    /// has no meaningful push semantics.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
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

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items.into_iter().collect()
    }
}
