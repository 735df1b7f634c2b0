//! In-order commit buffer
//!
//! Workers settle records in whatever order their fetches complete. The
//! coordinator pushes each settled record here and only takes results back
//! out in strictly increasing [`RecordId`] order, so everything downstream
//! (link discovery, content dedup, page caps) sees the same sequence a
//! single-threaded breadth-first crawl would.

use crate::crawler::frontier::RecordId;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CommitQueue<T> {
    next: RecordId,
    settled: BTreeMap<RecordId, T>,
}

impl<T> Default for CommitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CommitQueue<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            settled: BTreeMap::new(),
        }
    }

    /// Buffers the settled result for `id`
    ///
    /// Ids below the commit point are ignored; each id commits once.
    pub fn settle(&mut self, id: RecordId, value: T) {
        if id >= self.next {
            self.settled.entry(id).or_insert(value);
        }
    }

    /// Takes the next result if it is the one the commit point waits for
    pub fn pop_ready(&mut self) -> Option<(RecordId, T)> {
        let value = self.settled.remove(&self.next)?;
        let id = self.next;
        self.next += 1;
        Some((id, value))
    }

    /// Empties the buffer in id order, skipping gaps
    pub fn drain_all(&mut self) -> Vec<(RecordId, T)> {
        let drained: Vec<_> = std::mem::take(&mut self.settled).into_iter().collect();
        if let Some((last, _)) = drained.last() {
            self.next = last + 1;
        }
        drained
    }

    /// Id the commit point is waiting for
    pub fn next_id(&self) -> RecordId {
        self.next
    }

    pub fn buffered(&self) -> usize {
        self.settled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_settles_commit_in_order() {
        let mut queue = CommitQueue::new();
        queue.settle(2, "c");
        queue.settle(1, "b");
        assert_eq!(queue.pop_ready(), None);

        queue.settle(0, "a");
        assert_eq!(queue.pop_ready(), Some((0, "a")));
        assert_eq!(queue.pop_ready(), Some((1, "b")));
        assert_eq!(queue.pop_ready(), Some((2, "c")));
        assert_eq!(queue.pop_ready(), None);
        assert_eq!(queue.next_id(), 3);
    }

    #[test]
    fn test_duplicate_and_stale_settles_ignored() {
        let mut queue = CommitQueue::new();
        queue.settle(0, 1);
        queue.settle(0, 2);
        assert_eq!(queue.pop_ready(), Some((0, 1)));

        queue.settle(0, 3);
        assert_eq!(queue.buffered(), 0);
    }

    #[test]
    fn test_drain_all_skips_gaps() {
        let mut queue = CommitQueue::new();
        queue.settle(4, 'e');
        queue.settle(1, 'b');
        queue.settle(3, 'd');

        assert_eq!(queue.drain_all(), vec![(1, 'b'), (3, 'd'), (4, 'e')]);
        assert_eq!(queue.buffered(), 0);
        assert_eq!(queue.next_id(), 5);
    }
}
