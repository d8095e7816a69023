//! The queue of pages to fetch, shared by all the workers.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use log::trace;

use crate::models::WorkItem;

/// A FIFO of [`WorkItem`]s, filled once and drained by the workers.
///
/// Items are never put back: an item taken by a worker is either fetched
/// or abandoned for this run.
pub struct WorkQueue {
    receiver: Receiver<WorkItem>,
}

impl WorkQueue {
    /// Creates the queue holding all the items, in order.
    pub fn new(items: Vec<WorkItem>) -> Self {
        trace!("Creating a WorkQueue of {} items", items.len());
        let (sender, receiver) = unbounded();
        for item in items {
            // The receiver lives in the same scope, sending can't fail.
            let _ = sender.send(item);
        }
        // Dropping the only sender makes an empty queue disconnected, so
        // the workers don't wait on it.
        drop(sender);
        WorkQueue { receiver }
    }

    /// Takes the next item, waiting at most `timeout`.
    /// Returns `None` when the queue is drained.
    pub fn next(&self, timeout: Duration) -> Option<WorkItem> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// The number of items not taken yet.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifier;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;

    fn items(count: usize) -> Vec<WorkItem> {
        (0..count)
            .map(|i| {
                let id = Identifier::new(&format!("CVE-2024-{:04}", i)).unwrap();
                WorkItem::new(id, "https://example.org")
            })
            .collect()
    }

    #[test]
    fn items_come_out_in_order() {
        let queue = WorkQueue::new(items(3));
        assert_eq!(3, queue.len());
        let timeout = Duration::from_millis(10);
        assert_eq!("CVE-2024-0000", queue.next(timeout).unwrap().identifier.as_str());
        assert_eq!("CVE-2024-0001", queue.next(timeout).unwrap().identifier.as_str());
        assert_eq!("CVE-2024-0002", queue.next(timeout).unwrap().identifier.as_str());
        assert!(queue.is_empty());
        assert!(queue.next(timeout).is_none());
    }

    #[test]
    fn empty_queue_returns_immediately() {
        let queue = WorkQueue::new(Vec::new());
        assert!(queue.is_empty());
        assert!(queue.next(Duration::from_secs(60)).is_none());
    }

    #[test]
    fn each_item_is_taken_once() {
        let queue = WorkQueue::new(items(500));
        let seen = Mutex::new(Vec::new());
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    while let Some(item) = queue.next(Duration::from_millis(10)) {
                        seen.lock().unwrap().push(item.identifier);
                    }
                });
            }
        });
        let seen = seen.into_inner().unwrap();
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(500, seen.len());
        assert_eq!(500, unique.len());
    }
}
