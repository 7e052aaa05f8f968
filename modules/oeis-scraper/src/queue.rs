use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

/// Concurrency-safe FIFO with join semantics.
///
/// Every `push` must eventually be balanced by a `task_done` from the worker
/// that consumed (or discarded) the item; `join` resolves once the counts
/// balance. `pop` suspends while the queue is empty, so workers can be
/// spawned before or after seeding.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    unfinished: AtomicUsize,
    item_added: Notify,
    all_done: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            unfinished: AtomicUsize::new(0),
            item_added: Notify::new(),
            all_done: Notify::new(),
        }
    }

    pub fn push(&self, item: T) {
        self.unfinished.fetch_add(1, Ordering::AcqRel);
        self.items.lock().unwrap().push_back(item);
        self.item_added.notify_one();
    }

    /// Remove and return the oldest item, waiting if the queue is empty.
    pub async fn pop(&self) -> T {
        loop {
            // Arm the notification before checking, so a push between the
            // check and the await still wakes this task.
            let notified = self.item_added.notified();
            if let Some(item) = self.items.lock().unwrap().pop_front() {
                return item;
            }
            notified.await;
        }
    }

    /// Acknowledge one consumed item.
    pub fn task_done(&self) {
        if self.unfinished.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.all_done.notify_waiters();
        }
    }

    /// Resolve once every pushed item has been acknowledged.
    pub async fn join(&self) {
        loop {
            let notified = self.all_done.notified();
            if self.unfinished.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
