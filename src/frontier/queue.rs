//! Bounded FIFO of pending crawl tasks
//!
//! A thin wrapper over a tokio mpsc channel that owns both ends, so the
//! channel never closes while the queue is alive. Enqueueing into a full
//! queue waits for the consumer instead of dropping or growing.

use crate::frontier::CrawlTask;
use tokio::sync::{mpsc, Mutex};

pub struct TaskQueue {
    sender: mpsc::Sender<CrawlTask>,
    receiver: Mutex<mpsc::Receiver<CrawlTask>>,
}

impl TaskQueue {
    /// Creates a queue holding at most `capacity` tasks (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Appends a task, waiting while the queue is full
    ///
    /// Returns the task back if the queue can no longer accept work.
    pub async fn enqueue(&self, task: CrawlTask) -> Result<(), CrawlTask> {
        self.sender.send(task).await.map_err(|err| err.0)
    }

    /// Waits for a free slot and holds it until the permit is used or dropped
    ///
    /// Dropping the returned future or the permit gives the slot back, so a
    /// cancelled reservation leaves the queue untouched.
    pub async fn reserve(&self) -> Option<mpsc::Permit<'_, CrawlTask>> {
        self.sender.reserve().await.ok()
    }

    /// Removes the oldest task, waiting until one is available
    pub async fn dequeue(&self) -> Option<CrawlTask> {
        self.receiver.lock().await.recv().await
    }

    /// Removes the oldest task if one is ready right now
    pub fn try_dequeue(&self) -> Option<CrawlTask> {
        let mut receiver = self.receiver.try_lock().ok()?;
        receiver.try_recv().ok()
    }

    /// Number of tasks enqueued and not yet dequeued
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}
