//! URL frontier: a deduplicating, bounded work queue
//!
//! Every URL is admitted at most once per `Frontier` instance. Admitted tasks
//! come back out in FIFO order, which keeps a crawl roughly breadth-first:
//! listings discovered early are fetched before the job pages they spawn.

mod queue;
mod task;

pub use queue::TaskQueue;
pub use task::{CrawlTask, TaskKind};

use std::collections::HashSet;
use tokio::sync::Mutex;

pub struct Frontier {
    queue: TaskQueue,
    seen: Mutex<HashSet<String>>,
}

impl Frontier {
    /// Creates a frontier whose queue holds at most `capacity` pending tasks
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: TaskQueue::new(capacity),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Admits a task unless its URL was admitted before
    ///
    /// The seen-set lock is held until the task is enqueued, so the check and
    /// the insertion are atomic for concurrent producers. When the queue is
    /// full this waits for the consumer (backpressure).
    ///
    /// Cancel safe: the URL is only marked as seen once a queue slot is
    /// reserved, so dropping a pending `add` admits nothing and the same URL
    /// can be offered again later.
    ///
    /// # Returns
    ///
    /// * `true` - The task was enqueued
    /// * `false` - The URL had already been admitted; nothing changed
    pub async fn add(&self, task: CrawlTask) -> bool {
        let mut seen = self.seen.lock().await;

        if seen.contains(task.url()) {
            tracing::trace!("Frontier already saw {}", task.url());
            return false;
        }

        let Some(permit) = self.queue.reserve().await else {
            tracing::error!("Frontier queue closed, dropping {}", task.url());
            return false;
        };

        seen.insert(task.url().to_string());
        permit.send(task);
        true
    }

    /// Returns the oldest pending task, waiting until one is available
    pub async fn get_next(&self) -> Option<CrawlTask> {
        self.queue.dequeue().await
    }

    /// Returns the oldest pending task without waiting
    pub fn try_next(&self) -> Option<CrawlTask> {
        self.queue.try_dequeue()
    }

    /// Number of tasks enqueued and not yet dequeued
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Number of distinct URLs admitted over the frontier's lifetime
    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_duplicate_url_is_rejected() {
        let frontier = Frontier::new(10);

        assert!(frontier.add(CrawlTask::listing("A")).await);
        assert_eq!(frontier.queue_size(), 1);

        assert!(!frontier.add(CrawlTask::listing("A")).await);
        assert_eq!(frontier.queue_size(), 1);

        let task = frontier.get_next().await.unwrap();
        assert_eq!(task.url(), "A");
        assert_eq!(task.kind(), TaskKind::Listing);
        assert_eq!(frontier.queue_size(), 0);
    }

    #[tokio::test]
    async fn test_url_stays_seen_after_dequeue() {
        let frontier = Frontier::new(10);
        assert!(frontier.add(CrawlTask::job("https://example.com/a")).await);
        frontier.get_next().await.unwrap();

        // Same URL with a different kind is still a duplicate
        assert!(!frontier.add(CrawlTask::listing("https://example.com/a")).await);
        assert_eq!(frontier.queue_size(), 0);
        assert_eq!(frontier.seen_count().await, 1);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(10);
        let urls = ["u1", "u2", "u3", "u4"];
        for url in urls {
            assert!(frontier.add(CrawlTask::job(url)).await);
        }

        for url in urls {
            assert_eq!(frontier.get_next().await.unwrap().url(), url);
        }
        assert!(frontier.try_next().is_none());
    }

    #[tokio::test]
    async fn test_add_waits_when_full() {
        let frontier = Arc::new(Frontier::new(1));
        assert!(frontier.add(CrawlTask::job("first")).await);

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            frontier.add(CrawlTask::job("second")),
        )
        .await;
        assert!(blocked.is_err(), "add should wait while the queue is full");

        let producer = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.add(CrawlTask::job("third")).await })
        };

        assert_eq!(frontier.get_next().await.unwrap().url(), "first");
        assert!(producer.await.unwrap());
        assert_eq!(frontier.get_next().await.unwrap().url(), "third");
    }

    #[tokio::test]
    async fn test_abandoned_add_can_be_retried() {
        let frontier = Frontier::new(1);
        assert!(frontier.add(CrawlTask::job("first")).await);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            frontier.add(CrawlTask::job("second")),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(frontier.seen_count().await, 1);

        assert_eq!(frontier.get_next().await.unwrap().url(), "first");
        assert!(frontier.add(CrawlTask::job("second")).await);
        assert_eq!(frontier.queue_size(), 1);
        assert_eq!(frontier.seen_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_producers_admit_each_url_once() {
        let frontier = Arc::new(Frontier::new(100));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let frontier = Arc::clone(&frontier);
            handles.push(tokio::spawn(async move {
                let mut admitted = 0;
                for i in 0..10 {
                    if frontier.add(CrawlTask::job(format!("job-{}", i))).await {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 10);
        assert_eq!(frontier.queue_size(), 10);
    }
}
