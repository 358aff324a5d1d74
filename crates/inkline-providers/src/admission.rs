//! Rate-limited admission queue for backend calls
//!
//! Model sessions serialize poorly under concurrent prompts, so every
//! backend call in the process funnels through one queue: exactly one task
//! in flight, strict FIFO order, and a minimum gap between a task settling
//! and the next one starting so bursts never hammer the backend.
//!
//! Foreground completion requests and background prefetch requests share the
//! same lane; there is no priority field on queued tasks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::Instant;

const DEFAULT_MIN_GAP: Duration = Duration::from_millis(40);

/// Single-flight FIFO executor with a minimum inter-call gap
pub struct AdmissionQueue {
    permit: Arc<Semaphore>,
    min_gap: Duration,
    next_start: Mutex<Instant>,
}

impl AdmissionQueue {
    /// Create a queue with the default 40 ms gap
    pub fn new() -> Self {
        Self::with_gap(DEFAULT_MIN_GAP)
    }

    /// Create a queue with an explicit gap between settled tasks
    pub fn with_gap(min_gap: Duration) -> Self {
        Self {
            // tokio's semaphore queues waiters fairly, which gives us FIFO
            // service order for free.
            permit: Arc::new(Semaphore::new(1)),
            min_gap,
            next_start: Mutex::new(Instant::now()),
        }
    }

    /// Run `task` once an admission slot is free.
    ///
    /// The task's own output (success or failure) is returned untouched;
    /// a failing task never affects queued siblings. If the returned future
    /// is dropped while waiting, the slot is released without consuming a
    /// gap.
    pub async fn execute<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _slot = self
            .permit
            .acquire()
            .await
            .expect("admission queue semaphore never closes");

        let earliest = *self.next_start.lock();
        tokio::time::sleep_until(earliest).await;

        let output = task.await;
        *self.next_start.lock() = Instant::now() + self.min_gap;
        output
    }
}

impl Default for AdmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn never_more_than_one_task_in_flight() {
        let queue = Arc::new(AdmissionQueue::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .execute(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_order_matches_submission_order() {
        let queue = Arc::new(AdmissionQueue::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = queue.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .execute(async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        order.lock().push(i);
                    })
                    .await;
            }));
            // Let each submitter reach the semaphore before the next one.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_gap_between_tasks() {
        let queue = AdmissionQueue::new();

        let start = Instant::now();
        queue.execute(async {}).await;
        queue.execute(async {}).await;

        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_poison_the_queue() {
        let queue = AdmissionQueue::new();

        let failed: Result<(), String> = queue
            .execute(async { Err("backend exploded".to_string()) })
            .await;
        assert!(failed.is_err());

        let ok: Result<u32, String> = queue.execute(async { Ok(42) }).await;
        assert_eq!(ok.unwrap(), 42);
    }
}
