//! Rate-limited request queue.
//!
//! Every outbound ranking call goes through one [`RequestQueue`]. Jobs start
//! strictly in submission order and consecutive start times are at least
//! [`MIN_REQUEST_INTERVAL`] apart. A single drain task owns execution, so at
//! most one queued job runs at a time.
//!
//! The drain task is spawned by the submission that finds the queue idle and
//! exits once the queue is empty; later submissions only append while it is
//! running. Both decisions are taken under the same lock.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::time::Instant;

use crate::QueueError;

/// Minimum gap between the start times of two consecutive jobs.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

type Job = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

#[derive(Default)]
struct SchedulerState {
    last_request: Option<Instant>,
    pending: VecDeque<Job>,
    draining: bool,
}

/// FIFO queue with a single admission gate.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct RequestQueue {
    state: Arc<Mutex<SchedulerState>>,
    min_interval: Duration,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

impl RequestQueue {
    /// Create an idle queue paced at [`MIN_REQUEST_INTERVAL`].
    pub fn new() -> Self {
        Self::with_interval(MIN_REQUEST_INTERVAL)
    }

    /// Create an idle queue with a custom pacing interval.
    pub fn with_interval(min_interval: Duration) -> Self {
        Self { state: Arc::new(Mutex::new(SchedulerState::default())), min_interval }
    }

    /// Number of jobs waiting to start.
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether a drain task is currently active.
    pub async fn is_draining(&self) -> bool {
        self.state.lock().await.draining
    }

    /// Submit an operation and wait for its result.
    ///
    /// The operation runs exactly once, even if the returned future is
    /// dropped before it resolves.
    pub async fn enqueue<F, Fut, T>(&self, operation: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let _ = tx.send(operation().await);
            })
        });

        let start_drain = {
            let mut state = self.state.lock().await;
            state.pending.push_back(job);
            tracing::debug!(pending = state.pending.len(), draining = state.draining, "request queued");
            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.state), self.min_interval));
        }

        rx.await.map_err(|_| QueueError::Interrupted)
    }
}

async fn drain(state: Arc<Mutex<SchedulerState>>, min_interval: Duration) {
    loop {
        let wait = {
            let mut guard = state.lock().await;
            if guard.pending.is_empty() {
                guard.draining = false;
                return;
            }
            guard
                .last_request
                .map(|last| min_interval.saturating_sub(last.elapsed()))
                .unwrap_or_default()
        };

        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "pacing next request");
            tokio::time::sleep(wait).await;
        }

        let job = {
            let mut guard = state.lock().await;
            match guard.pending.pop_front() {
                Some(job) => {
                    guard.last_request = Some(Instant::now());
                    job
                }
                None => {
                    guard.draining = false;
                    return;
                }
            }
        };

        if let Err(e) = tokio::spawn(job()).await {
            tracing::warn!(error = %e, "queued request panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Starts = Arc<StdMutex<Vec<(usize, Instant)>>>;

    type Recorded = Pin<Box<dyn Future<Output = usize> + Send>>;

    fn recording(starts: &Starts, index: usize, work: Duration) -> impl FnOnce() -> Recorded + Send + 'static {
        let starts = Arc::clone(starts);
        move || {
            Box::pin(async move {
                starts.lock().unwrap().push((index, Instant::now()));
                tokio::time::sleep(work).await;
                index
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_starts_immediately() {
        let queue = RequestQueue::new();
        let starts: Starts = Arc::default();
        let t0 = Instant::now();

        queue.enqueue(recording(&starts, 0, Duration::ZERO)).await.unwrap();

        let started = starts.lock().unwrap()[0].1;
        assert!(started.duration_since(t0) < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_consecutive_starts() {
        let queue = RequestQueue::new();
        let starts: Starts = Arc::default();

        let (a, b, c, d) = tokio::join!(
            queue.enqueue(recording(&starts, 0, Duration::from_millis(10))),
            queue.enqueue(recording(&starts, 1, Duration::ZERO)),
            queue.enqueue(recording(&starts, 2, Duration::from_millis(2500))),
            queue.enqueue(recording(&starts, 3, Duration::ZERO)),
        );
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()), (0, 1, 2, 3));

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            let gap = pair[1].1.duration_since(pair[0].1);
            assert!(gap >= MIN_REQUEST_INTERVAL, "gap {gap:?} below interval");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_independent_of_duration() {
        let queue = RequestQueue::new();
        let starts: Starts = Arc::default();

        let slow = queue.enqueue(recording(&starts, 0, Duration::from_secs(5)));
        let fast = queue.enqueue(recording(&starts, 1, Duration::ZERO));
        let quick = queue.enqueue(recording(&starts, 2, Duration::ZERO));
        let _ = tokio::join!(slow, fast, quick);

        let order: Vec<usize> = starts.lock().unwrap().iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_each_operation_exactly_once() {
        let queue = RequestQueue::with_interval(Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let queue = queue.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                queue
                    .enqueue(move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_draining() {
        let queue = RequestQueue::new();

        let (failed, ok) = tokio::join!(
            queue.enqueue(|| async { Err::<u8, &str>("boom") }),
            queue.enqueue(|| async { Ok::<u8, &str>(7) }),
        );

        assert_eq!(failed.unwrap(), Err("boom"));
        assert_eq!(ok.unwrap(), Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_resolves_caller_and_drain_continues() {
        let queue = RequestQueue::new();

        let (panicked, ok) = tokio::join!(
            queue.enqueue(|| async {
                if true {
                    panic!("job exploded");
                }
                0u8
            }),
            queue.enqueue(|| async { 1u8 }),
        );

        assert_eq!(panicked, Err(QueueError::Interrupted));
        assert_eq!(ok, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_queue_restarts_with_pacing() {
        let queue = RequestQueue::new();
        let starts: Starts = Arc::default();

        queue.enqueue(recording(&starts, 0, Duration::ZERO)).await.unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!queue.is_draining().await);

        queue.enqueue(recording(&starts, 1, Duration::ZERO)).await.unwrap();

        let starts = starts.lock().unwrap();
        assert!(starts[1].1.duration_since(starts[0].1) >= MIN_REQUEST_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_longer_than_interval_needs_no_wait() {
        let queue = RequestQueue::new();
        let starts: Starts = Arc::default();

        queue.enqueue(recording(&starts, 0, Duration::ZERO)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        let before = Instant::now();
        queue.enqueue(recording(&starts, 1, Duration::ZERO)).await.unwrap();

        let started = starts.lock().unwrap()[1].1;
        assert!(started.duration_since(before) < Duration::from_millis(1));
    }
}
