//! # Built-in dispatcher: one worker task, FIFO jobs, panic isolation.
//!
//! [`ContextDispatcher`] owns a dedicated Tokio task identified by a
//! task-local context id. Jobs arrive through an unbounded queue and run
//! strictly in order; a panicking job is caught, reported and never takes the
//! worker down.
//!
//! ## Architecture
//! ```text
//! post/run ──► [unbounded queue] ──► worker task ──► job()
//!                                        │              └─► panic caught →
//!                                        │                  DispatchError::Panicked
//!                                        └─ select! on CancellationToken
//! ```
//!
//! Shutdown cancels the token and joins the worker; jobs still queued are
//! dropped and their `run` callers observe [`DispatchError::Closed`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::dispatch::{Dispatch, Job};
use crate::error::{panic_reason, DispatchError};

/// Global sequence for context identities.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    /// Context id of the dispatcher whose worker is running the current task.
    static CURRENT_CONTEXT: u64;
}

struct QueuedJob {
    job: Job,
    done: Option<oneshot::Sender<Result<(), DispatchError>>>,
}

/// Dedicated-worker [`Dispatch`] implementation.
///
/// # Example
/// ```no_run
/// use typebus::{ContextDispatcher, Dispatch};
///
/// # async fn demo() {
/// let ctx = ContextDispatcher::spawn();
/// ctx.run(Box::new(|| println!("on the worker")))
///     .await
///     .unwrap();
/// ctx.shutdown().await;
/// # }
/// ```
pub struct ContextDispatcher {
    id: u64,
    tx: mpsc::UnboundedSender<QueuedJob>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ContextDispatcher {
    /// Spawns the worker task and returns the dispatcher handle.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn spawn() -> Arc<Self> {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedJob>();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let handle = tokio::spawn(CURRENT_CONTEXT.scope(id, async move {
            loop {
                tokio::select! {
                    _ = worker_cancel.cancelled() => break,
                    item = rx.recv() => {
                        let Some(QueuedJob { job, done }) = item else { break };
                        let result = Self::execute(job);
                        if let Err(err) = &result {
                            warn!(context = id, error = %err, "dispatched job failed");
                        }
                        if let Some(done) = done {
                            let _ = done.send(result);
                        }
                    }
                }
            }
        }));

        Arc::new(Self {
            id,
            tx,
            cancel,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Stops accepting work and joins the worker.
    ///
    /// Queued jobs are dropped; their `run` callers observe
    /// [`DispatchError::Closed`]. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }
    }

    /// Runs one job with panic isolation.
    fn execute(job: Job) -> Result<(), DispatchError> {
        catch_unwind(AssertUnwindSafe(job)).map_err(|payload| DispatchError::Panicked {
            reason: panic_reason(payload.as_ref()),
        })
    }
}

#[async_trait]
impl Dispatch for ContextDispatcher {
    fn is_on_context(&self) -> bool {
        CURRENT_CONTEXT
            .try_with(|ctx| *ctx == self.id)
            .unwrap_or(false)
    }

    fn post(&self, job: Job) {
        if self
            .tx
            .send(QueuedJob { job, done: None })
            .is_err()
        {
            warn!(context = self.id, "dispatch context closed; job dropped");
        }
    }

    async fn run(&self, job: Job) -> Result<(), DispatchError> {
        if self.is_on_context() {
            return Self::execute(job);
        }
        let (done, observed) = oneshot::channel();
        self.tx
            .send(QueuedJob {
                job,
                done: Some(done),
            })
            .map_err(|_| DispatchError::Closed)?;
        observed.await.map_err(|_| DispatchError::Closed)?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_run_executes_on_context() {
        let ctx = ContextDispatcher::spawn();
        let probe = Arc::clone(&ctx);
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        ctx.run(Box::new(move || {
            assert!(probe.is_on_context());
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .expect("job runs");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!ctx.is_on_context(), "test task is not the worker");
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_jobs_run_in_fifo_order() {
        let ctx = ContextDispatcher::spawn();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for n in 0..5 {
            let o = Arc::clone(&order);
            ctx.post(Box::new(move || o.lock().push(n)));
        }
        // run() enqueues behind the posts and acts as a barrier
        let o = Arc::clone(&order);
        ctx.run(Box::new(move || o.lock().push(99)))
            .await
            .expect("job runs");

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4, 99]);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_job_is_isolated() {
        let ctx = ContextDispatcher::spawn();

        let err = ctx
            .run(Box::new(|| panic!("job blew up")))
            .await
            .expect_err("panic surfaces as error");
        assert_eq!(err.as_label(), "dispatch_panicked");
        assert!(err.as_message().contains("job blew up"));

        // worker survived and keeps processing
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        ctx.run(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .expect("worker alive after panic");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_after_delays_then_marshals() {
        tokio::time::pause();
        let ctx = ContextDispatcher::spawn();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        ctx.run_after(
            Duration::from_secs(30),
            Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .expect("delayed job runs");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_the_context() {
        let ctx = ContextDispatcher::spawn();
        ctx.shutdown().await;
        ctx.shutdown().await; // idempotent

        let err = ctx
            .run(Box::new(|| {}))
            .await
            .expect_err("closed context rejects work");
        assert_eq!(err.as_label(), "dispatch_closed");

        // post on a closed context only logs; it must not panic
        ctx.post(Box::new(|| {}));
    }
}
