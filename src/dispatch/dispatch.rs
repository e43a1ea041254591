//! # Dispatcher contract.
//!
//! A [`Dispatch`] implementation represents one execution context — a UI
//! loop, a dedicated worker, an actor — onto which closures can be
//! marshalled from any thread.
//!
//! ## Rules
//! - [`post`](Dispatch::post) never blocks and never reports back; it is the
//!   fire-and-forget path proxies use during publish fan-out.
//! - [`run`](Dispatch::run) resolves once the job has actually run, faulting
//!   with [`DispatchError::Panicked`] when the job panicked. When the caller
//!   is already on the target context the job runs inline.
//! - [`run_after`](Dispatch::run_after) waits out a delay first, then
//!   marshals like `run`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DispatchError;

/// A unit of work marshalled onto an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// One execution context accepting marshalled jobs.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Returns `true` when the caller is already executing on this context.
    fn is_on_context(&self) -> bool;

    /// Enqueues `job` without waiting for it to run.
    ///
    /// A closed context drops the job silently (logged, not surfaced).
    fn post(&self, job: Job);

    /// Runs `job` on the context and resolves once it finished.
    ///
    /// Runs inline when the caller is already on the context, otherwise
    /// enqueues and awaits completion.
    async fn run(&self, job: Job) -> Result<(), DispatchError>;

    /// Waits out `delay`, then runs `job` on the context like
    /// [`run`](Dispatch::run).
    async fn run_after(&self, delay: Duration, job: Job) -> Result<(), DispatchError> {
        tokio::time::sleep(delay).await;
        self.run(job).await
    }
}
