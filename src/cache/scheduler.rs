use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::Error;

/// The execution context that delayed deletions are spawned on.
///
/// Every timer is tied to the scheduler's cancellation token, so
/// [`Scheduler::shutdown`] stops all of them at once.
#[derive(Clone, Debug)]
pub struct Scheduler {
    runtime: Handle,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Scheduler {
            runtime,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds a scheduler on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// * `Error::NoRuntime` if called outside a tokio runtime
    pub fn current() -> Result<Self, Error> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::new(runtime))
    }

    /// Runs `task` once `after` has elapsed, unless cancelled first.
    pub fn run_after<F>(&self, after: Duration, task: F) -> ExpiryHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.shutdown.child_token();
        let cancelled = token.clone();

        let join = self.runtime.spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => debug!("Scheduled task cancelled"),
                () = tokio::time::sleep(after) => task(),
            }
        });

        ExpiryHandle { token, join }
    }

    /// Cancels every pending timer, including ones scheduled later.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Handle on a single scheduled deletion. Dropping it leaves the timer running.
#[derive(Debug)]
pub struct ExpiryHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl ExpiryHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
