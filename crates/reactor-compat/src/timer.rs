//! Steady timer adapter.
//!
//! The underlying runtime's timers expose only "sleep until"; the legacy
//! surface additionally wants to ask a timer how much time remains, as a
//! signed duration. [`SteadyTimer`] keeps its own expiry bookkeeping and
//! recomputes the remainder as expiry minus now, in the representation
//! selected by the [`clock`](crate::clock) module.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use reactor_compat::{IoContext, SteadyTimer, is_neg};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = IoContext::new()?;
//!     let timer = SteadyTimer::new(&context);
//!
//!     timer.expires_after(Duration::from_millis(50));
//!     assert!(!is_neg(timer.expires_from_now()));
//!
//!     timer.async_wait(|result| {
//!         if result.is_ok() {
//!             println!("timer fired");
//!         }
//!     });
//!
//!     context.run();
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::clock::{self, TimerDuration};
use crate::context::{IoContext, Work};
use crate::error::{CompatError, Result};

/// State shared between a timer and its in-flight waits.
struct TimerShared {
    /// Absolute expiry.
    deadline: Mutex<Instant>,
    /// Bumped on cancel and reschedule; a wait that observes a bump
    /// completes with [`CompatError::Aborted`].
    generation: AtomicU64,
    /// Wakes in-flight waits after a generation bump.
    interrupted: Notify,
}

/// A duration-capable alarm bound to an [`IoContext`].
///
/// Rescheduling or cancelling aborts outstanding waits; their handlers
/// complete exactly once with [`CompatError::Aborted`]. As with any
/// timer, a cancel that races an already-elapsed wait can lose: the wait
/// may still complete successfully.
pub struct SteadyTimer {
    context: IoContext,
    shared: Arc<TimerShared>,
}

impl SteadyTimer {
    /// Create a timer whose expiry is initially "now".
    pub fn new(context: &IoContext) -> Self {
        Self {
            context: context.clone(),
            shared: Arc::new(TimerShared {
                deadline: Mutex::new(Instant::now()),
                generation: AtomicU64::new(0),
                interrupted: Notify::new(),
            }),
        }
    }

    /// Set the expiry relative to now, aborting outstanding waits.
    pub fn expires_after(&self, timeout: Duration) {
        self.reschedule(Instant::now() + timeout);
    }

    /// Set an absolute expiry, aborting outstanding waits.
    pub fn expires_at(&self, deadline: Instant) {
        self.reschedule(deadline);
    }

    fn reschedule(&self, deadline: Instant) {
        tracing::trace!(target: "reactor_compat::timer", ?deadline, "timer rescheduled");
        *self.shared.deadline.lock() = deadline;
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.interrupted.notify_waiters();
    }

    /// Time remaining until expiry, negative once the deadline has
    /// passed. Computed as expiry minus now in the active duration
    /// representation.
    pub fn expires_from_now(&self) -> TimerDuration {
        let deadline = *self.shared.deadline.lock();
        let now = Instant::now();
        if deadline >= now {
            clock::from_std_signed(true, deadline - now)
        } else {
            clock::from_std_signed(false, now - deadline)
        }
    }

    /// Abort outstanding waits; their handlers complete with
    /// [`CompatError::Aborted`]. The expiry is left unchanged.
    pub fn cancel(&self) {
        tracing::trace!(target: "reactor_compat::timer", "timer cancelled");
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.interrupted.notify_waiters();
    }

    /// Wait for the current expiry.
    ///
    /// Resolves to `Ok(())` when the timer fires, or
    /// [`CompatError::Aborted`] if the timer is cancelled or
    /// rescheduled first. The wait is registered when this method is
    /// called, not when the returned future is first polled; a cancel
    /// in between still aborts it.
    pub fn wait(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let generation = self.shared.generation.load(Ordering::Acquire);
        let shared = Arc::clone(&self.shared);
        async move { Self::wait_shared(shared, generation).await }
    }

    /// Schedule a completion handler for the current expiry without
    /// blocking the caller. The handler runs exactly once, on a runtime
    /// thread, and counts as outstanding work for
    /// [`IoContext::run`](crate::IoContext::run).
    pub fn async_wait<H>(&self, handler: H)
    where
        H: FnOnce(Result<()>) + Send + 'static,
    {
        let work = Work::new(&self.context);
        let shared = Arc::clone(&self.shared);
        // Capture the generation now, not when the task first polls, so
        // a cancel between scheduling and polling still aborts the wait.
        let generation = self.shared.generation.load(Ordering::Acquire);
        self.context.handle().spawn(async move {
            let result = SteadyTimer::wait_shared(shared, generation).await;
            handler(result);
            drop(work);
        });
    }

    async fn wait_shared(shared: Arc<TimerShared>, generation: u64) -> Result<()> {
        let deadline = *shared.deadline.lock();
        let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline));
        tokio::pin!(sleep);

        loop {
            let notified = shared.interrupted.notified();
            // A bump between registering above and the generation load
            // in the select arm is caught here.
            if shared.generation.load(Ordering::Acquire) != generation {
                return Err(CompatError::Aborted);
            }
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                _ = notified => {
                    if shared.generation.load(Ordering::Acquire) != generation {
                        return Err(CompatError::Aborted);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SteadyTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteadyTimer")
            .field("deadline", &*self.shared.deadline.lock())
            .finish()
    }
}
