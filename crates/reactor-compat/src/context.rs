//! Execution-context adapter over the tokio runtime.
//!
//! Restores the legacy execution-context surface on top of a modern
//! runtime: `post`, `run`, `stop`, `restart` (with its old `reset`
//! name), a [`Strand`] serialization domain, and a [`Work`] keep-alive
//! token.
//! The runtime keeps its own scheduling semantics; this module only adds
//! the bookkeeping the legacy shape requires: an outstanding-work count
//! that [`IoContext::run`] blocks on, and a stop flag that defers posted
//! handlers until the context is restarted.
//!
//! # Example
//!
//! ```no_run
//! use reactor_compat::{IoContext, Work};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = IoContext::new()?;
//!
//!     context.post(|| {
//!         println!("ran on the context");
//!     });
//!
//!     // Blocks until the posted handler has finished.
//!     context.run();
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{CompatError, Result};

/// A posted unit of work.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for an owned execution context.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Number of worker threads. `None` means the number of CPU cores.
    pub worker_threads: Option<usize>,
    /// Name prefix for runtime threads.
    pub thread_name: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "reactor-compat".to_string(),
        }
    }
}

impl ContextConfig {
    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Set the thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// Shared state behind an [`IoContext`] and its clones.
struct ContextInner {
    /// Owned runtime; absent when attached to an ambient runtime.
    /// Kept alive to prevent the runtime from shutting down.
    #[allow(dead_code)]
    runtime: Option<Runtime>,
    /// Handle used to schedule handlers.
    handle: Handle,
    /// Stop flag; while set, posted handlers are deferred.
    stopped: AtomicBool,
    /// In-flight posted handlers plus live [`Work`] guards.
    outstanding: AtomicU64,
    /// Handlers deferred while the context was stopped.
    deferred: Mutex<VecDeque<Job>>,
    /// Signalled when outstanding work drains or the context stops.
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl ContextInner {
    /// Retire one unit of outstanding work, waking `run()` callers when
    /// the count reaches zero.
    fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.idle_lock.lock();
            self.idle.notify_all();
        }
    }
}

/// Retires one outstanding-work unit on drop, so a panicking handler
/// still releases its unit during unwind.
struct Retire {
    inner: Arc<ContextInner>,
}

impl Drop for Retire {
    fn drop(&mut self) {
        self.inner.finish_one();
    }
}

/// The execution-context type: schedules handlers on a tokio runtime
/// while exposing the legacy `post`/`run`/`stop`/`reset` surface.
///
/// Cloning an `IoContext` produces another handle to the same context;
/// all clones share the stop flag and work accounting.
#[derive(Clone)]
pub struct IoContext {
    inner: Arc<ContextInner>,
}

impl IoContext {
    /// Create a context that owns a multi-threaded runtime with default
    /// settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ContextConfig::default())
    }

    /// Create a context that owns a multi-threaded runtime.
    ///
    /// The runtime shuts down when the last clone of the context is
    /// dropped. Do not drop the final clone from inside an async task;
    /// runtimes cannot be torn down from their own threads.
    pub fn with_config(config: ContextConfig) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(&config.thread_name);

        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }

        builder.enable_io();
        builder.enable_time();

        let runtime = builder
            .build()
            .map_err(|e| CompatError::RuntimeCreation(e.to_string()))?;
        let handle = runtime.handle().clone();

        Ok(Self::from_parts(Some(runtime), handle))
    }

    /// Attach to the runtime of the calling async context.
    ///
    /// Fails when called outside a running runtime. The returned context
    /// does not keep that runtime alive.
    pub fn current() -> Result<Self> {
        let handle =
            Handle::try_current().map_err(|e| CompatError::RuntimeCreation(e.to_string()))?;
        Ok(Self::from_parts(None, handle))
    }

    fn from_parts(runtime: Option<Runtime>, handle: Handle) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                runtime,
                handle,
                stopped: AtomicBool::new(false),
                outstanding: AtomicU64::new(0),
                deferred: Mutex::new(VecDeque::new()),
                idle_lock: Mutex::new(()),
                idle: Condvar::new(),
            }),
        }
    }

    /// Get a handle to the underlying runtime.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Schedule a handler for execution without blocking the caller.
    ///
    /// While the context is stopped the handler is deferred and runs
    /// after the next [`restart`](Self::restart).
    pub fn post<F>(&self, handler: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.stopped.load(Ordering::Acquire) {
            self.inner.deferred.lock().push_back(Box::new(handler));
            return;
        }
        self.spawn_job(Box::new(handler));
    }

    fn spawn_job(&self, job: Job) {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        let retire = Retire {
            inner: Arc::clone(&self.inner),
        };
        self.inner.handle.spawn(async move {
            let _retire = retire;
            job();
        });
    }

    /// Stop the context: `run()` returns promptly and subsequently
    /// posted handlers are deferred. Handlers already handed to the
    /// runtime still complete.
    pub fn stop(&self) {
        tracing::debug!(target: "reactor_compat::context", "context stopped");
        self.inner.stopped.store(true, Ordering::Release);
        let _guard = self.inner.idle_lock.lock();
        self.inner.idle.notify_all();
    }

    /// Whether the context has been stopped.
    pub fn stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Re-enable a stopped context and release any handlers deferred
    /// while it was stopped.
    pub fn restart(&self) {
        tracing::debug!(target: "reactor_compat::context", "context restarted");
        self.inner.stopped.store(false, Ordering::Release);
        let released: Vec<Job> = {
            let mut deferred = self.inner.deferred.lock();
            deferred.drain(..).collect()
        };
        for job in released {
            self.spawn_job(job);
        }
    }

    /// Legacy name for [`restart`](Self::restart).
    pub fn reset(&self) {
        self.restart();
    }

    /// Block the calling thread until the context is stopped or has no
    /// outstanding work (no in-flight handlers and no live [`Work`]
    /// guards).
    pub fn run(&self) {
        let mut guard = self.inner.idle_lock.lock();
        while !self.inner.stopped.load(Ordering::Acquire)
            && self.inner.outstanding.load(Ordering::Acquire) > 0
        {
            self.inner.idle.wait(&mut guard);
        }
    }

    /// Current outstanding-work count: in-flight handlers plus live
    /// [`Work`] guards.
    pub fn outstanding_work(&self) -> u64 {
        self.inner.outstanding.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for IoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoContext")
            .field("stopped", &self.stopped())
            .field("outstanding_work", &self.outstanding_work())
            .finish()
    }
}

/// A keep-alive token preventing [`IoContext::run`] from returning for
/// lack of work while the token is held. Released on drop.
pub struct Work {
    inner: Arc<ContextInner>,
}

impl Work {
    /// Register a unit of outstanding work with the context.
    pub fn new(context: &IoContext) -> Self {
        context.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        Self {
            inner: Arc::clone(&context.inner),
        }
    }
}

impl Clone for Work {
    fn clone(&self) -> Self {
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for Work {
    fn drop(&mut self) {
        self.inner.finish_one();
    }
}

/// Per-strand queue state. The running flag is mutated only under the
/// same lock as the queue, which keeps hand-off to a new drain atomic.
struct StrandState {
    queue: VecDeque<Job>,
    running: bool,
}

struct StrandInner {
    context: IoContext,
    state: Mutex<StrandState>,
}

impl StrandInner {
    /// Runs queued handlers one at a time until the queue empties.
    fn drain(inner: &Arc<StrandInner>) {
        loop {
            let job = {
                let mut state = inner.state.lock();
                match state.queue.pop_front() {
                    Some(job) => job,
                    None => {
                        state.running = false;
                        return;
                    }
                }
            };
            let mut resume = ResumeDrain {
                inner,
                armed: true,
            };
            job();
            resume.armed = false;
        }
    }
}

/// Keeps a strand drainable when a handler unwinds: if the drain task
/// dies mid-job, either clears the running flag or hands the remaining
/// queue to a fresh drain.
struct ResumeDrain<'a> {
    inner: &'a Arc<StrandInner>,
    armed: bool,
}

impl Drop for ResumeDrain<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        if state.queue.is_empty() {
            state.running = false;
        } else {
            let inner = Arc::clone(self.inner);
            self.inner.context.post(move || StrandInner::drain(&inner));
        }
    }
}

/// A serialization domain bound to an [`IoContext`].
///
/// Handlers submitted through the same strand never execute concurrently
/// with one another and run in submission order, even when the context's
/// runtime uses multiple threads. Handlers on different strands (or
/// posted directly to the context) are not serialized against these.
#[derive(Clone)]
pub struct Strand {
    inner: Arc<StrandInner>,
}

impl Strand {
    /// Create a strand bound to the given context.
    pub fn new(context: &IoContext) -> Self {
        Self {
            inner: Arc::new(StrandInner {
                context: context.clone(),
                state: Mutex::new(StrandState {
                    queue: VecDeque::new(),
                    running: false,
                }),
            }),
        }
    }

    /// Submit a handler through the strand.
    pub fn post<F>(&self, handler: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let start_drain = {
            let mut state = self.inner.state.lock();
            state.queue.push_back(Box::new(handler));
            if state.running {
                false
            } else {
                state.running = true;
                true
            }
        };

        if start_drain {
            let inner = Arc::clone(&self.inner);
            self.inner.context.post(move || StrandInner::drain(&inner));
        }
    }

    /// Submit a handler through the strand. Equivalent to
    /// [`post`](Self::post); the serialization guarantee is identical.
    pub fn dispatch<F>(&self, handler: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(handler);
    }

    /// Wrap a handler so that invoking the wrapper submits the handler
    /// through this strand.
    pub fn wrap<F>(&self, handler: F) -> impl FnOnce() + Send + 'static
    where
        F: FnOnce() + Send + 'static,
    {
        let strand = self.clone();
        move || strand.post(handler)
    }
}

impl std::fmt::Debug for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Strand")
            .field("queued", &state.queue.len())
            .field("running", &state.running)
            .finish()
    }
}
