//! Dedicated worker pool for outgoing API requests.

use std::{future::Future, io, time::Duration};

use tokio::{
    runtime::{Builder, Handle, Runtime},
    task::JoinHandle,
};

/// How long an idle blocking worker is kept before it is reclaimed.
const IDLE_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Upper bound on blocking workers; the pool grows on demand up to it.
const MAX_BLOCKING_THREADS: usize = 512;

/// Owns the runtime a client's requests are dispatched on.
///
/// Request futures run on the runtime's fixed set of async workers, one per
/// core. Only blocking work grows a separate pool on demand, up to
/// [`MAX_BLOCKING_THREADS`], whose threads are reclaimed once idle. Dropping
/// the dispatcher shuts its runtime down in the background without waiting
/// for in-flight work, so it never holds up process exit.
pub struct Dispatcher {
    name: String,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Dispatcher {
    pub fn new(name: &str) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .thread_name(format!("{name}-dispatcher"))
            .max_blocking_threads(MAX_BLOCKING_THREADS)
            .thread_keep_alive(IDLE_KEEP_ALIVE)
            .enable_all()
            .build()?;
        debug!(message = "Started request dispatcher.", name);

        Ok(Self {
            name: name.to_owned(),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `f` with the dispatcher's runtime as the current runtime, so any
    /// tasks it spawns land on the dispatcher.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.handle.enter();
        f()
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Drives `future` to completion on the dispatcher. Must not be called
    /// from within an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!(message = "Shutting down request dispatcher.", name = %self.name);
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
