//! The three-context scheduler the pipeline hands work to.
//!
//! Hosts that embed the pipeline usually have their own named threads; the
//! [`Scheduler`] trait is the seam for plugging those in. The bundled
//! [`ThreadScheduler`] runs one dedicated worker thread per context and is
//! what standalone deployments and the test suite use.

use std::cell::Cell;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::debug;

/// The three logical execution contexts of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// Registry snapshots; must never run long or blocking work.
    Io,
    /// Tolerates blocking OS queries.
    Blocking,
    /// Renderer registry, navigation state, consumer delivery.
    Ui,
}

impl ExecutionContext {
    fn thread_name(self) -> &'static str {
        match self {
            ExecutionContext::Io => "memory-details-io",
            ExecutionContext::Blocking => "memory-details-blocking",
            ExecutionContext::Ui => "memory-details-ui",
        }
    }
}

/// A unit of work posted to a context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Posts tasks to named execution contexts, FIFO per context.
pub trait Scheduler: Send + Sync {
    fn post(&self, context: ExecutionContext, task: Task);

    /// The context the calling thread belongs to, or `None` for threads
    /// the scheduler does not own.
    fn current_context(&self) -> Option<ExecutionContext>;
}

thread_local! {
    static CURRENT_CONTEXT: Cell<Option<ExecutionContext>> = Cell::new(None);
}

struct Worker {
    tx: Option<mpsc::UnboundedSender<Task>>,
    handle: Option<JoinHandle<()>>,
}

/// Bundled scheduler: one named worker thread per context, each draining
/// its own unbounded channel. Dropping the scheduler closes the channels
/// and joins the workers after they finish queued tasks.
pub struct ThreadScheduler {
    // Indexed by ExecutionContext discriminant.
    workers: [Worker; 3],
}

impl ThreadScheduler {
    pub fn new() -> Self {
        let workers = [
            ExecutionContext::Io,
            ExecutionContext::Blocking,
            ExecutionContext::Ui,
        ]
        .map(Self::spawn_worker);
        Self { workers }
    }

    fn spawn_worker(context: ExecutionContext) -> Worker {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let handle = thread::Builder::new()
            .name(context.thread_name().to_string())
            .spawn(move || {
                CURRENT_CONTEXT.with(|current| current.set(Some(context)));
                while let Some(task) = rx.blocking_recv() {
                    task();
                }
            })
            .expect("failed to spawn scheduler worker thread");
        Worker {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    fn worker(&self, context: ExecutionContext) -> &Worker {
        &self.workers[context as usize]
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn post(&self, context: ExecutionContext, task: Task) {
        if let Some(tx) = &self.worker(context).tx {
            if tx.send(task).is_err() {
                debug!(?context, "scheduler worker is gone; dropping task");
            }
        }
    }

    fn current_context(&self) -> Option<ExecutionContext> {
        CURRENT_CONTEXT.with(|current| current.get())
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        // Close all channels first so cross-posting tasks cannot keep the
        // workers alive, then join.
        for worker in &mut self.workers {
            worker.tx.take();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
