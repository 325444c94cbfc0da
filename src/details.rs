//! Request orchestration across the three execution contexts.
//!
//! About threading: a fetch touches all three contexts. The child-process
//! registry is only readable from the I/O context and the renderer
//! registry only from UI, while the OS working-set queries may block for
//! tens of milliseconds and must stay off both. A request therefore hops
//! I/O -> Blocking -> UI, handing the record set forward by move at every
//! boundary, and delivers the consumer callback on UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace};

use crate::config::Config;
use crate::error::FetchError;
use crate::histogram::{update_histograms, HistogramSink};
use crate::host::HostInterfaces;
use crate::pipeline::{classify, enumerate, sample};
use crate::record::{ProcessData, ProcessRecord};
use crate::scheduler::{ExecutionContext, Scheduler};

/// Receives the completed record set, once, on the UI context.
pub type DetailsConsumer = Box<dyn FnOnce(ProcessData) + Send + 'static>;

/// One memory-details request. Construct, call [`fetch`](Self::fetch)
/// once, keep the instance alive until the consumer has run. Dropping the
/// instance between stages cancels the request: pending continuations
/// notice and exit without invoking the consumer.
pub struct MemoryDetails {
    inner: Arc<Inner>,
}

struct Inner {
    scheduler: Arc<dyn Scheduler>,
    host: HostInterfaces,
    sink: Arc<dyn HistogramSink>,
    config: Config,
    started: AtomicBool,
    consumer: Mutex<Option<DetailsConsumer>>,
}

impl MemoryDetails {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        host: HostInterfaces,
        sink: Arc<dyn HistogramSink>,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                scheduler,
                host,
                sink,
                config,
                started: AtomicBool::new(false),
                consumer: Mutex::new(None),
            }),
        }
    }

    /// Starts the collection pipeline. May be called from any context
    /// except I/O: the enumeration task itself needs that context, and
    /// queueing behind the caller would be a programming error there.
    pub fn fetch(&self, consumer: DetailsConsumer) -> Result<(), FetchError> {
        if self.inner.scheduler.current_context() == Some(ExecutionContext::Io) {
            return Err(FetchError::CalledOnIoContext);
        }
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(FetchError::FetchInFlight);
        }

        *self.inner.consumer.lock().expect("consumer slot poisoned") = Some(consumer);

        // Stage continuations hold only a weak reference to the request,
        // so dropping this instance cancels at the next boundary.
        let request = Arc::downgrade(&self.inner);
        self.inner.scheduler.post(
            ExecutionContext::Io,
            Box::new(move || Inner::collect_child_info(request)),
        );
        Ok(())
    }
}

impl Inner {
    /// Stage one: snapshot the child-process registry on I/O.
    fn collect_child_info(request: Weak<Inner>) {
        let Some(inner) = request.upgrade() else {
            trace!("request dropped before enumeration");
            return;
        };
        let records = enumerate::collect_child_info(inner.host.child_processes.as_ref());
        inner.scheduler.post(
            ExecutionContext::Blocking,
            Box::new(move || Inner::collect_process_data(request, records)),
        );
    }

    /// Stage two: expensive OS lookups on the blocking context.
    fn collect_process_data(request: Weak<Inner>, mut records: Vec<ProcessRecord>) {
        let Some(inner) = request.upgrade() else {
            trace!("request dropped before sampling");
            return;
        };
        sample::collect_process_data(
            &mut records,
            inner.host.host_pid,
            &inner.config.display_name,
            inner.host.memory.as_ref(),
        );
        inner.scheduler.post(
            ExecutionContext::Ui,
            Box::new(move || Inner::classify_and_deliver(request, records)),
        );
    }

    /// Stage three: renderer classification, emission and delivery on UI.
    fn classify_and_deliver(request: Weak<Inner>, mut records: Vec<ProcessRecord>) {
        let Some(inner) = request.upgrade() else {
            trace!("request dropped before classification");
            return;
        };
        classify::classify_renderers(&mut records, &inner.host, &inner.config);

        let data = ProcessData {
            name: inner.config.display_name.clone(),
            process_name: inner.config.process_name.clone(),
            processes: records,
        };

        let backing_store_kb = inner.host.renderers.backing_store_bytes() / 1024;
        update_histograms(&data, backing_store_kb, inner.sink.as_ref());

        debug!(processes = data.processes.len(), "memory details complete");
        if let Some(consumer) = inner.consumer.lock().expect("consumer slot poisoned").take() {
            consumer(data);
        };
    }
}
