//! Per-process memory accounting and classification for multi-process
//! browser-style hosts.
//!
//! A host that splits itself into browser, renderer, GPU, plugin and
//! utility processes needs a consistent answer to "what is every process
//! doing and how much memory does it hold". This crate provides that
//! answer as a three-stage pipeline:
//!
//! 1. **Enumerate** (I/O context): snapshot the host's child-process
//!    registry into per-process records.
//! 2. **Sample** (blocking context): add the synthetic host record and
//!    OS-walked process-tree children, then measure working sets.
//! 3. **Classify** (UI context): match records against the renderer-host
//!    registry, refine renderer sub-roles, attribute page titles, flag
//!    diagnostic renderers, and drop foreign-profile leftovers.
//!
//! The completed set is reduced into a fixed histogram taxonomy and
//! handed to a consumer callback, exactly once per request.
//!
//! The host side is abstracted behind the traits in [`host`] and the
//! [`scheduler::Scheduler`] trait; standalone deployments can use the
//! bundled [`scheduler::ThreadScheduler`], the /proc-backed
//! [`smaps::ProcWorkingSetQuery`], and the Prometheus-backed
//! [`histogram::PrometheusSink`].

pub mod config;
pub mod details;
pub mod error;
pub mod histogram;
pub mod host;
mod pipeline;
pub mod record;
pub mod scheduler;
pub mod smaps;

// Re-export the main types for convenience
pub use config::Config;
pub use details::{DetailsConsumer, MemoryDetails};
pub use error::{ConfigError, FetchError};
pub use histogram::{update_histograms, HistogramSink, PrometheusSink};
pub use host::{
    ChildProcessInfo, ChildProcessRegistry, ExtensionProcessMap, HostInterfaces, LocalizedStrings,
    NavigationEntry, OsMemoryQuery, RendererHost, RendererRegistry, StringKey, Surface, ViewType,
    WebContents, ZygoteHost,
};
pub use record::{
    full_type_name, ProcessData, ProcessRecord, ProcessRole, RendererKind, WorkingSet,
};
pub use scheduler::{ExecutionContext, Scheduler, Task, ThreadScheduler};
pub use smaps::ProcWorkingSetQuery;
