//! Histogram taxonomy and sinks.
//!
//! The emitter reduces a completed record set into a closed family of
//! memory-size and process-count histograms. Samples for a single request
//! are emitted as one contiguous batch. The [`HistogramSink`] trait is
//! the seam for host telemetry systems; [`PrometheusSink`] is the bundled
//! implementation.

use once_cell::sync::Lazy;
use prometheus::{exponential_buckets, linear_buckets, HistogramOpts, HistogramVec, Registry};
use tracing::error;

use crate::record::{ProcessData, ProcessRole, RendererKind};

/// Upper bound of the process-count histograms.
pub const COUNT_HISTOGRAM_MAX: u64 = 100;

/// Receives histogram samples from the emitter.
pub trait HistogramSink: Send + Sync {
    /// Records one kilobyte-domain memory sample.
    fn record_kb(&self, name: &str, sample_kb: u64);
    /// Records one megabyte-domain memory sample.
    fn record_mb(&self, name: &str, sample_mb: u64);
    /// Records a process count. The count domain is capped at
    /// [`COUNT_HISTOGRAM_MAX`] by implementations.
    fn record_count(&self, name: &str, count: u64);
}

/// Reduces the filtered record set into the fixed histogram taxonomy.
///
/// Every record contributes one size-bucket sample tagged by role (and by
/// renderer sub-role when the role is Renderer). A renderer record still
/// carrying an unknown sub-role is a contract violation: it is logged and
/// not sampled, but does not abort the batch. "Memory.Total" uses decimal
/// kilobyte-to-megabyte division, preserving the historical unit
/// convention.
pub fn update_histograms(data: &ProcessData, backing_store_kb: u64, sink: &dyn HistogramSink) {
    let mut aggregate_memory_kb: u64 = 0;
    let mut chrome_count: u64 = 0;
    let mut extension_count: u64 = 0;
    let mut plugin_count: u64 = 0;
    let mut pepper_plugin_count: u64 = 0;
    let mut renderer_count: u64 = 0;
    let mut worker_count: u64 = 0;
    let mut other_count: u64 = 0;

    for process in &data.processes {
        let sample = process.working_set.private_kb;
        aggregate_memory_kb += sample;
        match process.role {
            ProcessRole::Browser => sink.record_kb("Memory.Browser", sample),
            ProcessRole::Renderer => match process.renderer_kind {
                RendererKind::Extension => {
                    sink.record_kb("Memory.Extension", sample);
                    extension_count += 1;
                }
                RendererKind::Chrome => {
                    sink.record_kb("Memory.Chrome", sample);
                    chrome_count += 1;
                }
                RendererKind::Unknown => {
                    error!(
                        pid = process.pid,
                        "renderer record reached emission without a sub-role"
                    );
                }
                RendererKind::Normal
                | RendererKind::Devtools
                | RendererKind::Interstitial
                | RendererKind::Notification
                | RendererKind::BackgroundApp => {
                    sink.record_kb("Memory.Renderer", sample);
                    renderer_count += 1;
                }
            },
            ProcessRole::Plugin => {
                sink.record_kb("Memory.Plugin", sample);
                plugin_count += 1;
            }
            ProcessRole::Worker => {
                sink.record_kb("Memory.Worker", sample);
                worker_count += 1;
            }
            ProcessRole::Utility => {
                sink.record_kb("Memory.Utility", sample);
                other_count += 1;
            }
            ProcessRole::Zygote => {
                sink.record_kb("Memory.Zygote", sample);
                other_count += 1;
            }
            ProcessRole::SandboxHelper => {
                sink.record_kb("Memory.SandboxHelper", sample);
                other_count += 1;
            }
            ProcessRole::NativeClientLoader => {
                sink.record_kb("Memory.NativeClient", sample);
                other_count += 1;
            }
            ProcessRole::NativeClientBroker => {
                sink.record_kb("Memory.NativeClientBroker", sample);
                other_count += 1;
            }
            ProcessRole::Gpu => {
                sink.record_kb("Memory.Gpu", sample);
                other_count += 1;
            }
            ProcessRole::PepperPlugin => {
                sink.record_kb("Memory.PepperPlugin", sample);
                pepper_plugin_count += 1;
            }
            ProcessRole::Unknown => {
                // The classifier filters these; reaching here means a
                // caller bypassed it.
                error!(pid = process.pid, "unclassified record reached emission");
            }
        }
    }

    sink.record_kb("Memory.BackingStore", backing_store_kb);

    sink.record_count("Memory.ProcessCount", data.processes.len() as u64);
    sink.record_count("Memory.ChromeProcessCount", chrome_count);
    sink.record_count("Memory.ExtensionProcessCount", extension_count);
    sink.record_count("Memory.OtherProcessCount", other_count);
    sink.record_count("Memory.PluginProcessCount", plugin_count);
    sink.record_count("Memory.PepperPluginProcessCount", pepper_plugin_count);
    sink.record_count("Memory.RendererProcessCount", renderer_count);
    sink.record_count("Memory.WorkerProcessCount", worker_count);

    sink.record_mb("Memory.Total", aggregate_memory_kb / 1000);
}

// Static bucket layouts shared by every sink instance.
static KB_BUCKETS: Lazy<Vec<f64>> =
    Lazy::new(|| exponential_buckets(1024.0, 2.0, 12).expect("static kb bucket layout"));
static MB_BUCKETS: Lazy<Vec<f64>> =
    Lazy::new(|| exponential_buckets(1.0, 2.0, 14).expect("static mb bucket layout"));
static COUNT_BUCKETS: Lazy<Vec<f64>> =
    Lazy::new(|| linear_buckets(0.0, 10.0, 11).expect("static count bucket layout"));

/// Histogram sink backed by a Prometheus registry. The taxonomy name
/// travels as the `metric` label of three histogram families.
#[derive(Clone)]
pub struct PrometheusSink {
    kb: HistogramVec,
    mb: HistogramVec,
    counts: HistogramVec,
}

impl PrometheusSink {
    /// Creates the three histogram families and registers them.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let kb = HistogramVec::new(
            HistogramOpts::new(
                "memory_details_sample_kb",
                "Per-process memory samples in kilobytes",
            )
            .buckets(KB_BUCKETS.clone()),
            &["metric"],
        )?;
        let mb = HistogramVec::new(
            HistogramOpts::new(
                "memory_details_sample_mb",
                "Aggregate memory samples in megabytes",
            )
            .buckets(MB_BUCKETS.clone()),
            &["metric"],
        )?;
        let counts = HistogramVec::new(
            HistogramOpts::new(
                "memory_details_process_count",
                "Process counts per classification",
            )
            .buckets(COUNT_BUCKETS.clone()),
            &["metric"],
        )?;

        registry.register(Box::new(kb.clone()))?;
        registry.register(Box::new(mb.clone()))?;
        registry.register(Box::new(counts.clone()))?;

        Ok(Self { kb, mb, counts })
    }
}

impl HistogramSink for PrometheusSink {
    fn record_kb(&self, name: &str, sample_kb: u64) {
        self.kb.with_label_values(&[name]).observe(sample_kb as f64);
    }

    fn record_mb(&self, name: &str, sample_mb: u64) {
        self.mb.with_label_values(&[name]).observe(sample_mb as f64);
    }

    fn record_count(&self, name: &str, count: u64) {
        self.counts
            .with_label_values(&[name])
            .observe(count.min(COUNT_HISTOGRAM_MAX) as f64);
    }
}
