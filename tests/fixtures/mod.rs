//! Shared fakes for the pipeline integration tests: static registries,
//! scripted renderer hosts and a recording histogram sink.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use url::Url;

use memory_details::host::{
    ChildProcessInfo, ChildProcessRegistry, EnglishStrings, ExtensionProcessMap, HostInterfaces,
    NavigationEntry, OsMemoryQuery, RendererHost, RendererRegistry, Surface, ViewType, WebContents,
    ZygoteHost,
};
use memory_details::{
    HistogramSink, MemoryDetails, ProcessData, ProcessRole, WorkingSet,
};

/// Installs a test-writer subscriber once per test binary so stage logs
/// land in the captured test output.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn private_kb(kb: u64) -> WorkingSet {
    WorkingSet {
        private_kb: kb,
        ..WorkingSet::default()
    }
}

// -----------------------------------------------------------------------------
// I/O-side fakes
// -----------------------------------------------------------------------------

pub struct StaticChildRegistry(pub Vec<ChildProcessInfo>);

impl ChildProcessRegistry for StaticChildRegistry {
    fn child_processes(&self) -> Vec<ChildProcessInfo> {
        self.0.clone()
    }
}

/// Scripted OS queries: `children` feeds the process-tree walk in
/// insertion order, `sets` the working-set answers.
#[derive(Default)]
pub struct StaticMemoryQuery {
    pub children: Vec<u32>,
    pub sets: Vec<(u32, WorkingSet)>,
}

impl OsMemoryQuery for StaticMemoryQuery {
    fn child_pids(&self, _host_pid: u32) -> Vec<u32> {
        self.children.clone()
    }

    fn working_set(&self, pid: u32) -> Option<WorkingSet> {
        self.sets.iter().find(|(p, _)| *p == pid).map(|(_, ws)| *ws)
    }
}

// -----------------------------------------------------------------------------
// UI-side fakes
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeExtensionMap {
    pub processes: AHashMap<u32, Vec<String>>,
    pub hosted_apps: AHashSet<String>,
    pub names: AHashMap<String, String>,
}

impl ExtensionProcessMap for FakeExtensionMap {
    fn contains(&self, pid: u32) -> bool {
        self.processes.contains_key(&pid)
    }

    fn extensions_in(&self, pid: u32) -> Vec<String> {
        self.processes.get(&pid).cloned().unwrap_or_default()
    }

    fn is_hosted_app(&self, id: &str) -> bool {
        self.hosted_apps.contains(id)
    }

    fn display_name(&self, id: &str) -> Option<String> {
        self.names.get(id).cloned()
    }
}

pub struct FakeWebContents {
    pub title: String,
    pub pending: Option<String>,
    pub committed: Option<String>,
}

impl WebContents for FakeWebContents {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn pending_entry(&self) -> Option<NavigationEntry> {
        self.pending.clone().map(|virtual_url| NavigationEntry { virtual_url })
    }

    fn last_committed_entry(&self) -> Option<NavigationEntry> {
        self.committed.clone().map(|virtual_url| NavigationEntry { virtual_url })
    }
}

pub struct FakeSurface {
    pub view_type: ViewType,
    pub host_bindings: bool,
    pub url: Url,
    pub contents: Option<Arc<dyn WebContents>>,
    pub is_view: bool,
}

impl FakeSurface {
    /// A plain tab: web contents with a title, no bindings.
    pub fn tab(title: &str, url: &str) -> Self {
        Self {
            view_type: ViewType::TabContents,
            host_bindings: false,
            url: Url::parse(url).expect("test url"),
            contents: Some(Arc::new(FakeWebContents {
                title: title.to_string(),
                pending: None,
                committed: None,
            })),
            is_view: true,
        }
    }

    /// A surface without web contents (background page, widget).
    pub fn widget(view_type: ViewType, url: &str) -> Self {
        Self {
            view_type,
            host_bindings: false,
            url: Url::parse(url).expect("test url"),
            contents: None,
            is_view: true,
        }
    }
}

impl Surface for FakeSurface {
    fn is_view(&self) -> bool {
        self.is_view
    }

    fn view_type(&self) -> ViewType {
        self.view_type
    }

    fn has_host_bindings(&self) -> bool {
        self.host_bindings
    }

    fn url(&self) -> Url {
        self.url.clone()
    }

    fn web_contents(&self) -> Option<Arc<dyn WebContents>> {
        self.contents.clone()
    }
}

pub struct FakeRendererHost {
    pub pid: u32,
    pub connected: bool,
    pub surfaces: Vec<Arc<dyn Surface>>,
    pub extensions: Arc<dyn ExtensionProcessMap>,
}

impl FakeRendererHost {
    pub fn new(pid: u32, surfaces: Vec<Arc<dyn Surface>>) -> Self {
        Self {
            pid,
            connected: true,
            surfaces,
            extensions: Arc::new(FakeExtensionMap::default()),
        }
    }
}

impl RendererHost for FakeRendererHost {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn has_connection(&self) -> bool {
        self.connected
    }

    fn surfaces(&self) -> Vec<Arc<dyn Surface>> {
        self.surfaces.clone()
    }

    fn extension_map(&self) -> Arc<dyn ExtensionProcessMap> {
        Arc::clone(&self.extensions)
    }
}

#[derive(Default)]
pub struct StaticRendererRegistry {
    pub hosts: Vec<Arc<dyn RendererHost>>,
    pub backing_store_bytes: u64,
}

impl RendererRegistry for StaticRendererRegistry {
    fn renderer_hosts(&self) -> Vec<Arc<dyn RendererHost>> {
        self.hosts.clone()
    }

    fn backing_store_bytes(&self) -> u64 {
        self.backing_store_bytes
    }
}

#[derive(Default)]
pub struct StaticZygote {
    pub zygote: Option<u32>,
    pub sandbox_helper: Option<u32>,
}

impl ZygoteHost for StaticZygote {
    fn zygote_pid(&self) -> Option<u32> {
        self.zygote
    }

    fn sandbox_helper_pid(&self) -> Option<u32> {
        self.sandbox_helper
    }
}

// -----------------------------------------------------------------------------
// Histogram sink
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    pub kb: Mutex<Vec<(String, u64)>>,
    pub mb: Mutex<Vec<(String, u64)>>,
    pub counts: Mutex<Vec<(String, u64)>>,
}

impl HistogramSink for RecordingSink {
    fn record_kb(&self, name: &str, sample_kb: u64) {
        self.kb.lock().unwrap().push((name.to_string(), sample_kb));
    }

    fn record_mb(&self, name: &str, sample_mb: u64) {
        self.mb.lock().unwrap().push((name.to_string(), sample_mb));
    }

    fn record_count(&self, name: &str, count: u64) {
        self.counts.lock().unwrap().push((name.to_string(), count));
    }
}

impl RecordingSink {
    pub fn kb_samples(&self, name: &str) -> Vec<u64> {
        self.kb
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn mb_samples(&self, name: &str) -> Vec<u64> {
        self.mb
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn count_of(&self, name: &str) -> Option<u64> {
        self.counts
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

// -----------------------------------------------------------------------------
// Host assembly
// -----------------------------------------------------------------------------

/// Builds a `HostInterfaces` from scripted parts, defaulting everything
/// to empty.
pub struct HostBuilder {
    host_pid: u32,
    children: Vec<ChildProcessInfo>,
    memory: StaticMemoryQuery,
    renderers: StaticRendererRegistry,
    zygote: StaticZygote,
}

impl HostBuilder {
    pub fn new() -> Self {
        init_tracing();
        Self {
            host_pid: 0,
            children: Vec::new(),
            memory: StaticMemoryQuery::default(),
            renderers: StaticRendererRegistry::default(),
            zygote: StaticZygote::default(),
        }
    }

    pub fn host_pid(mut self, pid: u32) -> Self {
        self.host_pid = pid;
        self
    }

    pub fn child(mut self, pid: u32, role: ProcessRole, name: &str) -> Self {
        self.children.push(ChildProcessInfo {
            pid,
            role,
            name: name.to_string(),
        });
        self
    }

    /// Adds a pid to the OS process-tree walk.
    pub fn tree_child(mut self, pid: u32) -> Self {
        self.memory.children.push(pid);
        self
    }

    pub fn working_set(mut self, pid: u32, set: WorkingSet) -> Self {
        self.memory.sets.push((pid, set));
        self
    }

    pub fn renderer(mut self, host: FakeRendererHost) -> Self {
        self.renderers.hosts.push(Arc::new(host));
        self
    }

    pub fn backing_store_bytes(mut self, bytes: u64) -> Self {
        self.renderers.backing_store_bytes = bytes;
        self
    }

    pub fn zygote_pids(mut self, zygote: Option<u32>, sandbox_helper: Option<u32>) -> Self {
        self.zygote = StaticZygote {
            zygote,
            sandbox_helper,
        };
        self
    }

    pub fn build(self) -> HostInterfaces {
        HostInterfaces {
            host_pid: self.host_pid,
            child_processes: Arc::new(StaticChildRegistry(self.children)),
            memory: Arc::new(self.memory),
            renderers: Arc::new(self.renderers),
            zygote: Arc::new(self.zygote),
            strings: Arc::new(EnglishStrings),
        }
    }
}

/// Runs one fetch to completion and returns the delivered record set.
pub fn run_fetch(details: &MemoryDetails) -> ProcessData {
    let (tx, rx) = std::sync::mpsc::channel();
    details
        .fetch(Box::new(move |data| {
            let _ = tx.send(data);
        }))
        .expect("fetch should start");
    rx.recv_timeout(Duration::from_secs(5))
        .expect("pipeline did not deliver")
}
