//! Core data model for the memory accounting pipeline.
//!
//! This module defines the per-process record produced by the pipeline,
//! the role taxonomy used to classify processes, and the renderer
//! sub-role taxonomy applied to renderer processes.

/// Role of a process within the multi-process host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    Browser,
    Renderer,
    Plugin,
    Worker,
    Utility,
    Zygote,
    SandboxHelper,
    NativeClientLoader,
    NativeClientBroker,
    Gpu,
    PepperPlugin,
    /// Not yet classified. Records still carrying this role after
    /// classification are dropped before emission.
    Unknown,
}

impl ProcessRole {
    /// English display name for the role.
    pub fn name(self) -> &'static str {
        match self {
            ProcessRole::Browser => "Browser",
            ProcessRole::Renderer => "Tab",
            ProcessRole::Plugin => "Plug-in",
            ProcessRole::Worker => "Worker",
            ProcessRole::Utility => "Utility",
            ProcessRole::Zygote => "Zygote",
            ProcessRole::SandboxHelper => "Sandbox helper",
            ProcessRole::NativeClientLoader => "Native Client module",
            ProcessRole::NativeClientBroker => "Native Client broker",
            ProcessRole::Gpu => "GPU",
            ProcessRole::PepperPlugin => "Pepper Plugin",
            ProcessRole::Unknown => "Unknown",
        }
    }
}

/// Refined sub-role of a renderer process. Meaningful only when the
/// record's role is [`ProcessRole::Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Ordinary tabbed web content.
    Normal,
    /// A surface with privileged host bindings (internal pages).
    Chrome,
    Extension,
    Devtools,
    Interstitial,
    Notification,
    BackgroundApp,
    Unknown,
}

impl RendererKind {
    /// English display name for the renderer sub-role.
    pub fn name(self) -> &'static str {
        match self {
            RendererKind::Normal => "Tab",
            RendererKind::Chrome => "Tab (Chrome)",
            RendererKind::Extension => "Extension",
            RendererKind::Devtools => "Devtools",
            RendererKind::Interstitial => "Interstitial",
            RendererKind::Notification => "Notification",
            RendererKind::BackgroundApp => "Background App",
            RendererKind::Unknown => "Unknown",
        }
    }
}

/// English display name combining role and renderer sub-role.
pub fn full_type_name(role: ProcessRole, kind: RendererKind) -> &'static str {
    if role == ProcessRole::Renderer {
        kind.name()
    } else {
        role.name()
    }
}

/// OS-reported resident memory of a process, in kilobytes.
///
/// `shared_kb` and `shareable_kb` stay zero on hosts whose OS does not
/// report them; zero is also a valid measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkingSet {
    pub private_kb: u64,
    pub shared_kb: u64,
    pub shareable_kb: u64,
}

/// One record per live child process of the host, plus a synthetic record
/// for the host process itself.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    /// OS process identifier. Nonzero; immutable once set.
    pub pid: u32,
    pub role: ProcessRole,
    pub renderer_kind: RendererKind,
    /// One human-readable entry per hosted surface, in visit order.
    pub titles: Vec<String>,
    /// True iff the record hosts a surface showing the host's internal
    /// memory-inspection page. Consumers exclude such records from
    /// user-visible aggregate totals.
    pub is_diagnostics: bool,
    pub working_set: WorkingSet,
}

impl ProcessRecord {
    pub fn new(pid: u32, role: ProcessRole) -> Self {
        Self {
            pid,
            role,
            renderer_kind: RendererKind::Unknown,
            titles: Vec::new(),
            is_diagnostics: false,
            working_set: WorkingSet::default(),
        }
    }
}

/// The completed record set for one request.
#[derive(Debug, Clone, Default)]
pub struct ProcessData {
    /// Host display name.
    pub name: String,
    /// Canonical process-image name of the host.
    pub process_name: String,
    /// Records in enumeration order; the foreign-profile filter preserves
    /// relative order.
    pub processes: Vec<ProcessRecord>,
}
