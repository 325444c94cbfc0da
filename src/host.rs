//! External host interfaces consumed by the pipeline.
//!
//! The pipeline reads several registries that belong to the surrounding
//! multi-process host. Each is bound to one execution context and must
//! only be touched there: the child-process registry on I/O, the OS
//! memory queries on the blocking context, and the renderer registry,
//! extension-process map and navigation state on UI. A pid is the only
//! handle that may cross a context boundary.

use std::sync::Arc;

use url::Url;

use crate::record::{ProcessRole, WorkingSet};

/// Minimal tuple copied out of the child-process registry at enumeration
/// time. Nothing else crosses off the I/O context.
#[derive(Debug, Clone)]
pub struct ChildProcessInfo {
    pub pid: u32,
    pub role: ProcessRole,
    /// Human-readable role or process name, used as the record's title.
    pub name: String,
}

/// The host's registry of non-renderer child processes. I/O context only.
pub trait ChildProcessRegistry: Send + Sync {
    /// Snapshot of the registry, in registry order.
    fn child_processes(&self) -> Vec<ChildProcessInfo>;
}

/// OS-level process queries. These may block and therefore run on the
/// blocking context.
pub trait OsMemoryQuery: Send + Sync {
    /// Pids in the host's OS process tree that may belong to it but are
    /// not reported by the child-process registry (renderers above all).
    /// Records created from these start with an unknown role and are
    /// either refined by the classifier or dropped before emission.
    fn child_pids(&self, host_pid: u32) -> Vec<u32> {
        let _ = host_pid;
        Vec::new()
    }

    /// Working-set figures for one process, or `None` when the query
    /// fails or the process has died. Failure is not an error; the
    /// sampler records zero.
    fn working_set(&self, pid: u32) -> Option<WorkingSet>;
}

/// Kind of visual view a surface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    TabContents,
    DevTools,
    BackgroundContents,
    Interstitial,
    Notification,
}

/// One entry of a navigation controller.
#[derive(Debug, Clone)]
pub struct NavigationEntry {
    pub virtual_url: String,
}

/// Navigation state of a web-contents surface. UI context only.
pub trait WebContents: Send + Sync {
    fn title(&self) -> String;
    /// The pending navigation entry, if any.
    fn pending_entry(&self) -> Option<NavigationEntry>;
    /// The last committed navigation entry, if any.
    fn last_committed_entry(&self) -> Option<NavigationEntry>;
}

/// A logical view hosted by a renderer: a tab, a background page, a
/// widget, an interstitial.
pub trait Surface: Send + Sync {
    /// Whether this listener represents a visual view. Non-view listeners
    /// are skipped during classification.
    fn is_view(&self) -> bool;
    fn view_type(&self) -> ViewType;
    /// Whether the surface may call host-internal APIs.
    fn has_host_bindings(&self) -> bool;
    fn url(&self) -> Url;
    /// The associated web-contents object; background pages, widgets and
    /// interstitials have none.
    fn web_contents(&self) -> Option<Arc<dyn WebContents>>;
}

/// Host-maintained index from pid to the extension identifiers currently
/// hosted by that process. Profile-scoped; reached through the renderer
/// host. UI context only.
pub trait ExtensionProcessMap: Send + Sync {
    fn contains(&self, pid: u32) -> bool;
    fn extensions_in(&self, pid: u32) -> Vec<String>;
    fn is_hosted_app(&self, id: &str) -> bool;
    /// Display name of an installed extension.
    fn display_name(&self, id: &str) -> Option<String>;
}

/// One renderer process as seen by the host. UI context only.
pub trait RendererHost: Send + Sync {
    fn pid(&self) -> u32;
    /// False when the underlying channel is closed or the renderer has
    /// crashed; such hosts contribute nothing.
    fn has_connection(&self) -> bool;
    /// Listener sequence in the host's order. The order is observable:
    /// when surfaces disagree on the renderer kind, the last one visited
    /// wins.
    fn surfaces(&self) -> Vec<Arc<dyn Surface>>;
    fn extension_map(&self) -> Arc<dyn ExtensionProcessMap>;
}

/// The host's registry of renderer processes. Disjoint from the
/// child-process registry, populated independently. UI context only.
pub trait RendererRegistry: Send + Sync {
    fn renderer_hosts(&self) -> Vec<Arc<dyn RendererHost>>;

    /// Total backing-store memory held for renderer widgets, in bytes.
    fn backing_store_bytes(&self) -> u64 {
        0
    }
}

/// POSIX zygote and sandbox-helper pids. Hosts on other platforms return
/// `None` and the refinement is skipped.
pub trait ZygoteHost: Send + Sync {
    fn zygote_pid(&self) -> Option<u32> {
        None
    }
    fn sandbox_helper_pid(&self) -> Option<u32> {
        None
    }
}

/// Stable keys into the host's localized string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKey {
    DefaultTabTitle,
}

/// Localized string lookup. Only the default-tab-title fallback is needed.
pub trait LocalizedStrings: Send + Sync {
    fn get(&self, key: StringKey) -> String;
}

/// Plain English strings for hosts without a localization table.
pub struct EnglishStrings;

impl LocalizedStrings for EnglishStrings {
    fn get(&self, key: StringKey) -> String {
        match key {
            StringKey::DefaultTabTitle => "Untitled".to_string(),
        }
    }
}

/// Bundle of the host interfaces one pipeline instance reads.
#[derive(Clone)]
pub struct HostInterfaces {
    /// OS pid of the host process itself. Zero disables the synthetic
    /// host record.
    pub host_pid: u32,
    pub child_processes: Arc<dyn ChildProcessRegistry>,
    pub memory: Arc<dyn OsMemoryQuery>,
    pub renderers: Arc<dyn RendererRegistry>,
    pub zygote: Arc<dyn ZygoteHost>,
    pub strings: Arc<dyn LocalizedStrings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_strings_default_tab_title() {
        assert_eq!(EnglishStrings.get(StringKey::DefaultTabTitle), "Untitled");
    }

    #[test]
    fn test_trait_defaults() {
        struct Bare;
        impl ZygoteHost for Bare {}
        impl RendererRegistry for Bare {
            fn renderer_hosts(&self) -> Vec<Arc<dyn RendererHost>> {
                Vec::new()
            }
        }
        impl OsMemoryQuery for Bare {
            fn working_set(&self, _pid: u32) -> Option<WorkingSet> {
                None
            }
        }

        assert_eq!(Bare.zygote_pid(), None);
        assert_eq!(Bare.sandbox_helper_pid(), None);
        assert_eq!(Bare.backing_store_bytes(), 0);
        assert!(Bare.child_pids(1).is_empty());
    }
}
