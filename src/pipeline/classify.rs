//! Renderer classification stage. Runs on the UI context.
//!
//! This is the heart of the pipeline: it matches records against the
//! renderer-host registry, refines renderer sub-roles through a priority
//! cascade, attributes human-readable titles from navigation state, flags
//! diagnostic renderers, and finally drops records that never resolved to
//! a role (children of a foreign profile).

use tracing::{debug, trace};

use crate::config::Config;
use crate::host::{HostInterfaces, RendererHost, StringKey, ViewType};
use crate::record::{ProcessRecord, ProcessRole, RendererKind};

/// Classifies the record set against the UI-side registries, then removes
/// records whose role is still unknown. Relative order is preserved.
pub(crate) fn classify_renderers(
    records: &mut Vec<ProcessRecord>,
    host: &HostInterfaces,
    config: &Config,
) {
    for renderer in host.renderers.renderer_hosts() {
        // Crashed or not-yet-connected renderers contribute nothing.
        if !renderer.has_connection() {
            continue;
        }
        let pid = renderer.pid();
        let Some(record) = records.iter_mut().find(|r| r.pid == pid) else {
            // The renderer registry is populated independently of the
            // process-tree walk; a miss usually means the renderer
            // belongs to a different profile.
            trace!(pid, "renderer host has no enumerated record; skipping");
            continue;
        };
        record.role = ProcessRole::Renderer;
        classify_surfaces(record, renderer.as_ref(), host, config);
    }

    refine_from_zygote(records, host);

    records.retain(|record| {
        if record.role == ProcessRole::Unknown {
            debug!(pid = record.pid, "dropping unclassified record from a foreign profile");
            false
        } else {
            true
        }
    });
}

/// Walks the renderer's listener sequence and applies the refinement
/// cascade per visual view. The rules are evaluated top to bottom and the
/// first match wins for a given surface; across surfaces the last one
/// visited wins the kind assignment.
fn classify_surfaces(
    record: &mut ProcessRecord,
    renderer: &dyn RendererHost,
    host: &HostInterfaces,
    config: &Config,
) {
    let extension_map = renderer.extension_map();

    for surface in renderer.surfaces() {
        if !surface.is_view() {
            continue;
        }
        let url = surface.url();
        let view_type = surface.view_type();

        if surface.has_host_bindings() {
            record.renderer_kind = if view_type == ViewType::DevTools {
                RendererKind::Devtools
            } else {
                RendererKind::Chrome
            };
        } else if extension_map.contains(record.pid) {
            // Hosted apps render ordinary web content and deliberately do
            // not make this an extension process.
            let has_packaged_extension = extension_map
                .extensions_in(record.pid)
                .iter()
                .any(|id| !extension_map.is_hosted_app(id));
            if has_packaged_extension {
                record.renderer_kind = RendererKind::Extension;
            }
        }

        let Some(contents) = surface.web_contents() else {
            if extension_map.contains(record.pid) {
                // Background extension pages carry the extension id as
                // the URL host; attribute the installed extension's name.
                if let Some(name) = url
                    .host_str()
                    .and_then(|id| extension_map.display_name(id))
                {
                    record.titles.push(name);
                }
            } else if record.renderer_kind == RendererKind::Unknown {
                record.titles.push(url.as_str().to_string());
                record.renderer_kind = match view_type {
                    ViewType::BackgroundContents => RendererKind::BackgroundApp,
                    ViewType::Interstitial => RendererKind::Interstitial,
                    ViewType::Notification => RendererKind::Notification,
                    _ => RendererKind::Unknown,
                };
            }
            continue;
        };

        // A web-contents surface whose kind is still unresolved is a
        // plain tabbed renderer.
        if record.renderer_kind == RendererKind::Unknown {
            record.renderer_kind = RendererKind::Normal;
        }

        let mut title = contents.title();
        if title.is_empty() {
            title = host.strings.get(StringKey::DefaultTabTitle);
        }
        record.titles.push(title);

        // Both navigation entries can point at the diagnostics page: on
        // the requesting surface it is still pending, while a second open
        // copy has it committed. Either entry may be absent.
        let entries = [contents.pending_entry(), contents.last_committed_entry()];
        if entries
            .iter()
            .flatten()
            .any(|entry| entry.virtual_url.eq_ignore_ascii_case(&config.diagnostics_url))
        {
            record.is_diagnostics = true;
        }
    }
}

/// POSIX-only refinement: records that still have no role may be the
/// host-reported zygote or sandbox helper.
fn refine_from_zygote(records: &mut [ProcessRecord], host: &HostInterfaces) {
    let zygote_pid = host.zygote.zygote_pid();
    let sandbox_helper_pid = host.zygote.sandbox_helper_pid();

    for record in records
        .iter_mut()
        .filter(|r| r.role == ProcessRole::Unknown)
    {
        if Some(record.pid) == zygote_pid {
            record.role = ProcessRole::Zygote;
        } else if Some(record.pid) == sandbox_helper_pid {
            record.role = ProcessRole::SandboxHelper;
        }
    }
}
