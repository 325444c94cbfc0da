//! Child-process enumeration stage. Runs on the I/O context.

use ahash::AHashSet;
use tracing::{debug, trace};

use crate::host::ChildProcessRegistry;
use crate::record::ProcessRecord;

/// Copies (pid, role, name) tuples out of the child-process registry and
/// turns them into fresh records, preserving registry order. Entries
/// whose pid cannot be resolved are skipped, as are duplicate pids.
pub(crate) fn collect_child_info(registry: &dyn ChildProcessRegistry) -> Vec<ProcessRecord> {
    let mut seen = AHashSet::new();
    let mut records = Vec::new();

    for info in registry.child_processes() {
        if info.pid == 0 {
            debug!(name = %info.name, "skipping child process without a resolvable pid");
            continue;
        }
        if !seen.insert(info.pid) {
            debug!(pid = info.pid, "registry reported a pid twice; keeping the first entry");
            continue;
        }
        let mut record = ProcessRecord::new(info.pid, info.role);
        record.titles.push(info.name);
        records.push(record);
    }

    trace!(count = records.len(), "child-process enumeration complete");
    records
}
