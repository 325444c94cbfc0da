//! OS working-set sampling stage. Runs on the blocking context.

use rayon::prelude::*;
use tracing::debug;

use crate::host::OsMemoryQuery;
use crate::record::{ProcessRecord, ProcessRole};

/// Completes the record set with OS-level data: the synthetic record for
/// the host process itself, records for process-tree children the
/// registry did not report (renderers above all, left unclassified for
/// the UI stage), and working-set figures for every record. Query
/// failures and pids that died since enumeration record zero.
pub(crate) fn collect_process_data(
    records: &mut Vec<ProcessRecord>,
    host_pid: u32,
    display_name: &str,
    memory: &dyn OsMemoryQuery,
) {
    if host_pid != 0 && !records.iter().any(|r| r.pid == host_pid) {
        let mut host_record = ProcessRecord::new(host_pid, ProcessRole::Browser);
        host_record.titles.push(display_name.to_string());
        records.insert(0, host_record);
    }

    for pid in memory.child_pids(host_pid) {
        if pid == 0 || records.iter().any(|r| r.pid == pid) {
            continue;
        }
        // Unknown until the UI stage matches it against a renderer host;
        // unmatched records are filtered before emission.
        records.push(ProcessRecord::new(pid, ProcessRole::Unknown));
    }

    records.par_iter_mut().for_each(|record| {
        match memory.working_set(record.pid) {
            Some(working_set) => record.working_set = working_set,
            None => debug!(pid = record.pid, "working-set query failed; recording zero"),
        }
    });
}
