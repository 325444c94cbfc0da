//! /proc-backed implementation of the OS memory queries.
//!
//! This module answers working-set queries from `/proc/<pid>/smaps` and
//! `/proc/<pid>/smaps_rollup` and discovers the host's OS process tree
//! from `/proc/<pid>/stat` parent links. Hosts on other platforms plug in
//! their own [`OsMemoryQuery`] implementation.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ahash::AHashMap as HashMap;
use tracing::debug;

use crate::host::OsMemoryQuery;
use crate::record::WorkingSet;

/// Working-set queries rooted at a /proc-shaped directory. The root is
/// configurable for tests and containerized hosts.
pub struct ProcWorkingSetQuery {
    root: PathBuf,
}

impl ProcWorkingSetQuery {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn proc_path(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl Default for ProcWorkingSetQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl OsMemoryQuery for ProcWorkingSetQuery {
    fn child_pids(&self, host_pid: u32) -> Vec<u32> {
        if host_pid == 0 {
            return Vec::new();
        }
        let parents = collect_parent_links(&self.root);
        let mut out = Vec::new();
        for &pid in parents.keys() {
            if pid != host_pid && descends_from(pid, host_pid, &parents) {
                out.push(pid);
            }
        }
        // read_dir order is arbitrary; make the walk deterministic.
        out.sort_unstable();
        out
    }

    fn working_set(&self, pid: u32) -> Option<WorkingSet> {
        let proc_path = self.proc_path(pid);
        // smaps_rollup (Linux >= 4.14) carries pre-summed totals and is
        // much faster than walking every mapping.
        let rollup = proc_path.join("smaps_rollup");
        let result = if rollup.exists() {
            parse_smaps(&rollup)
        } else {
            parse_smaps(&proc_path.join("smaps"))
        };
        match result {
            Ok(working_set) => Some(working_set),
            Err(e) => {
                debug!(pid, error = %e, "working-set query failed");
                None
            }
        }
    }
}

/// Accumulates private and shared working-set figures from an
/// smaps-format file. Linux has no notion of "shareable" pages, so that
/// field stays zero.
fn parse_smaps(path: &Path) -> Result<WorkingSet, std::io::Error> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut private_kb = 0;
    let mut shared_kb = 0;

    for line in reader.lines() {
        let l = line?;
        if let Some(v) = l.strip_prefix("Private_Clean:") {
            private_kb += parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = l.strip_prefix("Private_Dirty:") {
            private_kb += parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = l.strip_prefix("Shared_Clean:") {
            shared_kb += parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = l.strip_prefix("Shared_Dirty:") {
            shared_kb += parse_kb_value(v).unwrap_or(0);
        }
    }

    Ok(WorkingSet {
        private_kb,
        shared_kb,
        shareable_kb: 0,
    })
}

/// Parses kilobyte values from smaps file lines ("  1234 kB").
fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Reads pid -> ppid links for every numeric entry under the proc root.
fn collect_parent_links(root: &Path) -> HashMap<u32, u32> {
    let mut parents = HashMap::new();
    let Ok(entries) = fs::read_dir(root) else {
        return parents;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let Ok(pid) = name.parse::<u32>() else {
            continue;
        };
        if let Ok(stat) = fs::read_to_string(path.join("stat")) {
            if let Some(ppid) = parse_stat_ppid(&stat) {
                parents.insert(pid, ppid);
            }
        }
    }
    parents
}

/// Extracts the parent pid from a /proc/<pid>/stat line. The comm field
/// may itself contain spaces and parentheses, so fields are taken after
/// the last ')'.
fn parse_stat_ppid(stat: &str) -> Option<u32> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    // Fields after comm: state, ppid, ...
    after_comm.split_whitespace().nth(1)?.parse().ok()
}

/// Whether `pid`'s parent chain reaches `ancestor`. The chain is bounded
/// so a corrupt snapshot with a ppid cycle cannot spin.
fn descends_from(pid: u32, ancestor: u32, parents: &HashMap<u32, u32>) -> bool {
    let mut current = pid;
    for _ in 0..parents.len() {
        match parents.get(&current) {
            Some(&ppid) if ppid == ancestor => return true,
            Some(&ppid) if ppid == current || ppid == 0 => return false,
            Some(&ppid) => current = ppid,
            None => return false,
        }
    }
    false
}
