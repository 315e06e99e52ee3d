use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::{ProcessHandle, ResourceCounters};

pub struct TrackedChild<P> {
    pub handle: P,
    /// Counters observed at the end of the last tick this child answered.
    pub baseline: ResourceCounters,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
}

pub struct TrackedChildSet<P> {
    entries: BTreeMap<u32, TrackedChild<P>>,
}

impl<P> Default for TrackedChildSet<P> {
    fn default() -> Self {
        TrackedChildSet {
            entries: BTreeMap::new(),
        }
    }
}

impl<P: ProcessHandle> TrackedChildSet<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newcomers are baselined at their current counters, so they add
    /// nothing on the tick they are first seen. Unreadable newcomers are left
    /// for the next enumeration.
    pub fn reconcile(&mut self, enumerated: Vec<P>) -> Reconciliation {
        let mut incoming: HashMap<u32, P> = enumerated
            .into_iter()
            .map(|handle| (handle.pid(), handle))
            .collect();

        let removed: Vec<u32> = self
            .entries
            .keys()
            .filter(|pid| !incoming.contains_key(pid))
            .copied()
            .collect();
        for pid in &removed {
            self.entries.remove(pid);
            debug!("child {} no longer present", pid);
        }

        let mut added = Vec::new();
        for (pid, handle) in incoming.drain() {
            if self.entries.contains_key(&pid) {
                continue;
            }
            match handle.counters() {
                Ok(baseline) => {
                    debug!("tracking child {}", pid);
                    self.entries.insert(pid, TrackedChild { handle, baseline });
                    added.push(pid);
                }
                Err(err) => debug!("child {} not readable yet: {}", pid, err),
            }
        }
        added.sort_unstable();

        Reconciliation { added, removed }
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn get(&self, pid: u32) -> Option<&TrackedChild<P>> {
        self.entries.get(&pid)
    }

    pub fn pids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&u32, &mut TrackedChild<P>)> {
        self.entries.iter_mut()
    }
}
