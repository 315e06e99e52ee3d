use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{ProcessHandle, ResourceCounters};
use crate::error::ProbeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FakeState {
    Running,
    Denied,
    Gone,
}

struct FakeEntry {
    parent: Option<u32>,
    counters: ResourceCounters,
    state: FakeState,
}

/// In-memory process table driven by tests.
#[derive(Clone, Default)]
pub(crate) struct FakeWorld {
    table: Arc<Mutex<BTreeMap<u32, FakeEntry>>>,
}

impl FakeWorld {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn spawn(&self, pid: u32, parent: Option<u32>) -> FakeProcess {
        self.table.lock().unwrap().insert(
            pid,
            FakeEntry {
                parent,
                counters: ResourceCounters::default(),
                state: FakeState::Running,
            },
        );
        self.handle(pid)
    }

    pub(crate) fn handle(&self, pid: u32) -> FakeProcess {
        FakeProcess {
            pid,
            world: self.clone(),
        }
    }

    pub(crate) fn update(&self, pid: u32, f: impl FnOnce(&mut ResourceCounters)) {
        let mut table = self.table.lock().unwrap();
        let entry = table.get_mut(&pid).expect("unknown fake pid");
        f(&mut entry.counters);
    }

    pub(crate) fn set_state(&self, pid: u32, state: FakeState) {
        let mut table = self.table.lock().unwrap();
        table.get_mut(&pid).expect("unknown fake pid").state = state;
    }

    fn descends_from(table: &BTreeMap<u32, FakeEntry>, pid: u32, ancestor: u32) -> bool {
        let mut current = table.get(&pid).and_then(|e| e.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = table.get(&parent).and_then(|e| e.parent);
        }
        false
    }
}

#[derive(Clone)]
pub(crate) struct FakeProcess {
    pid: u32,
    world: FakeWorld,
}

impl ProcessHandle for FakeProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        let table = self.world.table.lock().unwrap();
        matches!(table.get(&self.pid), Some(e) if e.state != FakeState::Gone)
    }

    fn counters(&self) -> Result<ResourceCounters, ProbeError> {
        let table = self.world.table.lock().unwrap();
        match table.get(&self.pid) {
            Some(entry) => match entry.state {
                FakeState::Running => Ok(entry.counters.clone()),
                FakeState::Denied => Err(ProbeError::AccessDenied(self.pid)),
                FakeState::Gone => Err(ProbeError::ProcessGone(self.pid)),
            },
            None => Err(ProbeError::ProcessGone(self.pid)),
        }
    }

    fn children(&self) -> Vec<Self> {
        let table = self.world.table.lock().unwrap();
        table
            .iter()
            .filter(|(_, entry)| entry.state != FakeState::Gone)
            .filter(|(pid, _)| FakeWorld::descends_from(&table, **pid, self.pid))
            .map(|(pid, _)| self.world.handle(*pid))
            .collect()
    }
}
