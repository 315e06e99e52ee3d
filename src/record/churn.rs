use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChurnCount {
    /// Threads that are new or accumulated any user/system time since the
    /// previous row.
    pub changed: usize,
    /// Threads present in the current row.
    pub live: usize,
}

/// Compares each row's thread map with the one before it. Only the previous
/// row is retained.
#[derive(Debug, Default)]
pub struct ThreadChurn {
    previous: HashMap<u64, (f64, f64)>,
}

impl ThreadChurn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, current: HashMap<u64, (f64, f64)>) -> ChurnCount {
        let changed = current
            .iter()
            .filter(|(id, times)| match self.previous.get(id) {
                None => true,
                Some(before) => before.0 != times.0 || before.1 != times.1,
            })
            .count();
        let live = current.len();
        self.previous = current;
        ChurnCount { changed, live }
    }
}
