use std::fmt;

use serde::Serialize;

/// Identifies one fetch-then-merge pass. Assigned monotonically by the trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CycleId(pub u64);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a successful cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub total: usize,
    pub inserted: usize,
    pub ignored: usize,
}

/// Position-based progress: `floor(done * 100 / total)`.
///
/// `done` is the 1-based index of the record just merged, so the last record always yields 100.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (done.min(total) as u128 * 100) / total as u128;
    pct as u8
}
