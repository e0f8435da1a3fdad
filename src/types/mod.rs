mod cycle;
mod record;

pub use cycle::{progress_percent, CycleId, CycleReport};
pub use record::Record;
