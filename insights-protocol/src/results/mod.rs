mod snapshot;
mod status;

pub use snapshot::{QueryStatistics, ResultField, ResultRow, ResultSnapshot};
pub use status::QueryStatus;
