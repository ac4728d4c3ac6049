mod handle;
mod input;

pub use handle::JobHandle;
pub use input::{QueryIdInput, StartQueryInput, StartQueryOutput, StopQueryOutput};
