//! Article ingestion: the reconciliation cycle and the timer that drives it.

mod reconciler;
mod scheduler;

pub use reconciler::*;
pub use scheduler::*;
