//! Orchestration between the UI seam and the core components.

mod search;
mod session;

pub use search::{ReadingOutcome, SearchCoordinator, build_reading};
pub use session::SessionState;
