//! Flush pipeline
//!
//! [`FlushCoordinator`] drives one refresh cycle at a time through the
//! [`FlushState`] machine.

pub mod coordinator;
pub mod state;

pub use coordinator::{FlushCoordinator, FlushError, FlushOutcome, FlushStats};
pub use state::{FlushEvent, FlushState};
