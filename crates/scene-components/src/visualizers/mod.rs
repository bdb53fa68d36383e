//! Visualizers
//!
//! Text renderings of a state. They never feed other components.

mod summary;

pub use summary::{CounterSummary, GraphStateSummary};
