//! Algorithms
//!
//! Step generators written as explicit state machines. Each transition is
//! tagged with the pseudocode lines it covers.

mod countdown;
mod search;

pub use countdown::Countdown;
pub use search::GraphSearch;
