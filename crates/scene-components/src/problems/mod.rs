//! Problems
//!
//! Components that produce the initial state of a scene.

mod counter;
mod graph;

pub use counter::CounterProblem;
pub use graph::GraphProblem;
