//! Adapters
//!
//! Pure transforms that reshape one state into another so components with
//! different shapes can be wired together.

mod counter;
mod graph_state;

pub use counter::CounterToGraphState;
pub use graph_state::{graph_state_to_counter, graph_state_to_graph};
pub(crate) use graph_state::{graph_state_to_counter_entry, graph_state_to_graph_entry};
