//! Scene Components
//!
//! Built-in components for the scene engine. Each one registers a catalog
//! entry under a stable key so box configurations can refer to it by name.
//!
//! # Categories
//!
//! - **Problems**: produce an initial state (undirected graph, counter)
//! - **Algorithms**: step through a state (breadth-first, depth-first, countdown)
//! - **Adapters**: reshape states between components
//! - **Visualizers**: render a state as text

pub mod adapters;
pub mod algorithms;
pub mod problems;
pub mod setup;
pub mod shapes;
pub mod visualizers;

pub use adapters::*;
pub use algorithms::*;
pub use problems::*;
pub use setup::{builtin_catalog, register_builtins, BUILTINS};
pub use visualizers::*;

/// Catalog keys of the built-in components
pub mod keys {
    pub const UNDIRECTED_GRAPH: &str = "undirected-graph";
    pub const COUNTER: &str = "counter";

    pub const BREADTH_FIRST_SEARCH: &str = "breadth-first-search";
    pub const DEPTH_FIRST_SEARCH: &str = "depth-first-search";
    pub const COUNTDOWN: &str = "countdown";

    pub const COUNTER_TO_GRAPH_STATE: &str = "counter-to-graph-state";
    pub const GRAPH_STATE_TO_COUNTER: &str = "graph-state-to-counter";
    pub const GRAPH_STATE_TO_GRAPH: &str = "graph-state-to-graph";

    pub const GRAPH_STATE_SUMMARY: &str = "graph-state-summary";
    pub const COUNTER_SUMMARY: &str = "counter-summary";
}

#[cfg(test)]
mod tests {
    use scene_engine::ComponentCatalog;

    use crate::keys;

    #[test]
    fn test_inventory_collects_all_builtins() {
        let catalog = ComponentCatalog::with_registered();
        assert_eq!(catalog.len(), 10, "Expected 10 built-in components");

        assert!(catalog.has_component(keys::UNDIRECTED_GRAPH));
        assert!(catalog.has_component(keys::DEPTH_FIRST_SEARCH));
        assert!(catalog.has_component(keys::COUNTER_TO_GRAPH_STATE));
        assert!(catalog.has_component(keys::COUNTER_SUMMARY));
    }
}
