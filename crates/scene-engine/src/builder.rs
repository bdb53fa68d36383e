//! Fluent builder for composition graphs
//!
//! Builds a [`CompositionGraph`] from component instances in code, without
//! going through a catalog.

use std::sync::Arc;

use crate::component::{Adapter, Algorithm, Component, Problem, Visualizer};
use crate::graph::{CompositionGraph, Connection, Slot};
use crate::validation::{validate_graph, ConfigurationError};

/// Fluent builder for constructing composition graphs
///
/// # Example
///
/// ```ignore
/// let graph = CompositionBuilder::new()
///     .problem("problem", StaticProblem::new("counter", json!({"counter": 3})))
///     .algorithm("algorithm", Countdown::new())
///     .connect_whole("problem", "algorithm")
///     .build();
/// ```
#[derive(Default)]
pub struct CompositionBuilder {
    graph: CompositionGraph,
}

impl CompositionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved component under an alias, replacing any previous one
    pub fn add_node(mut self, alias: impl Into<String>, component: Component) -> Self {
        self.graph.nodes.insert(alias.into(), component);
        self
    }

    pub fn problem(self, alias: impl Into<String>, problem: impl Problem + 'static) -> Self {
        self.add_node(alias, Component::Problem(Arc::new(problem)))
    }

    pub fn algorithm(self, alias: impl Into<String>, algorithm: impl Algorithm + 'static) -> Self {
        self.add_node(alias, Component::Algorithm(Arc::new(algorithm)))
    }

    pub fn adapter(self, alias: impl Into<String>, adapter: impl Adapter + 'static) -> Self {
        self.add_node(alias, Component::Adapter(Arc::new(adapter)))
    }

    pub fn visualizer(self, alias: impl Into<String>, visualizer: impl Visualizer + 'static) -> Self {
        self.add_node(alias, Component::Visualizer(Arc::new(visualizer)))
    }

    /// Connect two slots
    pub fn connect(
        self,
        from_node: impl Into<String>,
        from_slot: impl Into<Slot>,
        to_node: impl Into<String>,
        to_slot: impl Into<Slot>,
    ) -> Self {
        self.add_connection(Connection::new(from_node, from_slot, to_node, to_slot))
    }

    /// Connect the whole value of one node to another
    pub fn connect_whole(self, from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        self.add_connection(Connection::whole(from_node, to_node))
    }

    /// Connect two slots through an adapter chain
    pub fn connect_with_adapters(
        self,
        from_node: impl Into<String>,
        from_slot: impl Into<Slot>,
        to_node: impl Into<String>,
        to_slot: impl Into<Slot>,
        adapters: Vec<Arc<dyn Adapter>>,
    ) -> Self {
        self.add_connection(
            Connection::new(from_node, from_slot, to_node, to_slot).with_adapters(adapters),
        )
    }

    pub fn add_connection(mut self, connection: Connection) -> Self {
        self.graph.connections.push(connection);
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> CompositionGraph {
        self.graph
    }

    /// Build the graph, returning every configuration error if it is invalid
    pub fn build_validated(self) -> Result<CompositionGraph, Vec<ConfigurationError>> {
        let errors = validate_graph(&self.graph);
        if errors.is_empty() {
            Ok(self.graph)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{FnAdapter, StaticProblem};
    use crate::executor::test_support::CountingAlgorithm;
    use crate::state_type::StateType;
    use serde_json::json;

    #[test]
    fn test_builder_basic() {
        let graph = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": []})))
            .algorithm("algorithm", CountingAlgorithm::terminating(1))
            .connect_whole("problem", "algorithm")
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.connections.len(), 1);
        assert!(graph.connections[0].from_slot.is_whole());
        assert_eq!(graph.node("algorithm").map(|c| c.name()), Some("counting"));
    }

    #[test]
    fn test_builder_adapter_chain_connection() {
        let identity: Arc<dyn Adapter> = Arc::new(FnAdapter::new(
            "identity",
            StateType::new("any"),
            StateType::new("any"),
            |v| Ok(v.clone()),
        ));
        let graph = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({})))
            .algorithm("algorithm", CountingAlgorithm::terminating(1))
            .connect_with_adapters("problem", ".", "algorithm", ".", vec![identity.clone(), identity])
            .build();

        assert_eq!(graph.connections[0].adapters.len(), 2);
    }

    #[test]
    fn test_build_validated() {
        let ok = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({})))
            .algorithm("algorithm", CountingAlgorithm::terminating(1))
            .build_validated();
        assert!(ok.is_ok());

        let err = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({})))
            .build_validated()
            .unwrap_err();
        assert_eq!(err.len(), 1);
    }
}
