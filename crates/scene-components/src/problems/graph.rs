//! Undirected Graph Problem
//!
//! Produces a graph with start and end nodes. Every part of the graph is a
//! parameter; the defaults describe a five-node graph searched from A to D.

use std::sync::Arc;

use serde_json::{json, Value};

use scene_engine::{
    CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, ParameterSpec,
    Parameterized, Problem, StateType,
};

use crate::keys;
use crate::shapes::{encode, graph_type, Graph};

/// Problem producing a fixed undirected graph
pub struct GraphProblem {
    state_type: StateType,
    state: Value,
}

impl GraphProblem {
    /// Create a problem from a validated graph
    pub fn new(graph: &Graph) -> Result<Self, ComponentError> {
        graph.validate()?;
        Ok(Self {
            state_type: graph_type(),
            state: encode(graph)?,
        })
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::UNDIRECTED_GRAPH,
            ComponentKind::Problem,
            "Undirected graph",
            "A graph of named nodes joined by undirected edges",
            Parameterized::typed(
                vec![
                    ParameterSpec::new("nodes", "Nodes", json!(["A", "B", "C", "D", "E"])),
                    ParameterSpec::new(
                        "edges",
                        "Edges",
                        json!([
                            {"source": "A", "target": "B"},
                            {"source": "B", "target": "C"},
                            {"source": "B", "target": "D"},
                            {"source": "D", "target": "E"},
                            {"source": "A", "target": "E"}
                        ]),
                    ),
                    ParameterSpec::new("startNodeId", "Start node", json!("A")),
                    ParameterSpec::new("endNodeId", "End node", json!("D"))
                        .with_description("Search stops when this node is reached"),
                ],
                |graph: Graph| {
                    let problem = GraphProblem::new(&graph)
                        .map_err(|e| ComponentError::InvalidParameters(e.to_string()))?;
                    Ok(Component::Problem(Arc::new(problem)))
                },
            ),
        )
    }
}

inventory::submit!(CatalogFn(GraphProblem::catalog_entry));

impl Problem for GraphProblem {
    fn name(&self) -> &str {
        "Undirected graph"
    }

    fn state_type(&self) -> &StateType {
        &self.state_type
    }

    fn initial_state(&self) -> Value {
        self.state.clone()
    }
}
