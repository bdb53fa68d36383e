//! Counter to graph state
//!
//! Lays a counter `n` out as a path graph `0 - 1 - ... - n-1` whose search has
//! reached the last node.

use std::sync::Arc;

use serde_json::Value;

use scene_engine::{
    Adapter, CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, Parameterized,
    StateType,
};

use crate::keys;
use crate::shapes::{
    counter_type, decode, encode, graph_state_type, limits, Counter, Edge, Graph, GraphState,
};

pub struct CounterToGraphState {
    accepts: StateType,
    outputs: StateType,
}

impl CounterToGraphState {
    pub fn new() -> Self {
        Self {
            accepts: counter_type(),
            outputs: graph_state_type(),
        }
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::COUNTER_TO_GRAPH_STATE,
            ComponentKind::Adapter,
            "Counter to graph state",
            "Expands a counter into a path graph searched up to its last node",
            Parameterized::fixed(Component::Adapter(Arc::new(CounterToGraphState::new()))),
        )
    }
}

impl Default for CounterToGraphState {
    fn default() -> Self {
        Self::new()
    }
}

inventory::submit!(CatalogFn(CounterToGraphState::catalog_entry));

impl Adapter for CounterToGraphState {
    fn name(&self) -> &str {
        "Counter to graph state"
    }

    fn accepts(&self) -> &StateType {
        &self.accepts
    }

    fn outputs(&self) -> &StateType {
        &self.outputs
    }

    fn transform(&self, input: &Value) -> Result<Value, ComponentError> {
        let Counter { counter } = decode(input)?;
        if counter > limits::MAX_PATH_NODES {
            return Err(ComponentError::invalid_input(format!(
                "counter {} exceeds the path graph limit of {}",
                counter,
                limits::MAX_PATH_NODES
            )));
        }
        let nodes: Vec<String> = (0..counter).map(|i| i.to_string()).collect();
        let edges = nodes
            .windows(2)
            .map(|pair| Edge::new(pair[0].clone(), pair[1].clone()))
            .collect();
        let last = nodes.last().cloned();
        let visited = nodes[..nodes.len().saturating_sub(1)].to_vec();

        encode(&GraphState {
            graph: Graph {
                start_node_id: nodes.first().cloned(),
                end_node_id: last.clone(),
                nodes,
                edges,
            },
            current_node_id: last,
            visited,
            to_visit: Vec::new(),
        })
    }
}
