//! State shapes shared by the built-in components
//!
//! Values travel between components as JSON; these typed views decode and
//! encode the built-in shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use scene_engine::{ComponentError, FieldType, StateType};

/// Field names of the built-in shapes
pub mod fields {
    pub const NODES: &str = "nodes";
    pub const EDGES: &str = "edges";
    pub const START_NODE_ID: &str = "startNodeId";
    pub const END_NODE_ID: &str = "endNodeId";
    pub const CURRENT_NODE_ID: &str = "currentNodeId";
    pub const VISITED: &str = "visited";
    pub const TO_VISIT: &str = "toVisit";
    pub const COUNTER: &str = "counter";
}

/// Size limits of the built-in shapes
pub mod limits {
    /// Largest counter that may be laid out as a path graph
    pub const MAX_PATH_NODES: u64 = 10_000;
}

/// `{nodes, edges, startNodeId, endNodeId}`
pub fn graph_type() -> StateType {
    StateType::new("graph")
        .with_field(fields::NODES, FieldType::List)
        .with_field(fields::EDGES, FieldType::List)
        .with_field(fields::START_NODE_ID, FieldType::Any)
        .with_field(fields::END_NODE_ID, FieldType::Any)
}

/// A graph plus search progress: `currentNodeId`, `visited`, `toVisit`
pub fn graph_state_type() -> StateType {
    let mut state_type = graph_type()
        .with_field(fields::CURRENT_NODE_ID, FieldType::Any)
        .with_field(fields::VISITED, FieldType::List)
        .with_field(fields::TO_VISIT, FieldType::List);
    state_type.name = "graph-state".to_string();
    state_type
}

/// `{counter}`
pub fn counter_type() -> StateType {
    StateType::new("counter").with_field(fields::COUNTER, FieldType::Number)
}

/// An undirected edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// An undirected graph with optional start and end nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
    pub start_node_id: Option<String>,
    pub end_node_id: Option<String>,
}

impl Graph {
    /// Neighbors of `node`, in edge order
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == node {
                    Some(edge.target.as_str())
                } else if edge.target == node {
                    Some(edge.source.as_str())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    /// Check that edges and endpoints reference declared nodes
    pub fn validate(&self) -> Result<(), ComponentError> {
        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !self.contains(end) {
                    return Err(ComponentError::invalid_input(format!(
                        "edge references unknown node '{}'",
                        end
                    )));
                }
            }
        }
        for (label, node) in [("start", &self.start_node_id), ("end", &self.end_node_id)] {
            if let Some(node) = node {
                if !self.contains(node) {
                    return Err(ComponentError::invalid_input(format!(
                        "{} node '{}' is not in the graph",
                        label, node
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A graph with search progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    #[serde(flatten)]
    pub graph: Graph,
    pub current_node_id: Option<String>,
    pub visited: Vec<String>,
    pub to_visit: Vec<String>,
}

/// `{counter}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub counter: u64,
}

/// Decode a state value into a typed view
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ComponentError> {
    T::deserialize(value).map_err(|e| ComponentError::invalid_input(e.to_string()))
}

/// Encode a typed view into a state value
pub fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(|e| ComponentError::failed(e.to_string()))
}
