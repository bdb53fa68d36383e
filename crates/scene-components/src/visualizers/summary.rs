use std::sync::Arc;

use serde_json::Value;

use scene_engine::{
    CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, Parameterized, StateType,
    Visualizer,
};

use crate::keys;
use crate::shapes::{counter_type, decode, graph_state_type, Counter, GraphState};

fn join_or_empty(items: &[String]) -> String {
    if items.is_empty() {
        "(empty)".to_string()
    } else {
        items.join(", ")
    }
}

/// One-line summary of search progress
pub struct GraphStateSummary {
    accepts: StateType,
}

impl GraphStateSummary {
    pub fn new() -> Self {
        Self {
            accepts: graph_state_type(),
        }
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::GRAPH_STATE_SUMMARY,
            ComponentKind::Visualizer,
            "Search summary",
            "Current node, visited nodes and pending frontier",
            Parameterized::fixed(Component::Visualizer(Arc::new(GraphStateSummary::new()))),
        )
    }
}

impl Default for GraphStateSummary {
    fn default() -> Self {
        Self::new()
    }
}

inventory::submit!(CatalogFn(GraphStateSummary::catalog_entry));

impl Visualizer for GraphStateSummary {
    fn name(&self) -> &str {
        "Search summary"
    }

    fn accepts(&self) -> &StateType {
        &self.accepts
    }

    fn render(&self, state: &Value) -> Result<String, ComponentError> {
        let state: GraphState = decode(state)?;
        Ok(format!(
            "current: {} | visited: {} | to visit: {}",
            state.current_node_id.as_deref().unwrap_or("(none)"),
            join_or_empty(&state.visited),
            join_or_empty(&state.to_visit),
        ))
    }
}

/// Renders `counter = n`
pub struct CounterSummary {
    accepts: StateType,
}

impl CounterSummary {
    pub fn new() -> Self {
        Self {
            accepts: counter_type(),
        }
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::COUNTER_SUMMARY,
            ComponentKind::Visualizer,
            "Counter summary",
            "The counter value",
            Parameterized::fixed(Component::Visualizer(Arc::new(CounterSummary::new()))),
        )
    }
}

impl Default for CounterSummary {
    fn default() -> Self {
        Self::new()
    }
}

inventory::submit!(CatalogFn(CounterSummary::catalog_entry));

impl Visualizer for CounterSummary {
    fn name(&self) -> &str {
        "Counter summary"
    }

    fn accepts(&self) -> &StateType {
        &self.accepts
    }

    fn render(&self, state: &Value) -> Result<String, ComponentError> {
        let Counter { counter } = decode(state)?;
        Ok(format!("counter = {}", counter))
    }
}
