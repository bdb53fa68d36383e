//! Graph state adapters
//!
//! Both are closures over typed views, registered as [`FnAdapter`]s.

use std::sync::Arc;

use scene_engine::{CatalogEntry, CatalogFn, Component, ComponentKind, FnAdapter, Parameterized};

use crate::keys;
use crate::shapes::{
    counter_type, decode, encode, graph_state_type, graph_type, Counter, GraphState,
};

/// Counts the visited nodes of a search
pub fn graph_state_to_counter() -> FnAdapter {
    FnAdapter::new(
        "Graph state to counter",
        graph_state_type(),
        counter_type(),
        |input| {
            let state: GraphState = decode(input)?;
            encode(&Counter {
                counter: state.visited.len() as u64,
            })
        },
    )
}

/// Drops search progress, leaving the bare graph
pub fn graph_state_to_graph() -> FnAdapter {
    FnAdapter::new(
        "Graph state to graph",
        graph_state_type(),
        graph_type(),
        |input| {
            let state: GraphState = decode(input)?;
            encode(&state.graph)
        },
    )
}

pub(crate) fn graph_state_to_counter_entry() -> CatalogEntry {
    CatalogEntry::new(
        keys::GRAPH_STATE_TO_COUNTER,
        ComponentKind::Adapter,
        "Graph state to counter",
        "Counts the nodes a search has visited",
        Parameterized::fixed(Component::Adapter(Arc::new(graph_state_to_counter()))),
    )
}

pub(crate) fn graph_state_to_graph_entry() -> CatalogEntry {
    CatalogEntry::new(
        keys::GRAPH_STATE_TO_GRAPH,
        ComponentKind::Adapter,
        "Graph state to graph",
        "Strips search progress so the graph can be searched again",
        Parameterized::fixed(Component::Adapter(Arc::new(graph_state_to_graph()))),
    )
}

inventory::submit!(CatalogFn(graph_state_to_counter_entry));
inventory::submit!(CatalogFn(graph_state_to_graph_entry));
