//! Composition graph types
//!
//! A [`CompositionGraph`] holds resolved component instances keyed by alias
//! and the named-slot connections between them. A [`BoxConfig`] is its
//! serializable form: catalog references instead of instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{ComponentCatalog, ComponentRef};
use crate::component::{Adapter, Component};
use crate::constants::{aliases, slots};
use crate::error::CatalogError;

/// Endpoint of a connection on one side of a node
///
/// `Whole` passes the entire state value; `Field` addresses one named field.
/// Serialized as `"."` or the field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Slot {
    Whole,
    Field(String),
}

impl Slot {
    /// A named-field slot
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn is_whole(&self) -> bool {
        matches!(self, Self::Whole)
    }
}

impl From<String> for Slot {
    fn from(value: String) -> Self {
        if value == slots::WHOLE {
            Self::Whole
        } else {
            Self::Field(value)
        }
    }
}

impl From<&str> for Slot {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Whole => slots::WHOLE.to_string(),
            Slot::Field(name) => name,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whole => f.write_str(slots::WHOLE),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// A resolved connection between two node slots
#[derive(Clone)]
pub struct Connection {
    pub from_node: String,
    pub from_slot: Slot,
    pub to_node: String,
    pub to_slot: Slot,
    /// Adapters applied in order to the transported value
    pub adapters: Vec<Arc<dyn Adapter>>,
}

impl Connection {
    pub fn new(
        from_node: impl Into<String>,
        from_slot: impl Into<Slot>,
        to_node: impl Into<String>,
        to_slot: impl Into<Slot>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_slot: from_slot.into(),
            to_node: to_node.into(),
            to_slot: to_slot.into(),
            adapters: Vec::new(),
        }
    }

    /// Whole-value connection between two nodes
    pub fn whole(from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        Self::new(from_node, Slot::Whole, to_node, Slot::Whole)
    }

    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn Adapter>>) -> Self {
        self.adapters = adapters;
        self
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let adapters: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("Connection")
            .field("from", &format!("{}.{}", self.from_node, self.from_slot))
            .field("to", &format!("{}.{}", self.to_node, self.to_slot))
            .field("adapters", &adapters)
            .finish()
    }
}

/// A graph of typed component nodes joined by slot connections
#[derive(Debug, Clone, Default)]
pub struct CompositionGraph {
    /// Nodes keyed by alias
    pub nodes: BTreeMap<String, Component>,
    pub connections: Vec<Connection>,
}

impl CompositionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node by alias
    pub fn node(&self, alias: &str) -> Option<&Component> {
        self.nodes.get(alias)
    }

    /// Connections feeding a node
    pub fn incoming<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to_node == alias)
    }

    /// Connections leaving a node
    pub fn outgoing<'a>(&'a self, alias: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from_node == alias)
    }
}

/// Serializable form of a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub from_node: String,
    pub from_slot: Slot,
    pub to_node: String,
    pub to_slot: Slot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adapters: Vec<ComponentRef>,
}

/// Serializable box configuration
///
/// The problem and algorithm are placed under the reserved aliases
/// `problem` and `algorithm`; adapters and visualizers use their map keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxConfig {
    pub problem: ComponentRef,
    pub algorithm: ComponentRef,
    #[serde(default)]
    pub adapters: BTreeMap<String, ComponentRef>,
    #[serde(default)]
    pub visualizers: BTreeMap<String, ComponentRef>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl BoxConfig {
    /// A box with a problem wired straight into an algorithm
    pub fn direct(problem: ComponentRef, algorithm: ComponentRef) -> Self {
        Self {
            problem,
            algorithm,
            adapters: BTreeMap::new(),
            visualizers: BTreeMap::new(),
            connections: vec![ConnectionConfig {
                from_node: aliases::PROBLEM.to_string(),
                from_slot: Slot::Whole,
                to_node: aliases::ALGORITHM.to_string(),
                to_slot: Slot::Whole,
                adapters: Vec::new(),
            }],
        }
    }

    /// Every alias the box declares, in declaration order
    pub fn aliases(&self) -> Vec<&str> {
        let mut all = vec![aliases::PROBLEM, aliases::ALGORITHM];
        all.extend(self.adapters.keys().map(String::as_str));
        all.extend(self.visualizers.keys().map(String::as_str));
        all
    }

    /// Instantiate every referenced component through the catalog
    pub fn resolve(&self, catalog: &ComponentCatalog) -> Result<CompositionGraph, CatalogError> {
        let mut graph = CompositionGraph::new();

        graph.nodes.insert(
            aliases::PROBLEM.to_string(),
            Component::Problem(catalog.resolve_problem(&self.problem)?),
        );
        graph.nodes.insert(
            aliases::ALGORITHM.to_string(),
            Component::Algorithm(catalog.resolve_algorithm(&self.algorithm)?),
        );

        for (alias, reference) in &self.adapters {
            let adapter = catalog.resolve_adapter(reference)?;
            insert_unique(&mut graph, alias, Component::Adapter(adapter))?;
        }
        for (alias, reference) in &self.visualizers {
            let visualizer = catalog.resolve_visualizer(reference)?;
            insert_unique(&mut graph, alias, Component::Visualizer(visualizer))?;
        }

        for config in &self.connections {
            let adapters = config
                .adapters
                .iter()
                .map(|reference| catalog.resolve_adapter(reference))
                .collect::<Result<Vec<_>, _>>()?;
            graph.connections.push(
                Connection::new(
                    config.from_node.clone(),
                    config.from_slot.clone(),
                    config.to_node.clone(),
                    config.to_slot.clone(),
                )
                .with_adapters(adapters),
            );
        }

        log::debug!(
            "Resolved box with {} nodes and {} connections",
            graph.nodes.len(),
            graph.connections.len()
        );
        Ok(graph)
    }
}

fn insert_unique(
    graph: &mut CompositionGraph,
    alias: &str,
    component: Component,
) -> Result<(), CatalogError> {
    if graph.nodes.contains_key(alias) {
        return Err(CatalogError::DuplicateAlias(alias.to_string()));
    }
    graph.nodes.insert(alias.to_string(), component);
    Ok(())
}
