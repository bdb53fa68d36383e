//! Composition graph validation
//!
//! Checks node roles, connection endpoints, slot usage and cycles. Every
//! problem is collected (not just the first) and scoped to the node or slot
//! it affects, so the solver can keep evaluating unaffected branches.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::ComponentCatalog;
use crate::component::{Component, ComponentKind};
use crate::constants::aliases;
use crate::error::CatalogError;
use crate::graph::{BoxConfig, CompositionGraph, Slot};

/// A structural problem in a composition graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The node lies on a cycle
    Cycle { node: String },
    /// A connection references a node that does not exist
    UnknownNode { node: String, connection: usize },
    /// A whole-value slot is paired with a named slot
    MixedSlot { node: String, slot: Slot },
    /// More than one connection writes the same slot; all are ignored
    DuplicateWriter {
        node: String,
        slot: Slot,
        writers: Vec<String>,
    },
    /// The graph has no node of a required role
    MissingNode { role: ComponentKind },
    /// The graph has more than one node of a single-instance role
    DuplicateRole {
        role: ComponentKind,
        nodes: Vec<String>,
    },
    /// A visualizer is used as a connection source
    InvalidSource { node: String },
    /// A problem is used as a connection target
    InvalidTarget { node: String },
    /// An adapter chain is attached to a named-field connection
    ChainOnFieldSlot { node: String, slot: Slot },
    /// A box reference could not be resolved through the catalog
    Unresolved { node: String, cause: String },
}

impl ConfigurationError {
    /// The node this error is scoped to, if any
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::Cycle { node }
            | Self::UnknownNode { node, .. }
            | Self::MixedSlot { node, .. }
            | Self::DuplicateWriter { node, .. }
            | Self::InvalidSource { node }
            | Self::InvalidTarget { node }
            | Self::ChainOnFieldSlot { node, .. }
            | Self::Unresolved { node, .. } => Some(node),
            Self::MissingNode { .. } | Self::DuplicateRole { .. } => None,
        }
    }
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle { node } => write!(f, "Node '{}' is part of a cycle", node),
            Self::UnknownNode { node, connection } => {
                write!(f, "Connection {} references unknown node '{}'", connection, node)
            }
            Self::MixedSlot { node, slot } => write!(
                f,
                "Slot '{}' on node '{}' mixes whole-value and named-field connections",
                slot, node
            ),
            Self::DuplicateWriter {
                node,
                slot,
                writers,
            } => write!(
                f,
                "Slot '{}' on node '{}' has multiple writers: {}",
                slot,
                node,
                writers.join(", ")
            ),
            Self::MissingNode { role } => write!(f, "Graph has no {} node", role),
            Self::DuplicateRole { role, nodes } => {
                write!(f, "Graph has multiple {} nodes: {}", role, nodes.join(", "))
            }
            Self::InvalidSource { node } => {
                write!(f, "Visualizer '{}' cannot be a connection source", node)
            }
            Self::InvalidTarget { node } => {
                write!(f, "Problem '{}' cannot be a connection target", node)
            }
            Self::ChainOnFieldSlot { node, slot } => write!(
                f,
                "Adapter chains are only allowed on whole-value slots (slot '{}' on node '{}')",
                slot, node
            ),
            Self::Unresolved { node, cause } => {
                write!(f, "Node '{}' could not be resolved: {}", node, cause)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Structural facts the solver evaluates against
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphAnalysis {
    /// Acyclic nodes in topological order, ties broken by alias
    pub order: Vec<String>,
    /// Nodes lying on a cycle
    pub cyclic: BTreeSet<String>,
    /// Accepted writer (connection index) per target node and slot
    pub writers: BTreeMap<String, BTreeMap<Slot, usize>>,
    /// Configuration errors scoped to a target slot
    pub slot_errors: BTreeMap<String, BTreeMap<Slot, ConfigurationError>>,
    /// Errors not tied to a single slot
    pub graph_errors: Vec<ConfigurationError>,
}

impl GraphAnalysis {
    /// Every error, graph-level first, then cycles, then slots
    pub fn errors(&self) -> Vec<ConfigurationError> {
        let mut errors = self.graph_errors.clone();
        errors.extend(self.cyclic.iter().map(|node| ConfigurationError::Cycle {
            node: node.clone(),
        }));
        for slots in self.slot_errors.values() {
            errors.extend(slots.values().cloned());
        }
        errors
    }

    fn slot_error(&mut self, node: &str, slot: &Slot, error: ConfigurationError) {
        self.slot_errors
            .entry(node.to_string())
            .or_default()
            .insert(slot.clone(), error);
    }
}

/// Validate a composition graph
///
/// Returns all configuration errors found (not just the first).
pub fn validate_graph(graph: &CompositionGraph) -> Vec<ConfigurationError> {
    analyze(graph).errors()
}

/// Validate a box configuration against a catalog without evaluating it
///
/// Unresolvable references are reported per alias; once every reference
/// resolves, the resulting graph is validated structurally.
pub fn validate_box(config: &BoxConfig, catalog: &ComponentCatalog) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();

    let mut seen = BTreeSet::new();
    for alias in config.aliases() {
        if !seen.insert(alias) {
            errors.push(ConfigurationError::Unresolved {
                node: alias.to_string(),
                cause: format!("Duplicate node alias '{}'", alias),
            });
        }
    }

    let mut check = |alias: &str, result: Result<(), CatalogError>| {
        if let Err(e) = result {
            errors.push(ConfigurationError::Unresolved {
                node: alias.to_string(),
                cause: e.to_string(),
            });
        }
    };

    check(aliases::PROBLEM, catalog.resolve_problem(&config.problem).map(drop));
    check(aliases::ALGORITHM, catalog.resolve_algorithm(&config.algorithm).map(drop));
    for (alias, reference) in &config.adapters {
        check(alias, catalog.resolve_adapter(reference).map(drop));
    }
    for (alias, reference) in &config.visualizers {
        check(alias, catalog.resolve_visualizer(reference).map(drop));
    }
    for connection in &config.connections {
        for reference in &connection.adapters {
            check(&connection.to_node, catalog.resolve_adapter(reference).map(drop));
        }
    }

    if !errors.is_empty() {
        return errors;
    }

    match config.resolve(catalog) {
        Ok(graph) => validate_graph(&graph),
        Err(e) => vec![ConfigurationError::Unresolved {
            node: String::new(),
            cause: e.to_string(),
        }],
    }
}

/// Analyze roles, connections and topology of a graph
pub(crate) fn analyze(graph: &CompositionGraph) -> GraphAnalysis {
    let mut analysis = GraphAnalysis::default();

    validate_roles(graph, &mut analysis);

    // Connections whose endpoints both exist
    let mut known = Vec::new();
    for (index, connection) in graph.connections.iter().enumerate() {
        let mut valid = true;
        for node in [&connection.from_node, &connection.to_node] {
            if !graph.nodes.contains_key(node) {
                analysis.graph_errors.push(ConfigurationError::UnknownNode {
                    node: node.clone(),
                    connection: index,
                });
                valid = false;
            }
        }
        if valid {
            known.push(index);
        }
    }

    detect_cycles(graph, &known, &mut analysis);
    select_writers(graph, &known, &mut analysis);

    if !analysis.graph_errors.is_empty() || !analysis.cyclic.is_empty() {
        log::debug!(
            "Graph analysis: {} graph errors, {} cyclic nodes",
            analysis.graph_errors.len(),
            analysis.cyclic.len()
        );
    }
    analysis
}

/// Exactly one problem and one algorithm
fn validate_roles(graph: &CompositionGraph, analysis: &mut GraphAnalysis) {
    for role in [ComponentKind::Problem, ComponentKind::Algorithm] {
        let nodes: Vec<String> = graph
            .nodes
            .iter()
            .filter(|(_, component)| component.kind() == role)
            .map(|(alias, _)| alias.clone())
            .collect();
        match nodes.len() {
            0 => analysis
                .graph_errors
                .push(ConfigurationError::MissingNode { role }),
            1 => {}
            _ => analysis
                .graph_errors
                .push(ConfigurationError::DuplicateRole { role, nodes }),
        }
    }
}

/// Detect cycles using Kahn's algorithm, then order the acyclic remainder
fn detect_cycles(graph: &CompositionGraph, known: &[usize], analysis: &mut GraphAnalysis) {
    let edges: Vec<(&str, &str)> = known
        .iter()
        .map(|&i| {
            let c = &graph.connections[i];
            (c.from_node.as_str(), c.to_node.as_str())
        })
        .collect();
    let all: BTreeSet<&str> = graph.nodes.keys().map(String::as_str).collect();

    let (order, remaining) = kahn(&all, &edges);
    if remaining.is_empty() {
        analysis.order = order;
        return;
    }

    // Nodes left over are on a cycle or downstream of one
    for &node in &remaining {
        if reaches_itself(node, &remaining, &edges) {
            analysis.cyclic.insert(node.to_string());
        }
    }
    let acyclic: BTreeSet<&str> = all
        .into_iter()
        .filter(|n| !analysis.cyclic.contains(*n))
        .collect();
    let (order, _) = kahn(&acyclic, &edges);
    analysis.order = order;
}

/// Topological order over `nodes` using only edges between them
///
/// Returns the ordered nodes and the set that never reached in-degree zero.
fn kahn<'a>(nodes: &BTreeSet<&'a str>, edges: &[(&'a str, &'a str)]) -> (Vec<String>, BTreeSet<&'a str>) {
    let mut in_degree: BTreeMap<&str, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    let mut successors: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for &(from, to) in edges {
        if nodes.contains(from) && nodes.contains(to) {
            *in_degree.entry(to).or_insert(0) += 1;
            successors.entry(from).or_default().push(to);
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&n, _)| n)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());
        for &next in successors.get(node).map(Vec::as_slice).unwrap_or_default() {
            if let Some(deg) = in_degree.get_mut(next) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    let remaining = in_degree
        .into_iter()
        .filter(|(_, deg)| *deg > 0)
        .map(|(n, _)| n)
        .collect();
    (order, remaining)
}

fn reaches_itself(start: &str, within: &BTreeSet<&str>, edges: &[(&str, &str)]) -> bool {
    let mut stack: Vec<&str> = vec![start];
    let mut visited = BTreeSet::new();
    while let Some(node) = stack.pop() {
        for &(from, to) in edges {
            if from != node || !within.contains(to) {
                continue;
            }
            if to == start {
                return true;
            }
            if visited.insert(to) {
                stack.push(to);
            }
        }
    }
    false
}

/// Pick at most one writer per target slot and reject malformed connections
fn select_writers(graph: &CompositionGraph, known: &[usize], analysis: &mut GraphAnalysis) {
    let mut by_target: BTreeMap<(&str, &Slot), Vec<usize>> = BTreeMap::new();
    for &index in known {
        let c = &graph.connections[index];
        by_target
            .entry((c.to_node.as_str(), &c.to_slot))
            .or_default()
            .push(index);
    }

    let mut invalid_targets = BTreeSet::new();
    for ((node, slot), indices) in by_target {
        if matches!(graph.nodes.get(node), Some(Component::Problem(_))) {
            invalid_targets.insert(node);
            continue;
        }

        if indices.len() > 1 {
            let writers = indices
                .iter()
                .map(|&i| graph.connections[i].from_node.clone())
                .collect();
            log::warn!("Slot '{}' on '{}' has {} writers; ignoring all", slot, node, indices.len());
            analysis.slot_error(
                node,
                slot,
                ConfigurationError::DuplicateWriter {
                    node: node.to_string(),
                    slot: slot.clone(),
                    writers,
                },
            );
            continue;
        }

        let index = indices[0];
        let connection = &graph.connections[index];
        let error = if matches!(
            graph.nodes.get(&connection.from_node),
            Some(Component::Visualizer(_))
        ) {
            Some(ConfigurationError::InvalidSource {
                node: connection.from_node.clone(),
            })
        } else if connection.from_slot.is_whole() != connection.to_slot.is_whole() {
            Some(ConfigurationError::MixedSlot {
                node: node.to_string(),
                slot: slot.clone(),
            })
        } else if !connection.adapters.is_empty() && !slot.is_whole() {
            Some(ConfigurationError::ChainOnFieldSlot {
                node: node.to_string(),
                slot: slot.clone(),
            })
        } else {
            None
        };

        match error {
            Some(error) => analysis.slot_error(node, slot, error),
            None => {
                analysis
                    .writers
                    .entry(node.to_string())
                    .or_default()
                    .insert(slot.clone(), index);
            }
        }
    }

    for node in invalid_targets {
        analysis.graph_errors.push(ConfigurationError::InvalidTarget {
            node: node.to_string(),
        });
    }

    // A target fed by a whole value must not also take named fields
    let mixed: Vec<String> = analysis
        .writers
        .iter()
        .filter(|(_, slots)| slots.contains_key(&Slot::Whole) && slots.len() > 1)
        .map(|(node, _)| node.clone())
        .collect();
    for node in mixed {
        if let Some(slots) = analysis.writers.get_mut(&node) {
            slots.remove(&Slot::Whole);
        }
        analysis.slot_error(
            &node,
            &Slot::Whole,
            ConfigurationError::MixedSlot {
                node: node.clone(),
                slot: Slot::Whole,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CompositionBuilder;
    use crate::component::{FnAdapter, StaticProblem};
    use crate::executor::test_support::CountingAlgorithm;
    use crate::state_type::StateType;
    use serde_json::json;
    use std::sync::Arc;

    fn passthrough(name: &str) -> FnAdapter {
        FnAdapter::new(name, StateType::new("any"), StateType::new("any"), |v| {
            Ok(v.clone())
        })
    }

    struct TextVisualizer(StateType);

    impl crate::component::Visualizer for TextVisualizer {
        fn name(&self) -> &str {
            "text"
        }

        fn accepts(&self) -> &StateType {
            &self.0
        }

        fn render(&self, state: &serde_json::Value) -> Result<String, crate::error::ComponentError> {
            Ok(state.to_string())
        }
    }

    fn base() -> CompositionBuilder {
        CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": []})))
            .algorithm("algorithm", CountingAlgorithm::terminating(2))
            .connect_whole("problem", "algorithm")
    }

    #[test]
    fn test_valid_graph() {
        let errors = validate_graph(&base().build());
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_missing_and_duplicate_roles() {
        let graph = CompositionBuilder::new()
            .problem("p1", StaticProblem::new("p", json!({})))
            .problem("p2", StaticProblem::new("p", json!({})))
            .build();
        let errors = validate_graph(&graph);
        assert!(errors.contains(&ConfigurationError::MissingNode {
            role: ComponentKind::Algorithm
        }));
        assert!(errors.contains(&ConfigurationError::DuplicateRole {
            role: ComponentKind::Problem,
            nodes: vec!["p1".into(), "p2".into()],
        }));
    }

    #[test]
    fn test_detect_cycle_marks_only_cycle_members() {
        let graph = base()
            .adapter("a", passthrough("a"))
            .adapter("b", passthrough("b"))
            .adapter("c", passthrough("c"))
            .connect_whole("a", "b")
            .connect_whole("b", "a")
            .connect_whole("b", "c")
            .build();

        let analysis = analyze(&graph);
        let cyclic: Vec<_> = analysis.cyclic.iter().map(String::as_str).collect();
        assert_eq!(cyclic, vec!["a", "b"]);
        // Downstream of the cycle but not on it: still ordered
        assert!(analysis.order.contains(&"c".to_string()));
        assert_eq!(analysis.order[0], "c");
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let graph = base()
            .adapter("a", passthrough("a"))
            .connect_whole("a", "a")
            .build();
        assert!(validate_graph(&graph).contains(&ConfigurationError::Cycle { node: "a".into() }));
    }

    #[test]
    fn test_topological_order_ties_broken_by_alias() {
        let graph = base()
            .adapter("z", passthrough("z"))
            .adapter("m", passthrough("m"))
            .connect_whole("problem", "z")
            .connect_whole("problem", "m")
            .build();
        let order = analyze(&graph).order;
        assert_eq!(order, vec!["problem", "algorithm", "m", "z"]);
    }

    #[test]
    fn test_unknown_node() {
        let graph = base().connect_whole("ghost", "algorithm").build();
        assert!(validate_graph(&graph).contains(&ConfigurationError::UnknownNode {
            node: "ghost".into(),
            connection: 1,
        }));
    }

    #[test]
    fn test_duplicate_writer_blocks_all_writers() {
        let graph = base()
            .adapter("a", passthrough("a"))
            .connect_whole("a", "algorithm")
            .build();
        let analysis = analyze(&graph);

        assert!(analysis.writers.get("algorithm").is_none());
        assert_eq!(
            analysis.slot_errors["algorithm"][&Slot::Whole],
            ConfigurationError::DuplicateWriter {
                node: "algorithm".into(),
                slot: Slot::Whole,
                writers: vec!["problem".into(), "a".into()],
            }
        );
    }

    #[test]
    fn test_mixed_slot_connection() {
        let graph = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": []})))
            .algorithm("algorithm", CountingAlgorithm::terminating(2))
            .connect("problem", ".", "algorithm", "items")
            .build();
        assert!(validate_graph(&graph).contains(&ConfigurationError::MixedSlot {
            node: "algorithm".into(),
            slot: Slot::field("items"),
        }));
    }

    #[test]
    fn test_whole_and_named_on_same_target() {
        let graph = base().connect("problem", "items", "algorithm", "items").build();
        let analysis = analyze(&graph);

        assert_eq!(
            analysis.slot_errors["algorithm"][&Slot::Whole],
            ConfigurationError::MixedSlot {
                node: "algorithm".into(),
                slot: Slot::Whole,
            }
        );
        assert!(analysis.writers["algorithm"].contains_key(&Slot::field("items")));
    }

    #[test]
    fn test_chain_on_field_slot_and_invalid_endpoints() {
        let identity: Arc<dyn crate::component::Adapter> = Arc::new(passthrough("id"));
        let graph = base()
            .visualizer("v", TextVisualizer(StateType::new("text")))
            .connect_with_adapters("problem", "items", "v", "items", vec![identity])
            .connect_whole("v", "problem")
            .build();

        let errors = validate_graph(&graph);
        assert!(errors.contains(&ConfigurationError::ChainOnFieldSlot {
            node: "v".into(),
            slot: Slot::field("items"),
        }));
        assert!(errors.contains(&ConfigurationError::InvalidTarget {
            node: "problem".into()
        }));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let graph = CompositionBuilder::new()
            .adapter("a", passthrough("a"))
            .connect_whole("a", "a")
            .connect_whole("a", "nowhere")
            .build();
        // Missing problem, missing algorithm, unknown node, cycle
        assert_eq!(validate_graph(&graph).len(), 4);
    }

    #[test]
    fn test_error_display_and_scope() {
        let error = ConfigurationError::DuplicateWriter {
            node: "alg".into(),
            slot: Slot::Whole,
            writers: vec!["a".into(), "b".into()],
        };
        assert_eq!(error.node(), Some("alg"));
        assert_eq!(
            error.to_string(),
            "Slot '.' on node 'alg' has multiple writers: a, b"
        );
        assert_eq!(
            ConfigurationError::MissingNode {
                role: ComponentKind::Problem
            }
            .node(),
            None
        );
    }
}
