//! Composition graph solver
//!
//! Evaluates a [`CompositionGraph`] in deterministic topological order and
//! reports per-node inputs, outputs and typed errors. Evaluation tolerates
//! partial failure: a broken edge or failing adapter only blocks the nodes
//! that depend on it.
//!
//! Problem and algorithm values are supplied by the caller through
//! [`SolverInputs`]; the solver never runs an algorithm. A typical host
//! resolves once to obtain the algorithm's input, executes a scene, then
//! resolves again with the scene's current state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::chain::try_compose;
use crate::component::{Adapter, Component};
use crate::error::{ChainError, ComponentError};
use crate::graph::{CompositionGraph, Connection, Slot};
use crate::state_type::StateType;
use crate::validation::{analyze, ConfigurationError, GraphAnalysis};

/// Externally supplied node values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverInputs {
    /// Output of the problem node
    pub problem_state: Option<Value>,
    /// Output of the algorithm node (its current scene state)
    pub algorithm_state: Option<Value>,
}

impl SolverInputs {
    pub fn new(problem_state: Value) -> Self {
        Self {
            problem_state: Some(problem_state),
            algorithm_state: None,
        }
    }

    /// Inputs built from the graph's problem node initial state
    pub fn initial(graph: &CompositionGraph) -> Self {
        Self {
            problem_state: graph
                .nodes
                .values()
                .find_map(Component::as_problem)
                .map(|p| p.initial_state()),
            algorithm_state: None,
        }
    }

    pub fn with_algorithm_state(mut self, state: Value) -> Self {
        self.algorithm_state = Some(state);
        self
    }
}

/// Why a node input slot could not be filled
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// A required slot has no connection
    Missing,
    /// The upstream node produced no value
    UpstreamFailed { upstream: String },
    /// The transported value does not have the required fields
    ///
    /// `broken_chain` is set when the edge's adapter chain does not compose.
    TypeIncompatible {
        upstream: String,
        missing: Vec<String>,
        broken_chain: Option<ChainError>,
    },
    /// An adapter in the edge's chain failed at runtime
    ChainFailed { upstream: String, cause: String },
    /// The slot is blocked by a configuration error
    Configuration(ConfigurationError),
}

impl InputError {
    fn incompatible(upstream: &str, missing: Vec<String>) -> Self {
        Self::TypeIncompatible {
            upstream: upstream.to_string(),
            missing,
            broken_chain: None,
        }
    }
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "Required input is not connected"),
            Self::UpstreamFailed { upstream } => {
                write!(f, "Upstream node '{}' produced no value", upstream)
            }
            Self::TypeIncompatible {
                upstream,
                missing,
                broken_chain: Some(chain),
            } => write!(
                f,
                "Value from '{}' is incompatible (missing {:?}): {}",
                upstream, missing, chain
            ),
            Self::TypeIncompatible {
                upstream, missing, ..
            } => write!(
                f,
                "Value from '{}' is missing required fields {:?}",
                upstream, missing
            ),
            Self::ChainFailed { upstream, cause } => {
                write!(f, "Adapter chain from '{}' failed: {}", upstream, cause)
            }
            Self::Configuration(e) => write!(f, "{}", e),
        }
    }
}

/// Why a node has no output
#[derive(Debug, Clone, PartialEq)]
pub enum NodeError {
    /// The node itself is misconfigured
    Configuration(ConfigurationError),
    /// The node's transform failed
    Evaluation(String),
    /// No external value was supplied for a problem or algorithm node
    Unavailable,
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "{}", e),
            Self::Evaluation(cause) => write!(f, "Evaluation failed: {}", cause),
            Self::Unavailable => write!(f, "No value supplied"),
        }
    }
}

/// Result of resolving a graph
///
/// An entry in any error map means "skip rendering this node", never that
/// resolution was aborted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Assembled input value per node
    pub inputs: BTreeMap<String, Value>,
    /// Output value per node
    pub outputs: BTreeMap<String, Value>,
    /// Per node, per slot input errors
    pub input_errors: BTreeMap<String, BTreeMap<Slot, InputError>>,
    /// Per node evaluation and configuration errors
    pub node_errors: BTreeMap<String, NodeError>,
    /// Configuration errors not scoped to a single slot
    pub graph_errors: Vec<ConfigurationError>,
}

impl Resolution {
    pub fn input(&self, alias: &str) -> Option<&Value> {
        self.inputs.get(alias)
    }

    pub fn output(&self, alias: &str) -> Option<&Value> {
        self.outputs.get(alias)
    }

    /// Whether a node resolved without any input or node error
    pub fn is_clean(&self, alias: &str) -> bool {
        !self.input_errors.contains_key(alias) && !self.node_errors.contains_key(alias)
    }

    /// Total number of recorded errors
    pub fn error_count(&self) -> usize {
        self.input_errors.values().map(BTreeMap::len).sum::<usize>()
            + self.node_errors.len()
            + self.graph_errors.len()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Resolve every node of a graph
pub fn resolve(graph: &CompositionGraph, inputs: &SolverInputs) -> Resolution {
    let analysis = analyze(graph);
    let mut resolution = Resolution {
        graph_errors: analysis.graph_errors.clone(),
        ..Resolution::default()
    };

    for node in &analysis.cyclic {
        resolution.node_errors.insert(
            node.clone(),
            NodeError::Configuration(ConfigurationError::Cycle { node: node.clone() }),
        );
    }

    for alias in &analysis.order {
        let Some(component) = graph.nodes.get(alias) else {
            continue;
        };

        if let Some(accepts) = component.accepts() {
            match assemble(graph, &analysis, &resolution, alias, accepts) {
                Ok(value) => {
                    resolution.inputs.insert(alias.clone(), value);
                }
                Err(errors) => {
                    log::warn!("Node '{}' has {} input errors", alias, errors.len());
                    resolution.input_errors.insert(alias.clone(), errors);
                }
            }
        }

        match evaluate(component, resolution.inputs.get(alias), inputs) {
            Ok(Some(value)) => {
                log::debug!("Node '{}' produced output", alias);
                resolution.outputs.insert(alias.clone(), value);
            }
            Ok(None) => {}
            Err(error) => {
                log::warn!("Node '{}' failed: {}", alias, error);
                resolution.node_errors.insert(alias.clone(), error);
            }
        }
    }

    log::debug!(
        "Resolved {} nodes with {} errors",
        graph.nodes.len(),
        resolution.error_count()
    );
    resolution
}

/// Compute a node's output from its assembled input
fn evaluate(
    component: &Component,
    input: Option<&Value>,
    inputs: &SolverInputs,
) -> Result<Option<Value>, NodeError> {
    match component {
        Component::Problem(_) => inputs
            .problem_state
            .clone()
            .map(Some)
            .ok_or(NodeError::Unavailable),
        Component::Algorithm(_) => inputs
            .algorithm_state
            .clone()
            .map(Some)
            .ok_or(NodeError::Unavailable),
        Component::Adapter(adapter) => match input {
            Some(value) => adapter
                .transform(value)
                .map(Some)
                .map_err(|e| NodeError::Evaluation(e.to_string())),
            None => Ok(None),
        },
        Component::Visualizer(_) => Ok(None),
    }
}

/// Fill a node's input slot by slot
fn assemble(
    graph: &CompositionGraph,
    analysis: &GraphAnalysis,
    resolution: &Resolution,
    alias: &str,
    accepts: &StateType,
) -> Result<Value, BTreeMap<Slot, InputError>> {
    let mut errors: BTreeMap<Slot, InputError> = analysis
        .slot_errors
        .get(alias)
        .map(|slots| {
            slots
                .iter()
                .map(|(slot, e)| (slot.clone(), InputError::Configuration(e.clone())))
                .collect()
        })
        .unwrap_or_default();

    let empty = BTreeMap::new();
    let writers = analysis.writers.get(alias).unwrap_or(&empty);

    let mut whole = None;
    let mut fields = Map::new();
    for (slot, &index) in writers {
        let connection = &graph.connections[index];
        let required = slot.is_whole().then_some(accepts);
        match transport(graph, resolution, connection, required) {
            Ok(value) => match slot {
                Slot::Whole => whole = Some(value),
                Slot::Field(name) => {
                    fields.insert(name.clone(), value);
                }
            },
            Err(e) => {
                errors.insert(slot.clone(), e);
            }
        }
    }

    let value = if writers.contains_key(&Slot::Whole) {
        whole
    } else if writers.is_empty() && errors.is_empty() {
        if accepts.field_names().next().is_some() {
            errors.insert(Slot::Whole, InputError::Missing);
        }
        Some(Value::Object(fields))
    } else {
        for name in accepts.field_names() {
            let slot = Slot::field(name);
            if !writers.contains_key(&slot) && !errors.contains_key(&slot) {
                errors.insert(slot, InputError::Missing);
            }
        }
        Some(Value::Object(fields))
    };

    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(errors),
    }
}

/// Carry a value along one connection, applying its adapter chain
///
/// `required` is the downstream's accepted type for whole-value slots.
/// Static checks run before any transform is invoked.
fn transport(
    graph: &CompositionGraph,
    resolution: &Resolution,
    connection: &Connection,
    required: Option<&StateType>,
) -> Result<Value, InputError> {
    let upstream = connection.from_node.as_str();
    let produced = graph.node(upstream).and_then(Component::produces);

    let chain = if connection.adapters.is_empty() {
        None
    } else {
        let chain = try_compose(connection.adapters.clone()).map_err(|e| broken_chain(upstream, e))?;
        if let Some(produced) = produced {
            let missing = chain.accepts().missing_fields(produced);
            if !missing.is_empty() {
                log::warn!("Chain '{}' cannot accept output of '{}'", chain.name(), upstream);
                return Err(InputError::incompatible(upstream, missing));
            }
        }
        Some(chain)
    };

    if let Some(required) = required {
        let delivered = chain.as_ref().map(|c| c.outputs()).or(produced);
        if let Some(delivered) = delivered {
            let missing = required.missing_fields(delivered);
            if !missing.is_empty() {
                log::warn!("Edge from '{}' to '{}' is type incompatible", upstream, connection.to_node);
                return Err(InputError::incompatible(upstream, missing));
            }
        }
    }

    let source = resolution
        .outputs
        .get(upstream)
        .ok_or_else(|| InputError::UpstreamFailed {
            upstream: upstream.to_string(),
        })?;

    let mut value = match &connection.from_slot {
        Slot::Whole => source.clone(),
        Slot::Field(name) => source
            .get(name)
            .cloned()
            .ok_or_else(|| InputError::incompatible(upstream, vec![name.clone()]))?,
    };

    if let Some(chain) = &chain {
        let missing = chain.accepts().missing_in_value(&value);
        if !missing.is_empty() {
            return Err(InputError::incompatible(upstream, missing));
        }
        value = chain
            .transform(&value)
            .map_err(|e| InputError::ChainFailed {
                upstream: upstream.to_string(),
                cause: e.to_string(),
            })?;
    }

    if let Some(required) = required {
        let missing = required.missing_in_value(&value);
        if !missing.is_empty() {
            return Err(InputError::incompatible(upstream, missing));
        }
    }

    Ok(value)
}

fn broken_chain(upstream: &str, error: ChainError) -> InputError {
    log::warn!("Adapter chain from '{}' does not compose: {}", upstream, error);
    let missing = match &error {
        ChainError::NotComposable { missing, .. } => missing.clone(),
        ChainError::Empty => Vec::new(),
    };
    InputError::TypeIncompatible {
        upstream: upstream.to_string(),
        missing,
        broken_chain: Some(error),
    }
}

/// Render every clean visualizer node from its resolved input
pub fn render_visualizers(
    graph: &CompositionGraph,
    resolution: &Resolution,
) -> BTreeMap<String, Result<String, ComponentError>> {
    graph
        .nodes
        .iter()
        .filter_map(|(alias, component)| {
            let visualizer = component.as_visualizer()?;
            let input = resolution.input(alias)?;
            Some((alias.clone(), visualizer.render(input)))
        })
        .collect()
}

/// Statistics about the solver cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resolutions served from the cache
    pub hits: u64,
    /// Resolutions computed
    pub misses: u64,
    /// Whether a resolution is currently held
    pub cached: bool,
}

/// Memoizes the most recent resolution
///
/// Keyed on the structural identity of the graph (component instances and
/// connections) and the supplied state values. The cached graph is kept
/// alive so no instance address can be reused while it is compared against.
#[derive(Default)]
pub struct SolverCache {
    last: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

struct CacheEntry {
    graph: CompositionGraph,
    inputs: SolverInputs,
    resolution: Arc<Resolution>,
}

impl SolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve, reusing the previous result when nothing changed
    pub fn resolve(&mut self, graph: &CompositionGraph, inputs: &SolverInputs) -> Arc<Resolution> {
        if let Some(entry) = &self.last {
            if entry.inputs == *inputs && same_structure(&entry.graph, graph) {
                self.hits += 1;
                return entry.resolution.clone();
            }
        }

        self.misses += 1;
        let resolution = Arc::new(resolve(graph, inputs));
        self.last = Some(CacheEntry {
            graph: graph.clone(),
            inputs: inputs.clone(),
            resolution: resolution.clone(),
        });
        resolution
    }

    /// Drop the cached resolution
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            cached: self.last.is_some(),
        }
    }
}

/// Same aliases, same component instances, same connections and adapters
fn same_structure(a: &CompositionGraph, b: &CompositionGraph) -> bool {
    a.nodes.len() == b.nodes.len()
        && a.connections.len() == b.connections.len()
        && a
            .nodes
            .iter()
            .zip(&b.nodes)
            .all(|((alias_x, x), (alias_y, y))| alias_x == alias_y && x.identity() == y.identity())
        && a
            .connections
            .iter()
            .zip(&b.connections)
            .all(|(x, y)| same_connection(x, y))
}

fn same_connection(a: &Connection, b: &Connection) -> bool {
    a.from_node == b.from_node
        && a.from_slot == b.from_slot
        && a.to_node == b.to_node
        && a.to_slot == b.to_slot
        && a.adapters.len() == b.adapters.len()
        && a
            .adapters
            .iter()
            .zip(&b.adapters)
            .all(|(x, y)| Arc::ptr_eq(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CompositionBuilder;
    use crate::component::{FnAdapter, StaticProblem, Visualizer};
    use crate::executor::test_support::CountingAlgorithm;
    use crate::state_type::FieldType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items() -> StateType {
        StateType::new("items").with_field("items", FieldType::List)
    }

    fn count() -> StateType {
        StateType::new("count").with_field("count", FieldType::Number)
    }

    /// items -> count
    fn counter() -> FnAdapter {
        FnAdapter::new("count-items", items(), count(), |v| {
            let n = v["items"].as_array().map(Vec::len).unwrap_or(0);
            Ok(json!({ "count": n }))
        })
    }

    fn failing() -> FnAdapter {
        FnAdapter::new("failing", items(), count(), |_| {
            Err(ComponentError::failed("adapter exploded"))
        })
    }

    struct Summary(StateType);

    impl Visualizer for Summary {
        fn name(&self) -> &str {
            "summary"
        }

        fn accepts(&self) -> &StateType {
            &self.0
        }

        fn render(&self, state: &Value) -> Result<String, ComponentError> {
            Ok(format!("count={}", state["count"]))
        }
    }

    fn base() -> CompositionBuilder {
        CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": [1, 2]})))
            .algorithm("algorithm", CountingAlgorithm::terminating(3))
            .connect_whole("problem", "algorithm")
    }

    fn inputs(graph: &CompositionGraph) -> SolverInputs {
        SolverInputs::initial(graph).with_algorithm_state(json!({"items": [0, 1, 2]}))
    }

    #[test]
    fn test_linear_resolution() {
        let graph = base()
            .adapter("count", counter())
            .visualizer("view", Summary(count()))
            .connect_whole("algorithm", "count")
            .connect_whole("count", "view")
            .build();

        let resolution = resolve(&graph, &inputs(&graph));
        assert!(!resolution.has_errors(), "{:?}", resolution);
        assert_eq!(resolution.input("algorithm"), Some(&json!({"items": [1, 2]})));
        assert_eq!(resolution.output("count"), Some(&json!({"count": 3})));
        assert_eq!(resolution.input("view"), Some(&json!({"count": 3})));
        assert!(resolution.output("view").is_none());

        let renders = render_visualizers(&graph, &resolution);
        assert_eq!(renders["view"], Ok("count=3".to_string()));
    }

    #[test]
    fn test_partial_failure_isolated_to_branch() {
        let graph = base()
            .adapter("good", counter())
            .adapter("bad", failing())
            .visualizer("good-view", Summary(count()))
            .visualizer("bad-view", Summary(count()))
            .connect_whole("algorithm", "good")
            .connect_whole("algorithm", "bad")
            .connect_whole("good", "good-view")
            .connect_whole("bad", "bad-view")
            .build();

        let resolution = resolve(&graph, &inputs(&graph));

        assert_eq!(
            resolution.node_errors["bad"],
            NodeError::Evaluation("adapter exploded".into())
        );
        assert_eq!(
            resolution.input_errors["bad-view"][&Slot::Whole],
            InputError::UpstreamFailed {
                upstream: "bad".into()
            }
        );
        assert!(resolution.is_clean("good"));
        assert!(resolution.is_clean("good-view"));
        assert_eq!(resolution.input("good-view"), Some(&json!({"count": 3})));
    }

    #[test]
    fn test_missing_algorithm_state_is_unavailable() {
        let graph = base()
            .adapter("count", counter())
            .connect_whole("algorithm", "count")
            .build();

        let resolution = resolve(&graph, &SolverInputs::initial(&graph));
        assert_eq!(resolution.node_errors["algorithm"], NodeError::Unavailable);
        // The algorithm's own input still resolves
        assert_eq!(resolution.input("algorithm"), Some(&json!({"items": [1, 2]})));
        assert!(matches!(
            resolution.input_errors["count"][&Slot::Whole],
            InputError::UpstreamFailed { .. }
        ));
    }

    #[test]
    fn test_static_type_incompatibility() {
        let graph = base()
            .visualizer("view", Summary(count()))
            .connect_whole("algorithm", "view")
            .build();

        let resolution = resolve(&graph, &inputs(&graph));
        assert_eq!(
            resolution.input_errors["view"][&Slot::Whole],
            InputError::TypeIncompatible {
                upstream: "algorithm".into(),
                missing: vec!["count".into()],
                broken_chain: None,
            }
        );
    }

    #[test]
    fn test_runtime_value_checked_against_accepted_type() {
        let graph = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": [1]})))
            .algorithm("algorithm", CountingAlgorithm::terminating(3))
            .connect_whole("problem", "algorithm")
            .build();

        // The supplied value disagrees with the problem's declared type
        let resolution = resolve(&graph, &SolverInputs::new(json!({"other": 1})));
        assert_eq!(
            resolution.input_errors["algorithm"][&Slot::Whole],
            InputError::TypeIncompatible {
                upstream: "problem".into(),
                missing: vec!["items".into()],
                broken_chain: None,
            }
        );
    }

    #[test]
    fn test_uncomposable_chain_never_transforms() {
        let calls = Arc::new(AtomicUsize::new(0));
        let spy_calls = calls.clone();
        let spy: Arc<dyn Adapter> = Arc::new(FnAdapter::new("spy", items(), count(), move |_| {
            spy_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"count": 0}))
        }));
        // count -> items is not produced by spy's output
        let needs_items: Arc<dyn Adapter> = Arc::new(counter());

        let graph = base()
            .visualizer("view", Summary(count()))
            .connect_with_adapters("algorithm", ".", "view", ".", vec![spy, needs_items])
            .build();

        let resolution = resolve(&graph, &inputs(&graph));
        match &resolution.input_errors["view"][&Slot::Whole] {
            InputError::TypeIncompatible {
                missing,
                broken_chain: Some(ChainError::NotComposable { index, .. }),
                ..
            } => {
                assert_eq!(*index, 0);
                assert_eq!(missing, &vec!["items".to_string()]);
            }
            other => panic!("Expected broken chain, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_applied_on_edge() {
        let chain: Vec<Arc<dyn Adapter>> = vec![Arc::new(counter())];
        let graph = base()
            .visualizer("view", Summary(count()))
            .connect_with_adapters("algorithm", ".", "view", ".", chain)
            .build();

        let resolution = resolve(&graph, &inputs(&graph));
        assert_eq!(resolution.input("view"), Some(&json!({"count": 3})));
    }

    #[test]
    fn test_named_slots_assemble_object() {
        let graph = CompositionBuilder::new()
            .problem("problem", StaticProblem::new("p", json!({"items": [1], "extra": true})))
            .algorithm("algorithm", CountingAlgorithm::terminating(3))
            .connect("problem", "items", "algorithm", "items")
            .build();

        let resolution = resolve(&graph, &SolverInputs::initial(&graph));
        assert_eq!(resolution.input("algorithm"), Some(&json!({"items": [1]})));
    }

    #[test]
    fn test_unconnected_required_input() {
        let graph = base().visualizer("view", Summary(count())).build();
        let resolution = resolve(&graph, &inputs(&graph));
        assert_eq!(resolution.input_errors["view"][&Slot::Whole], InputError::Missing);
    }

    #[test]
    fn test_cycle_does_not_block_siblings() {
        let loop_a = FnAdapter::new("a", count(), count(), |v| Ok(v.clone()));
        let loop_b = FnAdapter::new("b", count(), count(), |v| Ok(v.clone()));
        let graph = base()
            .adapter("a", loop_a)
            .adapter("b", loop_b)
            .adapter("count", counter())
            .connect_whole("a", "b")
            .connect_whole("b", "a")
            .connect_whole("algorithm", "count")
            .build();

        let resolution = resolve(&graph, &inputs(&graph));
        assert!(matches!(
            resolution.node_errors["a"],
            NodeError::Configuration(ConfigurationError::Cycle { .. })
        ));
        assert!(resolution.node_errors.contains_key("b"));
        assert_eq!(resolution.output("count"), Some(&json!({"count": 3})));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let graph = base()
            .adapter("good", counter())
            .adapter("bad", failing())
            .connect_whole("algorithm", "good")
            .connect_whole("algorithm", "bad")
            .build();

        let first = resolve(&graph, &inputs(&graph));
        for _ in 0..5 {
            assert_eq!(resolve(&graph, &inputs(&graph)), first);
        }
    }

    #[test]
    fn test_cache_hits_on_unchanged_inputs() {
        let graph = base()
            .adapter("count", counter())
            .connect_whole("algorithm", "count")
            .build();
        let mut cache = SolverCache::new();

        let first = cache.resolve(&graph, &inputs(&graph));
        let second = cache.resolve(&graph, &inputs(&graph));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.cache_stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                cached: true
            }
        );

        let changed = SolverInputs::initial(&graph).with_algorithm_state(json!({"items": []}));
        let third = cache.resolve(&graph, &changed);
        assert_eq!(third.output("count"), Some(&json!({"count": 0})));
        assert_eq!(cache.cache_stats().misses, 2);

        cache.invalidate();
        assert!(!cache.cache_stats().cached);
    }

    #[test]
    fn test_cache_misses_on_rebuilt_graph() {
        fn scaled(factor: usize) -> FnAdapter {
            FnAdapter::new("scaled", items(), count(), move |v| {
                let n = v["items"].as_array().map(Vec::len).unwrap_or(0);
                Ok(json!({ "count": n * factor }))
            })
        }
        fn graph_with(factor: usize) -> CompositionGraph {
            base()
                .adapter("count", scaled(factor))
                .connect_whole("algorithm", "count")
                .build()
        }

        let mut cache = SolverCache::new();
        let graph = graph_with(2);
        let state = json!({"items": [1, 2, 3]});
        let first = cache.resolve(
            &graph,
            &SolverInputs::initial(&graph).with_algorithm_state(state.clone()),
        );
        assert_eq!(first.output("count"), Some(&json!({"count": 6})));
        drop(graph);

        // The rebuilt adapter must not be mistaken for the dropped one
        let graph = graph_with(10);
        let inputs = SolverInputs::initial(&graph).with_algorithm_state(state);
        let second = cache.resolve(&graph, &inputs);
        assert_eq!(second.output("count"), Some(&json!({"count": 30})));
        assert_eq!(*second, resolve(&graph, &inputs));
        assert_eq!(cache.cache_stats().misses, 2);
        assert_eq!(cache.cache_stats().hits, 0);
    }

    #[test]
    fn test_input_error_display() {
        let error = InputError::UpstreamFailed {
            upstream: "bad".into(),
        };
        assert_eq!(error.to_string(), "Upstream node 'bad' produced no value");
        assert_eq!(NodeError::Unavailable.to_string(), "No value supplied");
    }
}
