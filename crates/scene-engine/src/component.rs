//! Component model
//!
//! A scene is assembled from four kinds of typed components:
//!
//! - **Problem**: produces an initial state value
//! - **Algorithm**: a step-generating transducer from one state type to another
//! - **Adapter**: a pure state-to-state transform bridging incompatible shapes
//! - **Visualizer**: a sink that renders a state
//!
//! Components are shared as `Arc<dyn …>` trait objects and carried through
//! graphs by the [`Component`] enum.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ComponentError;
use crate::state_type::StateType;

/// What a step generator produced on one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// A pseudocode-aligned transition; the executor snapshots the working state
    Step { start_line: u32, end_line: u32 },
    /// A non-step marker value; never recorded in a trace
    Sentinel(bool),
    /// The generator has finished
    Complete,
}

impl Resume {
    /// A step covering a single pseudocode line
    pub fn line(line: u32) -> Self {
        Self::Step {
            start_line: line,
            end_line: line,
        }
    }

    /// A step covering a range of pseudocode lines
    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self::Step {
            start_line,
            end_line,
        }
    }
}

/// An algorithm run in progress
///
/// Implementations are explicit state machines: each call to `resume` moves
/// to the next transition, mutating one shared working state in place. The
/// executor clones `state()` whenever a `Resume::Step` is returned.
pub trait StepGenerator: Send {
    /// Advance to the next transition
    fn resume(&mut self) -> Result<Resume, ComponentError>;

    /// The live working state shared across steps
    fn state(&self) -> &Value;
}

/// Produces the initial state of a scene
pub trait Problem: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Shape of the produced state
    fn state_type(&self) -> &StateType;

    /// Build the initial state value
    fn initial_state(&self) -> Value;
}

/// A step-generating state transducer
pub trait Algorithm: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Shape of the input this algorithm requires
    fn accepts(&self) -> &StateType;

    /// Shape of the states this algorithm yields
    fn outputs(&self) -> &StateType;

    /// Begin a run over `input`
    fn start(&self, input: Value) -> Result<Box<dyn StepGenerator>, ComponentError>;
}

/// A pure transform between two state types
pub trait Adapter: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Shape of the input this adapter requires
    fn accepts(&self) -> &StateType;

    /// Shape of the value this adapter produces
    fn outputs(&self) -> &StateType;

    /// Transform an input value
    fn transform(&self, input: &Value) -> Result<Value, ComponentError>;
}

/// A state sink
pub trait Visualizer: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Shape of the state this visualizer requires
    fn accepts(&self) -> &StateType;

    /// Render a state to a plain-text summary
    fn render(&self, state: &Value) -> Result<String, ComponentError>;
}

/// Kind of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Problem,
    Algorithm,
    Adapter,
    Visualizer,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Problem => "problem",
            Self::Algorithm => "algorithm",
            Self::Adapter => "adapter",
            Self::Visualizer => "visualizer",
        };
        f.write_str(name)
    }
}

/// A resolved component instance
#[derive(Clone)]
pub enum Component {
    Problem(Arc<dyn Problem>),
    Algorithm(Arc<dyn Algorithm>),
    Adapter(Arc<dyn Adapter>),
    Visualizer(Arc<dyn Visualizer>),
}

impl Component {
    /// The kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Problem(_) => ComponentKind::Problem,
            Self::Algorithm(_) => ComponentKind::Algorithm,
            Self::Adapter(_) => ComponentKind::Adapter,
            Self::Visualizer(_) => ComponentKind::Visualizer,
        }
    }

    /// Display name of the wrapped component
    pub fn name(&self) -> &str {
        match self {
            Self::Problem(p) => p.name(),
            Self::Algorithm(a) => a.name(),
            Self::Adapter(a) => a.name(),
            Self::Visualizer(v) => v.name(),
        }
    }

    /// The state type this component consumes, if any
    pub fn accepts(&self) -> Option<&StateType> {
        match self {
            Self::Problem(_) => None,
            Self::Algorithm(a) => Some(a.accepts()),
            Self::Adapter(a) => Some(a.accepts()),
            Self::Visualizer(v) => Some(v.accepts()),
        }
    }

    /// The state type this component produces, if any
    pub fn produces(&self) -> Option<&StateType> {
        match self {
            Self::Problem(p) => Some(p.state_type()),
            Self::Algorithm(a) => Some(a.outputs()),
            Self::Adapter(a) => Some(a.outputs()),
            Self::Visualizer(_) => None,
        }
    }

    pub fn as_problem(&self) -> Option<&Arc<dyn Problem>> {
        match self {
            Self::Problem(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_algorithm(&self) -> Option<&Arc<dyn Algorithm>> {
        match self {
            Self::Algorithm(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_adapter(&self) -> Option<&Arc<dyn Adapter>> {
        match self {
            Self::Adapter(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_visualizer(&self) -> Option<&Arc<dyn Visualizer>> {
        match self {
            Self::Visualizer(v) => Some(v),
            _ => None,
        }
    }

    /// Address of the shared instance, used as its structural identity
    pub fn identity(&self) -> usize {
        match self {
            Self::Problem(p) => Arc::as_ptr(p) as *const () as usize,
            Self::Algorithm(a) => Arc::as_ptr(a) as *const () as usize,
            Self::Adapter(a) => Arc::as_ptr(a) as *const () as usize,
            Self::Visualizer(v) => Arc::as_ptr(v) as *const () as usize,
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// Function type wrapped by [`FnAdapter`]
type TransformFn = dyn Fn(&Value) -> Result<Value, ComponentError> + Send + Sync;

/// Adapter backed by a closure
///
/// Convenient for user-authored adapters that need no state of their own.
pub struct FnAdapter {
    name: String,
    accepts: StateType,
    outputs: StateType,
    transform: Box<TransformFn>,
}

impl FnAdapter {
    pub fn new(
        name: impl Into<String>,
        accepts: StateType,
        outputs: StateType,
        transform: impl Fn(&Value) -> Result<Value, ComponentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            accepts,
            outputs,
            transform: Box::new(transform),
        }
    }
}

impl Adapter for FnAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self) -> &StateType {
        &self.accepts
    }

    fn outputs(&self) -> &StateType {
        &self.outputs
    }

    fn transform(&self, input: &Value) -> Result<Value, ComponentError> {
        (self.transform)(input)
    }
}

/// Problem that always produces the same value
pub struct StaticProblem {
    name: String,
    state_type: StateType,
    state: Value,
}

impl StaticProblem {
    /// Create a problem whose state type is inferred from `state`
    pub fn new(name: impl Into<String>, state: Value) -> Self {
        let name = name.into();
        Self {
            state_type: StateType::of_value(name.clone(), &state),
            name,
            state,
        }
    }
}

impl Problem for StaticProblem {
    fn name(&self) -> &str {
        &self.name
    }

    fn state_type(&self) -> &StateType {
        &self.state_type
    }

    fn initial_state(&self) -> Value {
        self.state.clone()
    }
}
