//! Error types for the scene engine

use thiserror::Error;

use crate::component::ComponentKind;

/// Result type alias using SceneEngineError
pub type Result<T> = std::result::Result<T, SceneEngineError>;

/// Umbrella error for operations that cross module boundaries
#[derive(Debug, Error)]
pub enum SceneEngineError {
    /// A component rejected its input or parameters
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// The algorithm's step generator faulted
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Adapters could not be chained
    #[error("Adapter chain error: {0}")]
    Chain(#[from] ChainError),

    /// Catalog lookup or instantiation failed
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The execution worker is unavailable
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by problems, algorithms, adapters and visualizers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    /// The input value does not have the expected structure
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required field is absent from the input value
    #[error("Missing field '{0}'")]
    MissingField(String),

    /// A parameter value was supplied for an undeclared parameter
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// A parameter value could not be decoded
    #[error("Invalid parameter values: {0}")]
    InvalidParameters(String),

    /// Generic component failure
    #[error("{0}")]
    Failed(String),
}

impl ComponentError {
    /// Create a generic failure with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create an invalid-input error with a message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors raised while driving a step generator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The generator (or the algorithm's start) failed; terminal for the scene
    #[error("Execution fault: {0}")]
    Fault(String),
}

/// Errors raised by the adapter chain compiler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// No adapters were given
    #[error("Cannot compose an empty adapter chain")]
    Empty,

    /// An adjacent pair does not fit together structurally
    #[error("Adapter '{upstream}' does not satisfy '{downstream}' at position {index}: missing fields {missing:?}")]
    NotComposable {
        /// Index of the upstream adapter of the failing pair
        index: usize,
        upstream: String,
        downstream: String,
        /// Required field names the upstream does not produce
        missing: Vec<String>,
    },
}

/// Errors raised by the component catalog
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// No entry is registered under this key
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    /// The entry exists but is of a different kind
    #[error("Component '{key}' is a {actual}, expected a {expected}")]
    KindMismatch {
        key: String,
        expected: ComponentKind,
        actual: ComponentKind,
    },

    /// The entry's factory rejected the parameter values
    #[error("Component '{key}' could not be created: {source}")]
    Creation {
        key: String,
        #[source]
        source: ComponentError,
    },

    /// Two nodes of a box configuration share an alias
    #[error("Duplicate node alias '{0}'")]
    DuplicateAlias(String),
}

/// Errors loading or saving engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),
}

/// Errors talking to the execution worker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkerError {
    /// The worker's request channel is closed
    #[error("Execution worker is not running")]
    Closed,

    /// The worker dropped the request without replying
    #[error("Execution worker dropped request {0}")]
    Dropped(u64),
}
