//! Scene Engine - Replayable algorithm execution and typed composition
//!
//! This crate turns step-yielding algorithms into bounded, replayable traces
//! of immutable snapshots, and wires problems, algorithms, adapters and
//! visualizers together through a structurally typed dataflow graph. It
//! supports:
//!
//! - Deep-cloned snapshot per step, with a lifetime step ceiling
//! - Immutable scenes that advance by copy
//! - Off-thread execution with stale-reply filtering
//! - Adapter chains checked before any transform runs
//! - Partial-failure graph resolution with per-slot diagnostics
//!
//! # Architecture
//!
//! - `Executor` / `Scene`: drive an algorithm's `StepGenerator`
//! - `ExecutionWorker` / `ExecutionClient`: serve requests from a queue
//! - `ComponentCatalog`: parameterized component factories by key
//! - `resolve` / `SolverCache`: evaluate a `CompositionGraph`
//! - `EventSink`: generic event streaming
//!
//! # Example
//!
//! ```ignore
//! use scene_engine::{BoxConfig, ComponentRef, Scene, SolverInputs};
//!
//! let graph = BoxConfig::direct(ComponentRef::new("counter"), ComponentRef::new("countdown"))
//!     .resolve(&catalog)?;
//! let resolution = scene_engine::resolve(&graph, &SolverInputs::initial(&graph));
//! ```

pub mod builder;
pub mod catalog;
pub mod chain;
pub mod component;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod parameters;
pub mod scene;
pub mod solver;
pub mod state_type;
pub mod validation;
pub mod worker;

// Re-export key types
pub use builder::CompositionBuilder;
pub use catalog::{CatalogEntry, CatalogFn, ComponentCatalog, ComponentMetadata, ComponentRef};
pub use chain::{compose, try_compose, ComposedAdapter};
pub use component::{
    Adapter, Algorithm, Component, ComponentKind, FnAdapter, Problem, Resume, StaticProblem,
    StepGenerator, Visualizer,
};
pub use config::{EngineConfig, ExecutionConfig, WorkerConfig};
pub use error::{
    CatalogError, ChainError, ComponentError, ConfigError, ExecutionError, Result,
    SceneEngineError, WorkerError,
};
pub use events::{EventSink, LogEventSink, NullEventSink, SceneEvent, VecEventSink};
pub use executor::{ExecutionOutcome, ExecutionStep, ExecutionTrace, Executor, ExecutorState};
pub use graph::{BoxConfig, CompositionGraph, Connection, ConnectionConfig, Slot};
pub use parameters::{ParameterSpec, ParameterValues, Parameterized};
pub use scene::{Scene, SceneStatus};
pub use solver::{
    render_visualizers, resolve, CacheStats, InputError, NodeError, Resolution, SolverCache,
    SolverInputs,
};
pub use state_type::{FieldType, Shape, StateType};
pub use validation::{validate_box, validate_graph, ConfigurationError};
pub use worker::{
    ClientOutcome, ExecutionClient, ExecutionFailure, ExecutionRequest, ExecutionResponse,
    ExecutionService, ExecutionWorker, InlineExecution, WorkerReply,
};

// Used by `inventory::submit!` in downstream crates
pub use inventory;
