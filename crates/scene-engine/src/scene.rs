//! Immutable scene snapshots
//!
//! A `Scene` pairs an algorithm with a problem input and a snapshot of the
//! executor's trace. Advancing never mutates a scene: `copy_with_execution`
//! drives the shared executor and returns a new value, so consumers can tell
//! scenes apart by identity.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::component::Algorithm;
use crate::config::ExecutionConfig;
use crate::error::ExecutionError;
use crate::executor::{ExecutionStep, ExecutionTrace, Executor};

/// Snapshot of an algorithm's progress against one problem input
#[derive(Clone)]
pub struct Scene {
    id: String,
    algorithm: Arc<dyn Algorithm>,
    problem_input: Arc<Value>,
    executor: Arc<Mutex<Executor>>,
    config: ExecutionConfig,
    execution_trace: ExecutionTrace,
    is_fully_executed: bool,
    did_reach_execution_limit: bool,
}

impl Scene {
    /// Build a scene, taking the executor's initial steps
    pub fn new(
        algorithm: Arc<dyn Algorithm>,
        problem_input: Value,
        config: ExecutionConfig,
    ) -> Result<Self, ExecutionError> {
        let executor = Executor::new(algorithm.as_ref(), problem_input.clone(), &config)?;
        let id = uuid::Uuid::new_v4().to_string();
        log::debug!("Scene {} created for algorithm '{}'", id, algorithm.name());

        Ok(Self {
            id,
            execution_trace: executor.trace().clone(),
            is_fully_executed: executor.is_fully_executed(),
            did_reach_execution_limit: executor.did_reach_execution_limit(),
            algorithm,
            problem_input: Arc::new(problem_input),
            executor: Arc::new(Mutex::new(executor)),
            config,
        })
    }

    /// Advance the shared executor and return the resulting scene
    ///
    /// `until_count` of `None` runs to completion (bounded by the step
    /// ceiling). `self` is left untouched.
    pub fn copy_with_execution(&self, until_count: Option<usize>) -> Result<Scene, ExecutionError> {
        let mut executor = self.executor.lock();
        executor.execute(until_count, self.config.max_execution_step_count)?;

        Ok(Scene {
            id: self.id.clone(),
            algorithm: self.algorithm.clone(),
            problem_input: self.problem_input.clone(),
            executor: self.executor.clone(),
            config: self.config,
            execution_trace: executor.trace().clone(),
            is_fully_executed: executor.is_fully_executed(),
            did_reach_execution_limit: executor.did_reach_execution_limit(),
        })
    }

    /// Identifier shared by every scene derived from the same executor
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn algorithm(&self) -> &Arc<dyn Algorithm> {
        &self.algorithm
    }

    pub fn problem_input(&self) -> &Value {
        &self.problem_input
    }

    pub fn execution_trace(&self) -> &ExecutionTrace {
        &self.execution_trace
    }

    /// Latest recorded step
    pub fn current_step(&self) -> Option<&ExecutionStep> {
        self.execution_trace.last()
    }

    /// State of the latest recorded step
    pub fn current_state(&self) -> Option<&Value> {
        self.current_step().map(|s| &s.state)
    }

    pub fn is_fully_executed(&self) -> bool {
        self.is_fully_executed
    }

    /// Advisory: the step ceiling stopped execution before completion
    pub fn did_reach_execution_limit(&self) -> bool {
        self.did_reach_execution_limit
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("algorithm", &self.algorithm.name())
            .field("trace_len", &self.execution_trace.len())
            .field("is_fully_executed", &self.is_fully_executed)
            .field("did_reach_execution_limit", &self.did_reach_execution_limit)
            .finish()
    }
}

/// What the host shows for the current (algorithm, problem input) pair
///
/// Execution faults are fatal to a scene but never to the host: they become
/// `Faulted`, a visible "no scene" state.
#[derive(Debug, Clone, Default)]
pub enum SceneStatus {
    /// No algorithm/problem selected yet
    #[default]
    Empty,
    /// A usable scene
    Ready(Scene),
    /// The algorithm faulted; no scene is available
    Faulted { cause: String },
}

impl SceneStatus {
    /// Build a scene, converting a fault into `Faulted`
    pub fn build(algorithm: Arc<dyn Algorithm>, problem_input: Value, config: ExecutionConfig) -> Self {
        let name = algorithm.name().to_string();
        match Scene::new(algorithm, problem_input, config) {
            Ok(scene) => Self::Ready(scene),
            Err(ExecutionError::Fault(cause)) => {
                log::warn!("Scene for '{}' faulted during construction: {}", name, cause);
                Self::Faulted { cause }
            }
        }
    }

    /// Advance a ready scene; other states are returned unchanged
    pub fn advance(&self, until_count: Option<usize>) -> Self {
        match self {
            Self::Ready(scene) => match scene.copy_with_execution(until_count) {
                Ok(next) => Self::Ready(next),
                Err(ExecutionError::Fault(cause)) => {
                    log::warn!("Scene {} faulted: {}", scene.id(), cause);
                    Self::Faulted { cause }
                }
            },
            other => other.clone(),
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        match self {
            Self::Ready(scene) => Some(scene),
            _ => None,
        }
    }

    /// Current algorithm state, if a scene is available
    pub fn current_state(&self) -> Option<&Value> {
        self.scene().and_then(Scene::current_state)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }
}
