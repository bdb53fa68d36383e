//! Step executor
//!
//! Turns an algorithm's step generator into a replayable, bounded trace.
//!
//! # Key Concepts
//!
//! - **Snapshot per step**: every `Resume::Step` records a deep clone of the
//!   generator's working state, so later mutation never rewrites history
//! - **Sentinels dropped**: non-step yields advance the generator but are not
//!   recorded
//! - **Lifetime ceiling**: at most `max_execution_step_count` generator
//!   advances are performed over the executor's life; hitting it is advisory
//! - **Terminal states**: completion and faults are final; later calls are
//!   no-ops (completed) or repeat the fault (faulted)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Algorithm, Resume, StepGenerator};
use crate::config::ExecutionConfig;
use crate::error::ExecutionError;

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// First pseudocode line of the transition
    pub start_line: u32,
    /// Last pseudocode line of the transition
    pub end_line: u32,
    /// Snapshot of the working state after the transition
    pub state: Value,
}

/// Append-only sequence of recorded steps
///
/// Steps are shared, so cloning a trace never copies state values.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    steps: Vec<Arc<ExecutionStep>>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`
    pub fn get(&self, index: usize) -> Option<&ExecutionStep> {
        self.steps.get(index).map(|s| s.as_ref())
    }

    /// Most recent step
    pub fn last(&self) -> Option<&ExecutionStep> {
        self.steps.last().map(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionStep> {
        self.steps.iter().map(|s| s.as_ref())
    }

    /// Owned copy of the steps, e.g. for a wire message
    pub fn to_steps(&self) -> Vec<ExecutionStep> {
        self.iter().cloned().collect()
    }

    fn push(&mut self, step: ExecutionStep) {
        self.steps.push(Arc::new(step));
    }
}

impl FromIterator<ExecutionStep> for ExecutionTrace {
    fn from_iter<I: IntoIterator<Item = ExecutionStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Lifecycle of an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    NotStarted,
    Executing,
    FullyExecuted,
    Faulted,
}

/// Result of one `execute` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Steps recorded by this call
    pub steps_appended: usize,
    /// The step ceiling stopped this call before the target or completion
    pub did_reach_execution_limit: bool,
}

enum Stop {
    Target,
    Limit,
    Complete,
    Fault(String),
}

/// Drives one step generator
pub struct Executor {
    generator: Option<Box<dyn StepGenerator>>,
    trace: ExecutionTrace,
    state: ExecutorState,
    advances: usize,
    did_reach_execution_limit: bool,
    fault: Option<String>,
}

impl Executor {
    /// Start `algorithm` on `input` and take the initial steps
    ///
    /// A failure to start, or a fault during the initial steps, is returned
    /// as `ExecutionError::Fault`.
    pub fn new(
        algorithm: &dyn Algorithm,
        input: Value,
        config: &ExecutionConfig,
    ) -> Result<Self, ExecutionError> {
        let generator = algorithm.start(input).map_err(|e| {
            log::warn!("Algorithm '{}' failed to start: {}", algorithm.name(), e);
            ExecutionError::Fault(e.to_string())
        })?;

        let mut executor = Self::from_generator(generator);
        executor.execute(
            Some(config.initial_step_count.max(1)),
            config.max_execution_step_count,
        )?;
        Ok(executor)
    }

    /// Wrap a generator without advancing it
    pub fn from_generator(generator: Box<dyn StepGenerator>) -> Self {
        Self {
            generator: Some(generator),
            trace: ExecutionTrace::new(),
            state: ExecutorState::NotStarted,
            advances: 0,
            did_reach_execution_limit: false,
            fault: None,
        }
    }

    /// Advance until the trace holds `until_count` steps, or until completion
    /// when `until_count` is `None`
    pub fn execute(
        &mut self,
        until_count: Option<usize>,
        max_execution_step_count: usize,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        match self.state {
            ExecutorState::FullyExecuted => return Ok(ExecutionOutcome::default()),
            ExecutorState::Faulted => {
                return Err(ExecutionError::Fault(self.fault.clone().unwrap_or_default()))
            }
            ExecutorState::NotStarted | ExecutorState::Executing => {}
        }

        let before = self.trace.len();
        self.state = ExecutorState::Executing;

        let stop = match self.generator.as_mut() {
            None => Stop::Complete,
            Some(generator) => loop {
                if until_count.is_some_and(|target| self.trace.len() >= target) {
                    break Stop::Target;
                }
                if self.advances >= max_execution_step_count {
                    break Stop::Limit;
                }

                self.advances += 1;
                match generator.resume() {
                    Ok(Resume::Step {
                        start_line,
                        end_line,
                    }) => {
                        self.trace.push(ExecutionStep {
                            start_line,
                            end_line,
                            state: generator.state().clone(),
                        });
                    }
                    Ok(Resume::Sentinel(_)) => {}
                    Ok(Resume::Complete) => break Stop::Complete,
                    Err(e) => break Stop::Fault(e.to_string()),
                }
            },
        };

        let steps_appended = self.trace.len() - before;
        match stop {
            Stop::Target => Ok(ExecutionOutcome {
                steps_appended,
                did_reach_execution_limit: false,
            }),
            Stop::Limit => {
                log::debug!(
                    "Execution limit reached after {} advances ({} steps)",
                    self.advances,
                    self.trace.len()
                );
                self.did_reach_execution_limit = true;
                Ok(ExecutionOutcome {
                    steps_appended,
                    did_reach_execution_limit: true,
                })
            }
            Stop::Complete => {
                log::debug!("Generator completed with {} steps", self.trace.len());
                self.state = ExecutorState::FullyExecuted;
                self.generator = None;
                Ok(ExecutionOutcome {
                    steps_appended,
                    did_reach_execution_limit: false,
                })
            }
            Stop::Fault(cause) => {
                log::warn!("Generator faulted after {} steps: {}", self.trace.len(), cause);
                self.state = ExecutorState::Faulted;
                self.generator = None;
                self.fault = Some(cause.clone());
                Err(ExecutionError::Fault(cause))
            }
        }
    }

    /// Recorded steps so far
    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn is_fully_executed(&self) -> bool {
        self.state == ExecutorState::FullyExecuted
    }

    /// Whether any call so far stopped on the step ceiling
    pub fn did_reach_execution_limit(&self) -> bool {
        self.did_reach_execution_limit
    }

    /// Total generator advances performed
    pub fn advances(&self) -> usize {
        self.advances
    }

    /// Cause of the fault, if faulted
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// The generator's live working state, while it is still running
    pub fn working_state(&self) -> Option<&Value> {
        self.generator.as_ref().map(|g| g.state())
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("state", &self.state)
            .field("trace_len", &self.trace.len())
            .field("advances", &self.advances)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::CountingAlgorithm;
    use super::*;
    use serde_json::json;

    fn config(max: usize) -> ExecutionConfig {
        ExecutionConfig::default().with_max_execution_step_count(max)
    }

    #[test]
    fn test_construct_takes_initial_step() {
        let executor =
            Executor::new(&CountingAlgorithm::terminating(5), json!({}), &config(1000)).unwrap();
        assert_eq!(executor.trace().len(), 1);
        assert_eq!(executor.state(), ExecutorState::Executing);
        assert_eq!(executor.trace().get(0).unwrap().state, json!({"items": [0]}));
    }

    #[test]
    fn test_snapshots_are_clones_of_working_state() {
        let mut executor =
            Executor::new(&CountingAlgorithm::terminating(5), json!({}), &config(1000)).unwrap();
        let live = executor.working_state().unwrap();
        let recorded = &executor.trace().get(0).unwrap().state;
        assert_eq!(recorded, live);
        assert!(!std::ptr::eq(recorded, live));

        executor.execute(Some(3), 1000).unwrap();
        // The first snapshot is unaffected by later mutation of the shared state.
        assert_eq!(executor.trace().get(0).unwrap().state, json!({"items": [0]}));
        assert_eq!(executor.trace().get(2).unwrap().state, json!({"items": [0, 1, 2]}));
    }

    #[test]
    fn test_sentinels_are_not_recorded() {
        let mut executor = Executor::from_generator(
            CountingAlgorithm::terminating(3).start(json!({})).unwrap(),
        );
        executor.execute(None, 1000).unwrap();
        assert_eq!(executor.trace().len(), 3);
        // 3 steps + 3 sentinels + completion
        assert_eq!(executor.advances(), 7);
    }

    #[test]
    fn test_run_to_completion_is_idempotent() {
        let mut executor =
            Executor::new(&CountingAlgorithm::terminating(4), json!({}), &config(1000)).unwrap();
        let outcome = executor.execute(None, 1000).unwrap();
        assert!(executor.is_fully_executed());
        assert!(!outcome.did_reach_execution_limit);
        let len = executor.trace().len();
        assert_eq!(len, 4);

        let again = executor.execute(None, 1000).unwrap();
        assert_eq!(again, ExecutionOutcome::default());
        assert_eq!(executor.trace().len(), len);
        assert!(executor.is_fully_executed());
    }

    #[test]
    fn test_yielding_is_not_completion() {
        let mut executor =
            Executor::new(&CountingAlgorithm::terminating(3), json!({}), &config(1000)).unwrap();
        executor.execute(Some(3), 1000).unwrap();
        assert_eq!(executor.trace().len(), 3);
        assert!(!executor.is_fully_executed());
    }

    #[test]
    fn test_monotonic_prefix() {
        let mut executor =
            Executor::new(&CountingAlgorithm::terminating(50), json!({}), &config(1000)).unwrap();
        executor.execute(Some(4), 1000).unwrap();
        let early = executor.trace().to_steps();

        executor.execute(Some(20), 1000).unwrap();
        let later = executor.trace().to_steps();

        assert_eq!(early.len(), 4);
        assert_eq!(later.len(), 20);
        assert_eq!(
            serde_json::to_vec(&early).unwrap(),
            serde_json::to_vec(&later[..4]).unwrap()
        );
    }

    #[test]
    fn test_step_ceiling_on_endless_algorithm() {
        let max = 25;
        let mut executor =
            Executor::new(&CountingAlgorithm::endless(), json!({}), &config(max)).unwrap();
        let outcome = executor.execute(None, max).unwrap();
        assert!(outcome.did_reach_execution_limit);
        assert!(executor.did_reach_execution_limit());
        assert!(executor.trace().len() <= max);
        assert_eq!(executor.advances(), max);
        assert!(!executor.is_fully_executed());

        // Further calls stay bounded.
        let again = executor.execute(None, max).unwrap();
        assert!(again.did_reach_execution_limit);
        assert_eq!(again.steps_appended, 0);
    }

    #[test]
    fn test_fault_propagates_and_is_terminal() {
        let mut executor =
            Executor::new(&CountingAlgorithm::failing_at(2), json!({}), &config(1000)).unwrap();
        let err = executor.execute(None, 1000).unwrap_err();
        assert_eq!(err, ExecutionError::Fault("boom at 2".into()));
        assert_eq!(executor.state(), ExecutorState::Faulted);
        assert_eq!(executor.fault(), Some("boom at 2"));
        // History recorded before the fault survives.
        assert_eq!(executor.trace().len(), 2);

        assert_eq!(executor.execute(None, 1000).unwrap_err(), err);
    }

    #[test]
    fn test_fault_during_construction() {
        let err = Executor::new(&CountingAlgorithm::failing_at(0), json!({}), &config(1000))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Fault(_)));
    }

    #[test]
    fn test_target_already_reached_is_noop() {
        let mut executor =
            Executor::new(&CountingAlgorithm::terminating(5), json!({}), &config(1000)).unwrap();
        executor.execute(Some(3), 1000).unwrap();
        let advances = executor.advances();
        let outcome = executor.execute(Some(2), 1000).unwrap();
        assert_eq!(outcome.steps_appended, 0);
        assert_eq!(executor.advances(), advances);
    }

    #[test]
    fn test_step_serializes_camel_case() {
        let step = ExecutionStep {
            start_line: 2,
            end_line: 3,
            state: json!({"x": 1}),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json, json!({"startLine": 2, "endLine": 3, "state": {"x": 1}}));
    }
}
