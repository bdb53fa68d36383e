//! Off-thread scene execution
//!
//! The worker replays an algorithm from a problem snapshot and replies with
//! the resulting trace. Requests and replies are plain serde messages, so the
//! worker can sit behind any transport.
//!
//! # Generations
//!
//! Every request carries a monotonically increasing `generation_id`. The
//! [`ExecutionClient`] bumps it when a request is issued and discards any
//! reply whose id is not the latest, so a slow reply for an outdated
//! (algorithm, problem) pair never overwrites a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::catalog::{ComponentCatalog, ComponentRef};
use crate::config::{EngineConfig, ExecutionConfig};
use crate::error::{ExecutionError, WorkerError};
use crate::events::{EventSink, SceneEvent};
use crate::executor::{ExecutionStep, Executor};

/// Ask the worker to replay an algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub algorithm_ref: ComponentRef,
    pub problem_input_snapshot: Value,
    /// Trace length to reach; `None` runs to completion
    pub target_step_count: Option<usize>,
    pub max_execution_step_count: usize,
    pub generation_id: u64,
}

/// Trace produced for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub trace: Vec<ExecutionStep>,
    pub is_fully_executed: bool,
    pub did_hit_limit: bool,
    pub generation_id: u64,
}

/// The request could not be served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    pub generation_id: u64,
    pub cause: String,
}

/// Worker reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerReply {
    Response(ExecutionResponse),
    Failure(ExecutionFailure),
}

impl WorkerReply {
    pub fn generation_id(&self) -> u64 {
        match self {
            Self::Response(r) => r.generation_id,
            Self::Failure(f) => f.generation_id,
        }
    }

    fn failure(generation_id: u64, cause: impl Into<String>) -> Self {
        Self::Failure(ExecutionFailure {
            generation_id,
            cause: cause.into(),
        })
    }
}

/// Serve one request synchronously
pub fn run_request(
    catalog: &ComponentCatalog,
    request: &ExecutionRequest,
    initial_step_count: usize,
) -> WorkerReply {
    let generation_id = request.generation_id;
    let config = ExecutionConfig {
        max_execution_step_count: request.max_execution_step_count,
        initial_step_count,
    };

    let algorithm = match catalog.resolve_algorithm(&request.algorithm_ref) {
        Ok(algorithm) => algorithm,
        Err(e) => return WorkerReply::failure(generation_id, e.to_string()),
    };

    let run = Executor::new(
        algorithm.as_ref(),
        request.problem_input_snapshot.clone(),
        &config,
    )
    .and_then(|mut executor| {
        executor.execute(request.target_step_count, config.max_execution_step_count)?;
        Ok(executor)
    });

    match run {
        Ok(executor) => {
            log::debug!(
                "Generation {} produced {} steps",
                generation_id,
                executor.trace().len()
            );
            WorkerReply::Response(ExecutionResponse {
                trace: executor.trace().to_steps(),
                is_fully_executed: executor.is_fully_executed(),
                did_hit_limit: executor.did_reach_execution_limit(),
                generation_id,
            })
        }
        Err(ExecutionError::Fault(cause)) => WorkerReply::failure(generation_id, cause),
    }
}

/// Something that can serve execution requests
#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<WorkerReply, WorkerError>;
}

/// Serves requests on the caller's task
pub struct InlineExecution {
    catalog: Arc<ComponentCatalog>,
    initial_step_count: usize,
}

impl InlineExecution {
    pub fn new(catalog: Arc<ComponentCatalog>, config: &ExecutionConfig) -> Self {
        Self {
            catalog,
            initial_step_count: config.initial_step_count,
        }
    }
}

#[async_trait]
impl ExecutionService for InlineExecution {
    async fn execute(&self, request: ExecutionRequest) -> Result<WorkerReply, WorkerError> {
        Ok(run_request(&self.catalog, &request, self.initial_step_count))
    }
}

struct Envelope {
    request: ExecutionRequest,
    reply: oneshot::Sender<WorkerReply>,
}

/// Background task serving requests from a bounded queue
///
/// Each request runs on the blocking pool; a panicking generator becomes an
/// `ExecutionFailure` instead of taking the worker down.
pub struct ExecutionWorker {
    sender: mpsc::Sender<Envelope>,
    handle: JoinHandle<()>,
}

impl ExecutionWorker {
    /// Start the worker on the current tokio runtime
    pub fn spawn(catalog: Arc<ComponentCatalog>, config: &EngineConfig) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(config.worker.channel_capacity.max(1));
        let initial_step_count = config.execution.initial_step_count;

        let handle = tokio::spawn(async move {
            log::info!("Execution worker started");
            while let Some(envelope) = receiver.recv().await {
                let generation_id = envelope.request.generation_id;
                let request = envelope.request;
                let catalog = catalog.clone();

                let reply = tokio::task::spawn_blocking(move || {
                    run_request(&catalog, &request, initial_step_count)
                })
                .await
                .unwrap_or_else(|e| {
                    log::warn!("Execution task for generation {} failed: {}", generation_id, e);
                    WorkerReply::failure(generation_id, format!("Execution task failed: {}", e))
                });

                if envelope.reply.send(reply).is_err() {
                    log::debug!("Requester for generation {} went away", generation_id);
                }
            }
            log::info!("Execution worker stopped");
        });

        Self { sender, handle }
    }

    /// Whether the worker is still accepting requests
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed() && !self.handle.is_finished()
    }

    /// Stop the worker task; queued requests are dropped
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[async_trait]
impl ExecutionService for ExecutionWorker {
    async fn execute(&self, request: ExecutionRequest) -> Result<WorkerReply, WorkerError> {
        let generation_id = request.generation_id;
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_| WorkerError::Closed)?;
        receiver.await.map_err(|_| WorkerError::Dropped(generation_id))
    }
}

/// What the client made of a reply
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOutcome {
    /// A newer request was issued; the reply was discarded
    Stale {
        generation_id: u64,
        latest_generation_id: u64,
    },
    Response(ExecutionResponse),
    Failure(ExecutionFailure),
}

/// Issues requests and filters out stale replies
pub struct ExecutionClient {
    service: Arc<dyn ExecutionService>,
    latest_generation: AtomicU64,
    event_sink: Arc<dyn EventSink>,
}

impl ExecutionClient {
    pub fn new(service: Arc<dyn ExecutionService>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            service,
            latest_generation: AtomicU64::new(0),
            event_sink,
        }
    }

    /// Generation of the most recent request
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation.load(Ordering::SeqCst)
    }

    /// Mark every outstanding request as stale
    pub fn invalidate(&self) -> u64 {
        self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Issue a request and wait for its reply
    ///
    /// The generation is bumped before the first await, so a request issued
    /// later always supersedes this one.
    pub async fn request(
        &self,
        algorithm_ref: ComponentRef,
        problem_input: Value,
        target_step_count: Option<usize>,
        config: &ExecutionConfig,
    ) -> Result<ClientOutcome, WorkerError> {
        let generation_id = self.invalidate();
        self.emit(SceneEvent::RequestIssued {
            generation_id,
            target_step_count,
        });

        let reply = self
            .service
            .execute(ExecutionRequest {
                algorithm_ref,
                problem_input_snapshot: problem_input,
                target_step_count,
                max_execution_step_count: config.max_execution_step_count,
                generation_id,
            })
            .await?;
        Ok(self.accept(reply))
    }

    /// Apply a reply, discarding it if it is not for the latest generation
    pub fn accept(&self, reply: WorkerReply) -> ClientOutcome {
        let generation_id = reply.generation_id();
        let latest_generation_id = self.latest_generation();
        if generation_id != latest_generation_id {
            log::warn!(
                "Discarding stale reply for generation {} (latest is {})",
                generation_id,
                latest_generation_id
            );
            self.emit(SceneEvent::StaleResponseDiscarded {
                generation_id,
                latest_generation_id,
            });
            return ClientOutcome::Stale {
                generation_id,
                latest_generation_id,
            };
        }

        match reply {
            WorkerReply::Response(response) => {
                let trace_len = response.trace.len();
                self.emit(if response.is_fully_executed {
                    SceneEvent::ExecutionCompleted {
                        generation_id,
                        trace_len,
                    }
                } else if response.did_hit_limit {
                    SceneEvent::ExecutionLimitReached {
                        generation_id,
                        trace_len,
                    }
                } else {
                    SceneEvent::ExecutionProgressed {
                        generation_id,
                        trace_len,
                    }
                });
                ClientOutcome::Response(response)
            }
            WorkerReply::Failure(failure) => {
                self.emit(SceneEvent::ExecutionFaulted {
                    generation_id,
                    cause: failure.cause.clone(),
                });
                ClientOutcome::Failure(failure)
            }
        }
    }

    fn emit(&self, event: SceneEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::debug!("Failed to send scene event: {}", e);
        }
    }
}
