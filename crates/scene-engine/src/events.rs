//! Event types for streaming scene progress
//!
//! Events are sent from the execution client (or any host) to report
//! requests, results, stale replies and faults.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Trait for sending scene events
///
/// This abstracts over the transport mechanism (mpsc, UI bridge, log, ...).
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: SceneEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted while executing scenes and resolving graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SceneEvent {
    /// An execution request was issued
    #[serde(rename_all = "camelCase")]
    RequestIssued {
        generation_id: u64,
        target_step_count: Option<usize>,
    },

    /// A response was applied but the algorithm has not finished
    #[serde(rename_all = "camelCase")]
    ExecutionProgressed { generation_id: u64, trace_len: usize },

    /// A response was applied and the algorithm ran to completion
    #[serde(rename_all = "camelCase")]
    ExecutionCompleted { generation_id: u64, trace_len: usize },

    /// A response was applied that stopped on the step ceiling
    #[serde(rename_all = "camelCase")]
    ExecutionLimitReached { generation_id: u64, trace_len: usize },

    /// The algorithm faulted
    #[serde(rename_all = "camelCase")]
    ExecutionFaulted { generation_id: u64, cause: String },

    /// A reply arrived after a newer request had been issued
    #[serde(rename_all = "camelCase")]
    StaleResponseDiscarded {
        generation_id: u64,
        latest_generation_id: u64,
    },

    /// A composition graph was resolved
    #[serde(rename_all = "camelCase")]
    GraphResolved { node_count: usize, error_count: usize },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: SceneEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// An event sink that forwards events to the `log` facade
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn send(&self, event: SceneEvent) -> Result<(), EventError> {
        match &event {
            SceneEvent::ExecutionFaulted { .. } | SceneEvent::StaleResponseDiscarded { .. } => {
                log::warn!("{:?}", event)
            }
            _ => log::info!("{:?}", event),
        }
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<SceneEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<SceneEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: SceneEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
