//! Adapter chain compiler
//!
//! Composes an ordered list of adapters into a single adapter. `try_compose`
//! checks every adjacent pair structurally before building anything, so an
//! incompatible chain is rejected without ever calling `transform`.

use std::sync::Arc;

use serde_json::Value;

use crate::component::Adapter;
use crate::error::{ChainError, ComponentError};
use crate::state_type::StateType;

/// Several adapters applied in order
pub struct ComposedAdapter {
    name: String,
    adapters: Vec<Arc<dyn Adapter>>,
    accepts: StateType,
    outputs: StateType,
}

impl ComposedAdapter {
    /// Number of adapters in the chain
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Always false; empty chains cannot be built
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Adapter for ComposedAdapter {
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
        let mut adapters = self.adapters.iter();
        let Some(first) = adapters.next() else {
            return Ok(input.clone());
        };
        let mut value = first.transform(input)?;
        for adapter in adapters {
            value = adapter.transform(&value)?;
        }
        Ok(value)
    }
}

impl std::fmt::Debug for ComposedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedAdapter")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Compose adapters without checking that adjacent pairs fit
pub fn compose(adapters: Vec<Arc<dyn Adapter>>) -> Result<ComposedAdapter, ChainError> {
    let (Some(first), Some(last)) = (adapters.first(), adapters.last()) else {
        return Err(ChainError::Empty);
    };
    let accepts = first.accepts().clone();
    let outputs = last.outputs().clone();
    let name = adapters
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(" -> ");

    Ok(ComposedAdapter {
        name,
        adapters,
        accepts,
        outputs,
    })
}

/// Compose adapters after verifying every adjacent pair is compatible
///
/// Returns `ChainError::NotComposable` for the first pair whose upstream
/// output fields do not cover the downstream's required fields.
pub fn try_compose(adapters: Vec<Arc<dyn Adapter>>) -> Result<ComposedAdapter, ChainError> {
    check_pairs(&adapters)?;
    compose(adapters)
}

fn check_pairs(adapters: &[Arc<dyn Adapter>]) -> Result<(), ChainError> {
    for (index, pair) in adapters.windows(2).enumerate() {
        let (upstream, downstream) = (&pair[0], &pair[1]);
        let missing = downstream.accepts().missing_fields(upstream.outputs());
        if !missing.is_empty() {
            log::debug!(
                "Adapter chain breaks at {}: '{}' -> '{}' missing {:?}",
                index,
                upstream.name(),
                downstream.name(),
                missing
            );
            return Err(ChainError::NotComposable {
                index,
                upstream: upstream.name().to_string(),
                downstream: downstream.name().to_string(),
                missing,
            });
        }
    }
    Ok(())
}
