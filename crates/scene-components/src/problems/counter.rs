//! Counter Problem
//!
//! Produces `{counter: count}`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use scene_engine::{
    CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, ParameterSpec,
    Parameterized, Problem, StateType,
};

use crate::keys;
use crate::shapes::{counter_type, limits};

#[derive(Deserialize)]
struct CounterParameters {
    count: u64,
}

/// Problem producing a counter value
pub struct CounterProblem {
    count: u64,
    state_type: StateType,
}

impl CounterProblem {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            state_type: counter_type(),
        }
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::COUNTER,
            ComponentKind::Problem,
            "Counter",
            "A single non-negative counter",
            Parameterized::typed(
                vec![ParameterSpec::new("count", "Count", json!(3))],
                |params: CounterParameters| {
                    if params.count > limits::MAX_PATH_NODES {
                        return Err(ComponentError::InvalidParameters(format!(
                            "count {} exceeds the limit of {}",
                            params.count,
                            limits::MAX_PATH_NODES
                        )));
                    }
                    Ok(Component::Problem(Arc::new(CounterProblem::new(params.count))))
                },
            ),
        )
    }
}

inventory::submit!(CatalogFn(CounterProblem::catalog_entry));

impl Problem for CounterProblem {
    fn name(&self) -> &str {
        "Counter"
    }

    fn state_type(&self) -> &StateType {
        &self.state_type
    }

    fn initial_state(&self) -> Value {
        json!({ "counter": self.count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_engine::ParameterValues;

    #[test]
    fn test_default_count() {
        let component = CounterProblem::catalog_entry()
            .factory()
            .create(&ParameterValues::new())
            .unwrap();
        assert_eq!(
            component.as_problem().unwrap().initial_state(),
            json!({"counter": 3})
        );
    }

    #[test]
    fn test_oversized_count_rejected() {
        let mut values = ParameterValues::new();
        values.insert("count".into(), json!(1_000_000_000_000u64));
        assert!(matches!(
            CounterProblem::catalog_entry().factory().create(&values),
            Err(ComponentError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut values = ParameterValues::new();
        values.insert("count".into(), json!(-1));
        assert!(matches!(
            CounterProblem::catalog_entry().factory().create(&values),
            Err(ComponentError::InvalidParameters(_))
        ));
    }
}
