//! Countdown
//!
//! ```text
//! 1  while counter > 0
//! 2      counter <- counter - 1
//! ```

use std::sync::Arc;

use serde_json::Value;

use scene_engine::{
    Algorithm, CatalogEntry, CatalogFn, Component, ComponentError, ComponentKind, Parameterized,
    Resume, StateType, StepGenerator,
};

use crate::keys;
use crate::shapes::{counter_type, decode, encode, Counter};

/// Decrements a counter down to zero
pub struct Countdown {
    state_type: StateType,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            state_type: counter_type(),
        }
    }

    pub fn catalog_entry() -> CatalogEntry {
        CatalogEntry::new(
            keys::COUNTDOWN,
            ComponentKind::Algorithm,
            "Countdown",
            "Decrements the counter one step at a time until it reaches zero",
            Parameterized::fixed(Component::Algorithm(Arc::new(Countdown::new()))),
        )
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

inventory::submit!(CatalogFn(Countdown::catalog_entry));

impl Algorithm for Countdown {
    fn name(&self) -> &str {
        "Countdown"
    }

    fn accepts(&self) -> &StateType {
        &self.state_type
    }

    fn outputs(&self) -> &StateType {
        &self.state_type
    }

    fn start(&self, input: Value) -> Result<Box<dyn StepGenerator>, ComponentError> {
        let counter: Counter = decode(&input)?;
        Ok(Box::new(CountdownRun {
            counter: counter.counter,
            decrement_next: false,
            state: input,
        }))
    }
}

struct CountdownRun {
    counter: u64,
    decrement_next: bool,
    state: Value,
}

impl StepGenerator for CountdownRun {
    fn resume(&mut self) -> Result<Resume, ComponentError> {
        if self.decrement_next {
            self.counter -= 1;
            self.state = encode(&Counter {
                counter: self.counter,
            })?;
            self.decrement_next = false;
            return Ok(Resume::line(2));
        }

        if self.counter == 0 {
            return Ok(Resume::Complete);
        }
        self.decrement_next = true;
        Ok(Resume::line(1))
    }

    fn state(&self) -> &Value {
        &self.state
    }
}
