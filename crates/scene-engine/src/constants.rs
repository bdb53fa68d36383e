//! Engine-wide constants
//!
//! Single source of truth for default limits and reserved identifiers.
//! Values here are only ever read through explicit configuration structs.

/// Default values for execution and worker configuration
pub mod defaults {
    /// Ceiling on generator advances performed by one executor
    pub const MAX_EXECUTION_STEP_COUNT: usize = 1000;
    /// Steps taken eagerly when an executor is constructed
    pub const INITIAL_STEP_COUNT: usize = 1;
    /// Capacity of the execution worker's request queue
    pub const WORKER_CHANNEL_CAPACITY: usize = 16;
}

/// Reserved node aliases in a composition graph
pub mod aliases {
    /// Alias given to the box's problem node
    pub const PROBLEM: &str = "problem";
    /// Alias given to the box's algorithm node
    pub const ALGORITHM: &str = "algorithm";
}

/// Slot naming
pub mod slots {
    /// Whole-value passthrough slot
    pub const WHOLE: &str = ".";
}
