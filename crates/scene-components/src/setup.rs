//! Catalog setup
//!
//! Built-ins register themselves through `inventory`, but a linker may drop
//! objects nothing references. `builtin_catalog` therefore also registers
//! the list below explicitly.

use scene_engine::{CatalogEntry, ComponentCatalog};

use crate::adapters::{
    graph_state_to_counter_entry, graph_state_to_graph_entry, CounterToGraphState,
};
use crate::algorithms::{Countdown, GraphSearch};
use crate::problems::{CounterProblem, GraphProblem};
use crate::visualizers::{CounterSummary, GraphStateSummary};

/// Every built-in catalog entry
pub const BUILTINS: &[fn() -> CatalogEntry] = &[
    GraphProblem::catalog_entry,
    CounterProblem::catalog_entry,
    GraphSearch::breadth_first_entry,
    GraphSearch::depth_first_entry,
    Countdown::catalog_entry,
    CounterToGraphState::catalog_entry,
    graph_state_to_counter_entry,
    graph_state_to_graph_entry,
    GraphStateSummary::catalog_entry,
    CounterSummary::catalog_entry,
];

/// Register all built-ins into an existing catalog
pub fn register_builtins(catalog: &mut ComponentCatalog) {
    for entry in BUILTINS {
        catalog.register(entry());
    }
}

/// A catalog holding the built-ins plus anything else linked in
pub fn builtin_catalog() -> ComponentCatalog {
    let mut catalog = ComponentCatalog::with_registered();
    register_builtins(&mut catalog);
    log::debug!("Built-in catalog holds {} components", catalog.len());
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_engine::ComponentKind;

    use crate::keys;

    #[test]
    fn test_builtin_catalog() {
        let catalog = builtin_catalog();
        assert!(catalog.len() >= BUILTINS.len());
        let by_kind = catalog.metadata_by_kind();
        assert_eq!(by_kind[&ComponentKind::Problem].len(), 2);
        assert_eq!(by_kind[&ComponentKind::Algorithm].len(), 3);
        assert_eq!(by_kind[&ComponentKind::Adapter].len(), 3);
        assert_eq!(by_kind[&ComponentKind::Visualizer].len(), 2);
        assert!(catalog.has_component(keys::BREADTH_FIRST_SEARCH));
    }

    #[test]
    fn test_default_parameters_exposed() {
        let catalog = builtin_catalog();
        let metadata = catalog.get_metadata(keys::COUNTER).unwrap();
        assert_eq!(metadata.parameters.len(), 1);
        assert_eq!(metadata.parameters[0].name, "count");
    }
}
