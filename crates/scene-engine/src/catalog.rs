//! Component catalog
//!
//! Maps component keys to metadata and parameterized factories. Hosts
//! resolve keys (plus parameter values) into concrete [`Component`]s; the
//! engine itself only ever sees resolved instances.
//!
//! # Registration
//!
//! Entries are registered explicitly, or collected at link time:
//!
//! ```ignore
//! inventory::submit!(scene_engine::CatalogFn(my_problem_entry));
//!
//! let catalog = ComponentCatalog::with_registered();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::{Adapter, Algorithm, Component, ComponentKind, Problem, Visualizer};
use crate::error::CatalogError;
use crate::parameters::{ParameterSpec, ParameterValues, Parameterized};

/// Descriptive metadata of a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    /// Unique key (e.g., "breadth-first-search")
    pub key: String,
    pub kind: ComponentKind,
    /// Human-readable label
    pub label: String,
    pub description: String,
    /// Declared parameters with defaults
    pub parameters: Vec<ParameterSpec>,
}

/// A catalog entry: metadata plus factory
#[derive(Clone)]
pub struct CatalogEntry {
    metadata: ComponentMetadata,
    factory: Parameterized,
}

impl CatalogEntry {
    pub fn new(
        key: impl Into<String>,
        kind: ComponentKind,
        label: impl Into<String>,
        description: impl Into<String>,
        factory: Parameterized,
    ) -> Self {
        Self {
            metadata: ComponentMetadata {
                key: key.into(),
                kind,
                label: label.into(),
                description: description.into(),
                parameters: factory.parameters().to_vec(),
            },
            factory,
        }
    }

    pub fn metadata(&self) -> &ComponentMetadata {
        &self.metadata
    }

    pub fn factory(&self) -> &Parameterized {
        &self.factory
    }
}

/// Link-time registration hook for catalog entries
pub struct CatalogFn(pub fn() -> CatalogEntry);

inventory::collect!(CatalogFn);

/// Reference to a catalog entry with parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parameters: ParameterValues,
}

impl ComponentRef {
    /// Reference with default parameter values
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parameters: ParameterValues::new(),
        }
    }

    /// Set one parameter value
    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}

/// Registry of components keyed by component key
#[derive(Clone, Default)]
pub struct ComponentCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl ComponentCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding every entry submitted via `inventory`
    pub fn with_registered() -> Self {
        let mut catalog = Self::new();
        for registration in inventory::iter::<CatalogFn> {
            catalog.register((registration.0)());
        }
        log::debug!("Catalog collected {} registered components", catalog.len());
        catalog
    }

    /// Register an entry, replacing any entry with the same key
    pub fn register(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.metadata.key.clone(), entry);
    }

    /// Get metadata for a key
    pub fn get_metadata(&self, key: &str) -> Option<&ComponentMetadata> {
        self.entries.get(key).map(|e| &e.metadata)
    }

    /// All metadata, sorted by key
    pub fn all_metadata(&self) -> Vec<&ComponentMetadata> {
        let mut all: Vec<_> = self.entries.values().map(|e| &e.metadata).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Metadata grouped by kind
    pub fn metadata_by_kind(&self) -> HashMap<ComponentKind, Vec<&ComponentMetadata>> {
        let mut grouped: HashMap<ComponentKind, Vec<&ComponentMetadata>> = HashMap::new();
        for metadata in self.all_metadata() {
            grouped.entry(metadata.kind).or_default().push(metadata);
        }
        grouped
    }

    pub fn has_component(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another catalog into this one
    ///
    /// Entries from `other` override entries in `self` sharing the same key.
    pub fn merge(&mut self, other: ComponentCatalog) {
        self.entries.extend(other.entries);
    }

    /// Create a component from a key and parameter values
    pub fn resolve(&self, key: &str, parameters: &ParameterValues) -> Result<Component, CatalogError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| CatalogError::UnknownComponent(key.to_string()))?;
        entry
            .factory
            .create(parameters)
            .map_err(|source| CatalogError::Creation {
                key: key.to_string(),
                source,
            })
    }

    /// Resolve a component reference
    pub fn resolve_ref(&self, reference: &ComponentRef) -> Result<Component, CatalogError> {
        self.resolve(&reference.key, &reference.parameters)
    }

    pub fn resolve_problem(&self, reference: &ComponentRef) -> Result<Arc<dyn Problem>, CatalogError> {
        match self.resolve_ref(reference)? {
            Component::Problem(p) => Ok(p),
            other => Err(kind_mismatch(reference, ComponentKind::Problem, &other)),
        }
    }

    pub fn resolve_algorithm(&self, reference: &ComponentRef) -> Result<Arc<dyn Algorithm>, CatalogError> {
        match self.resolve_ref(reference)? {
            Component::Algorithm(a) => Ok(a),
            other => Err(kind_mismatch(reference, ComponentKind::Algorithm, &other)),
        }
    }

    pub fn resolve_adapter(&self, reference: &ComponentRef) -> Result<Arc<dyn Adapter>, CatalogError> {
        match self.resolve_ref(reference)? {
            Component::Adapter(a) => Ok(a),
            other => Err(kind_mismatch(reference, ComponentKind::Adapter, &other)),
        }
    }

    pub fn resolve_visualizer(
        &self,
        reference: &ComponentRef,
    ) -> Result<Arc<dyn Visualizer>, CatalogError> {
        match self.resolve_ref(reference)? {
            Component::Visualizer(v) => Ok(v),
            other => Err(kind_mismatch(reference, ComponentKind::Visualizer, &other)),
        }
    }
}

fn kind_mismatch(reference: &ComponentRef, expected: ComponentKind, actual: &Component) -> CatalogError {
    CatalogError::KindMismatch {
        key: reference.key.clone(),
        expected,
        actual: actual.kind(),
    }
}
