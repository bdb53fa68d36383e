//! Parameterized components
//!
//! A `Parameterized` wraps a factory that builds a concrete [`Component`]
//! from parameter values. Every parameter declares a default, so resolving
//! is a pure function of the values supplied: missing values fall back to
//! defaults and undeclared names are rejected.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::Component;
use crate::error::ComponentError;

/// Parameter values keyed by parameter name
pub type ParameterValues = serde_json::Map<String, Value>;

/// Declaration of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    /// Parameter name (key in `ParameterValues`)
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// What the parameter controls
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Value used when none is supplied
    pub default_value: Value,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, default_value: Value) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
            default_value,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

type FactoryFn = dyn Fn(&ParameterValues) -> Result<Component, ComponentError> + Send + Sync;

/// Factory producing concrete components from parameter values
#[derive(Clone)]
pub struct Parameterized {
    parameters: Vec<ParameterSpec>,
    factory: Arc<FactoryFn>,
}

impl Parameterized {
    /// Create a parameterized component from a raw factory
    ///
    /// The factory always receives a complete value map (defaults filled in).
    pub fn new(
        parameters: Vec<ParameterSpec>,
        factory: impl Fn(&ParameterValues) -> Result<Component, ComponentError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            parameters,
            factory: Arc::new(factory),
        }
    }

    /// Create a parameterized component whose values decode into `P`
    pub fn typed<P, F>(parameters: Vec<ParameterSpec>, factory: F) -> Self
    where
        P: DeserializeOwned,
        F: Fn(P) -> Result<Component, ComponentError> + Send + Sync + 'static,
    {
        Self::new(parameters, move |values| factory(decode(values)?))
    }

    /// A component without parameters; every `create` returns the same instance
    pub fn fixed(component: Component) -> Self {
        Self::new(Vec::new(), move |_| Ok(component.clone()))
    }

    /// Declared parameters
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Default value for every declared parameter
    pub fn default_values(&self) -> ParameterValues {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_value.clone()))
            .collect()
    }

    /// Merge supplied values over the defaults
    pub fn resolve_values(&self, values: &ParameterValues) -> Result<ParameterValues, ComponentError> {
        if let Some(unknown) = values
            .keys()
            .find(|name| !self.parameters.iter().any(|p| &p.name == *name))
        {
            return Err(ComponentError::UnknownParameter(unknown.clone()));
        }

        let mut resolved = self.default_values();
        for (name, value) in values {
            resolved.insert(name.clone(), value.clone());
        }
        Ok(resolved)
    }

    /// Build a concrete component
    pub fn create(&self, values: &ParameterValues) -> Result<Component, ComponentError> {
        let resolved = self.resolve_values(values)?;
        (self.factory)(&resolved)
    }
}

/// Decode parameter values into a typed struct
pub fn decode<P: DeserializeOwned>(values: &ParameterValues) -> Result<P, ComponentError> {
    serde_json::from_value(Value::Object(values.clone()))
        .map_err(|e| ComponentError::InvalidParameters(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::StaticProblem;
    use serde_json::json;

    #[derive(Deserialize)]
    struct CounterParams {
        count: i64,
    }

    fn counter_factory() -> Parameterized {
        Parameterized::typed(
            vec![ParameterSpec::new("count", "Count", json!(3))],
            |params: CounterParams| {
                Ok(Component::Problem(Arc::new(StaticProblem::new(
                    "counter",
                    json!({ "counter": params.count }),
                ))))
            },
        )
    }

    fn initial(component: &Component) -> Value {
        component.as_problem().unwrap().initial_state()
    }

    #[test]
    fn test_defaults_are_applied() {
        let component = counter_factory().create(&ParameterValues::new()).unwrap();
        assert_eq!(initial(&component), json!({"counter": 3}));
    }

    #[test]
    fn test_supplied_values_override_defaults() {
        let mut values = ParameterValues::new();
        values.insert("count".into(), json!(7));
        let component = counter_factory().create(&values).unwrap();
        assert_eq!(initial(&component), json!({"counter": 7}));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut values = ParameterValues::new();
        values.insert("size".into(), json!(1));
        assert_eq!(
            counter_factory().create(&values).unwrap_err(),
            ComponentError::UnknownParameter("size".into())
        );
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut values = ParameterValues::new();
        values.insert("count".into(), json!("three"));
        assert!(matches!(
            counter_factory().create(&values),
            Err(ComponentError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_resolution_is_pure() {
        let factory = counter_factory();
        let a = factory.create(&ParameterValues::new()).unwrap();
        let b = factory.create(&ParameterValues::new()).unwrap();
        assert_eq!(initial(&a), initial(&b));
    }

    #[test]
    fn test_fixed_has_no_parameters() {
        let fixed = Parameterized::fixed(Component::Problem(Arc::new(StaticProblem::new(
            "fixed",
            json!({}),
        ))));
        assert!(fixed.parameters().is_empty());
        assert!(fixed.create(&ParameterValues::new()).is_ok());
    }
}
