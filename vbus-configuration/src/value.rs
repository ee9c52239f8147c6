//! Configuration value definitions and per-session value states

use serde::{Deserialize, Serialize};

/// Decides whether a value is relevant given its prerequisite's value
///
/// `None` is passed while the prerequisite's value is unknown.
pub type Predicate = fn(Option<i32>) -> bool;

/// Link from a value to the value that decides its relevance
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Id of the prerequisite value
    pub value_id: String,
    pub predicate: Predicate,
}

/// Static definition of one configurable controller value
#[derive(Debug, Clone)]
pub struct ConfigurationValueDefinition {
    /// Stable key of the value
    pub value_id: String,
    /// Parameter index used on the bus
    pub value_index: i16,
    pub default_value: Option<i32>,
    pub dependency: Option<Dependency>,
}

impl ConfigurationValueDefinition {
    /// Create a definition without default value or dependency
    pub fn new(value_id: impl Into<String>, value_index: i16) -> Self {
        Self {
            value_id: value_id.into(),
            value_index,
            default_value: None,
            dependency: None,
        }
    }

    pub fn with_default(mut self, default_value: i32) -> Self {
        self.default_value = Some(default_value);
        self
    }

    /// Make this value relevant only when `predicate` accepts the value of
    /// `value_id`
    pub fn depends_on(mut self, value_id: impl Into<String>, predicate: Predicate) -> Self {
        self.dependency = Some(Dependency {
            value_id: value_id.into(),
            predicate,
        });
        self
    }
}

/// Exchange state of one value during a load or save session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationValueState {
    pub value_id: String,
    pub value: Option<i32>,
    /// Must still be transferred
    pub pending: bool,
    /// Has been transferred in this session
    pub transceived: bool,
}

impl ConfigurationValueState {
    /// Create the initial state for `definition`, holding `value`
    pub fn new(definition: &ConfigurationValueDefinition, value: Option<i32>) -> Self {
        Self {
            value_id: definition.value_id.clone(),
            value,
            pending: true,
            transceived: false,
        }
    }

    /// Record that the value was transferred with the device
    pub fn mark_transceived(&mut self, value: Option<i32>) {
        self.value = value;
        self.pending = false;
        self.transceived = true;
    }
}
